//! Command-line driver for the IPPcode22 interpreter.
//!
//! Usage shape: `interpret [--source=PATH] [--input=PATH] [--help]`. At
//! least one of source/input must be given; the missing one is read from
//! standard input. Usage errors exit with 10, unopenable files with 11,
//! everything else with the interpreter's own error codes.

use std::{
    env, fs,
    io::{self, BufReader},
    process::ExitCode,
};

use ippcode::{Interpreter, Outcome, ReaderSource, RunResult, StdSink, StdinSource};

const USAGE_EXIT_CODE: u8 = 10;
const FILE_EXIT_CODE: u8 = 11;

const USAGE: &str = "\
interpret - an IPPcode22 interpreter

Usage:
    interpret [--source=FILE] [--input=FILE]
    interpret --help

Reads an IPPcode22 program in its XML representation from --source and the
program's input lines from --input. At least one of the two must be given;
the one left out is read from standard input.";

/// A validated invocation: which streams to read the program and its input
/// from. `None` means standard input.
struct Invocation {
    source: Option<String>,
    input: Option<String>,
}

enum CliAction {
    Help,
    Run(Invocation),
}

fn parse_args(args: &[String]) -> Result<CliAction, String> {
    let mut source = None;
    let mut input = None;
    let mut help = false;

    for arg in args {
        if arg == "--help" {
            if help {
                return Err("--help given more than once".to_owned());
            }
            help = true;
        } else if let Some(path) = arg.strip_prefix("--source=") {
            if source.is_some() {
                return Err("--source given more than once".to_owned());
            }
            source = Some(path.to_owned());
        } else if let Some(path) = arg.strip_prefix("--input=") {
            if input.is_some() {
                return Err("--input given more than once".to_owned());
            }
            input = Some(path.to_owned());
        } else {
            return Err(format!("unknown argument {arg}"));
        }
    }

    if help {
        if source.is_some() || input.is_some() {
            return Err("--help cannot be combined with other arguments".to_owned());
        }
        return Ok(CliAction::Help);
    }

    if source.is_none() && input.is_none() {
        return Err("at least one of --source and --input must be given".to_owned());
    }
    if source.is_some() && source == input {
        return Err("--source and --input cannot name the same file".to_owned());
    }

    Ok(CliAction::Run(Invocation { source, input }))
}

fn read_file(path: &str) -> Result<String, String> {
    match fs::metadata(path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("{path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("cannot open {path}: {err}"));
        }
    }
    fs::read_to_string(path).map_err(|err| format!("cannot read {path}: {err}"))
}

fn run_program(interpreter: &Interpreter, input: Option<&str>) -> Result<RunResult<Outcome>, String> {
    let mut sink = StdSink::new();
    match input {
        Some(path) => {
            let file = fs::File::open(path).map_err(|err| format!("cannot open {path}: {err}"))?;
            let mut input = ReaderSource::new(BufReader::new(file));
            Ok(interpreter.run(&mut sink, &mut input))
        }
        None => {
            let mut input = StdinSource::new();
            Ok(interpreter.run(&mut sink, &mut input))
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let invocation = match parse_args(&args) {
        Ok(CliAction::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Ok(CliAction::Run(invocation)) => invocation,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(USAGE_EXIT_CODE);
        }
    };

    let source = match &invocation.source {
        Some(path) => match read_file(path) {
            Ok(source) => source,
            Err(message) => {
                eprintln!("{message}");
                return ExitCode::from(FILE_EXIT_CODE);
            }
        },
        None => match io::read_to_string(io::stdin()) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("cannot read standard input: {err}");
                return ExitCode::from(FILE_EXIT_CODE);
            }
        },
    };

    let interpreter = match Interpreter::new(&source) {
        Ok(interpreter) => interpreter,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };

    match run_program(&interpreter, invocation.input.as_deref()) {
        Ok(Ok(outcome)) => ExitCode::from(outcome.status()),
        Ok(Err(err)) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(FILE_EXIT_CODE)
        }
    }
}
