//! Public interface for running IPPcode22 programs.

use std::io::BufRead;

use crate::{
    error::RunResult,
    io::{CollectSink, InputSource, LinesSource, OutputSink},
    parse::parse_program,
    program::Program,
    tracer::{NoopTracer, VmTracer},
    vm::Vm,
};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Execution ran past the last instruction.
    Completed,
    /// An `EXIT` instruction terminated the program with this status.
    Exit(u8),
}

impl Outcome {
    /// The process exit status of this outcome.
    #[must_use]
    pub fn status(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Exit(status) => status,
        }
    }
}

/// Everything a hermetic run produces.
#[derive(Debug)]
pub struct RunOutput {
    pub outcome: Outcome,
    /// What the program wrote with `WRITE`.
    pub stdout: String,
    /// Diagnostics from `DPRINT`/`BREAK`.
    pub stderr: String,
}

/// Primary interface for loading and running a program.
///
/// An `Interpreter` is the loaded, validated program; each `run_*` call
/// executes it from scratch against fresh engine state, so one instance can
/// be run any number of times.
///
/// # Example
/// ```
/// use ippcode::Interpreter;
///
/// let source = r#"<program language="IPPcode22">
///   <instruction order="1" opcode="WRITE"><arg1 type="string">hi</arg1></instruction>
/// </program>"#;
/// let interpreter = Interpreter::new(source).unwrap();
/// let output = interpreter.run_collect(&[]).unwrap();
/// assert_eq!(output.stdout, "hi");
/// assert_eq!(output.outcome.status(), 0);
/// ```
#[derive(Debug)]
pub struct Interpreter {
    program: Program,
}

impl Interpreter {
    /// Loads a program from XML source text.
    pub fn new(source: &str) -> RunResult<Self> {
        Self::from_reader(source.as_bytes())
    }

    /// Loads a program from any buffered reader of XML source.
    pub fn from_reader<R: BufRead>(source: R) -> RunResult<Self> {
        Ok(Self {
            program: parse_program(source)?,
        })
    }

    /// The loaded program table.
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Runs against caller-supplied streams.
    pub fn run<O: OutputSink, I: InputSource>(
        &self,
        output: &mut O,
        input: &mut I,
    ) -> RunResult<Outcome> {
        self.run_with_tracer(output, input, NoopTracer)
    }

    /// Runs with an explicit tracer, for execution logging.
    pub fn run_with_tracer<O: OutputSink, I: InputSource, Tr: VmTracer>(
        &self,
        output: &mut O,
        input: &mut I,
        tracer: Tr,
    ) -> RunResult<Outcome> {
        Vm::new(&self.program, output, input, tracer).run()
    }

    /// Hermetic run: input lines come from a fixed sequence, both output
    /// streams are collected. Mainly for tests and embedding.
    pub fn run_collect(&self, input_lines: &[&str]) -> RunResult<RunOutput> {
        let mut sink = CollectSink::new();
        let mut input = LinesSource::new(input_lines.iter().copied());
        let outcome = self.run(&mut sink, &mut input)?;
        let (stdout, stderr) = sink.into_output();
        Ok(RunOutput {
            outcome,
            stdout,
            stderr,
        })
    }
}
