//! An interpreter for the IPPcode22 intermediate language.
//!
//! Programs arrive as XML documents; [`Interpreter::new`] loads and
//! validates the whole program, and each `run_*` call executes it against
//! fresh frame, operand-stack, and call-stack state. Failures are reported
//! as [`InterpretError`] values whose [`ErrorKind`] fixes the conventional
//! process exit code; converting them into a process outcome is the CLI's
//! job, not the library's.

mod error;
mod frame;
mod io;
mod opcode;
mod parse;
mod program;
mod run;
mod stack;
mod tracer;
mod value;
mod vm;

pub use crate::{
    error::{ErrorKind, InterpretError, RunResult},
    frame::{Frame, FrameKind, FrameRegistry, VarRef},
    io::{CollectSink, InputSource, LinesSource, OutputSink, ReaderSource, StdSink, StdinSource},
    opcode::{Opcode, OperandKind},
    parse::parse_program,
    program::{Arg, Instruction, Program},
    run::{Interpreter, Outcome, RunOutput},
    tracer::{NoopTracer, StderrTracer, VmTracer},
    value::{DataType, Value},
};
