//! Diagnostic instructions.
//!
//! `DPRINT` and `BREAK` write to stderr only and never mutate program
//! state.

use std::fmt::Write as _;

use super::{Flow, Vm};
use crate::{
    error::RunResult,
    frame::Frame,
    io::{InputSource, OutputSink},
    program::Instruction,
    tracer::VmTracer,
    value::Value,
};

impl<O: OutputSink, I: InputSource, Tr: VmTracer> Vm<'_, O, I, Tr> {
    pub(super) fn exec_dprint(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let value = self.resolve(instruction.arg(0))?;
        let text = format!("{value} ({})\n", value.type_name());
        self.output.stderr_write(&text);
        Ok(Flow::Next)
    }

    /// Dumps the instruction counter, stack sizes, and the contents of all
    /// frames to stderr.
    pub(super) fn exec_break(&mut self) -> RunResult<Flow> {
        let mut dump = String::new();
        let _ = writeln!(dump, "BREAK at order {}", self.counter);
        let _ = writeln!(
            dump,
            "operand stack size: {}, call stack depth: {}",
            self.operands.len(),
            self.calls.depth()
        );

        let _ = writeln!(dump, "GF:");
        dump_frame(&mut dump, self.frames.global());

        match self.frames.temporary() {
            Some(frame) => {
                let _ = writeln!(dump, "TF:");
                dump_frame(&mut dump, frame);
            }
            None => {
                let _ = writeln!(dump, "TF: none");
            }
        }

        let locals = self.frames.locals();
        if locals.is_empty() {
            let _ = writeln!(dump, "LF stack: empty");
        } else {
            let _ = writeln!(dump, "LF stack ({} frames, top first):", locals.len());
            for frame in locals.iter().rev() {
                dump_frame(&mut dump, frame);
            }
        }

        self.output.stderr_write(&dump);
        Ok(Flow::Next)
    }
}

fn dump_frame(dump: &mut String, frame: &Frame) {
    if frame.is_empty() {
        let _ = writeln!(dump, "  (empty)");
        return;
    }
    for (name, value) in frame.iter() {
        if let Value::Unset = value {
            let _ = writeln!(dump, "  {name} = (uninitialized)");
        } else {
            let _ = writeln!(dump, "  {name} = {value} ({})", value.type_name());
        }
    }
}
