//! Control-transfer instructions.
//!
//! Every transfer resolves its label to the order it was bound to at load
//! time; the engine loop maps that order back to a position. The label is
//! resolved before any operands are compared, so a jump through an unknown
//! label fails even when the condition would not have taken it.

use super::{Flow, Vm, compare::values_equal};
use crate::{
    error::{InterpretError, RunResult},
    io::{InputSource, OutputSink},
    program::Instruction,
    tracer::VmTracer,
};

impl<O: OutputSink, I: InputSource, Tr: VmTracer> Vm<'_, O, I, Tr> {
    pub(super) fn exec_jump(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let name = super::label_operand(instruction.arg(0))?;
        let target = self.program.label_order(name)?;
        Ok(Flow::Jump(target))
    }

    pub(super) fn exec_jump_if_eq(
        &mut self,
        instruction: &Instruction,
        negate: bool,
    ) -> RunResult<Flow> {
        let name = super::label_operand(instruction.arg(0))?;
        let target = self.program.label_order(name)?;
        let lhs = self.resolve(instruction.arg(1))?;
        let rhs = self.resolve(instruction.arg(2))?;
        if values_equal(lhs, rhs)? != negate {
            Ok(Flow::Jump(target))
        } else {
            Ok(Flow::Next)
        }
    }

    pub(super) fn exec_jump_if_eq_stack(
        &mut self,
        instruction: &Instruction,
        negate: bool,
    ) -> RunResult<Flow> {
        let name = super::label_operand(instruction.arg(0))?;
        let target = self.program.label_order(name)?;
        let rhs = self.operands.pop()?;
        let lhs = self.operands.pop()?;
        if values_equal(&lhs, &rhs)? != negate {
            Ok(Flow::Jump(target))
        } else {
            Ok(Flow::Next)
        }
    }

    pub(super) fn exec_call(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let name = super::label_operand(instruction.arg(0))?;
        let target = self.program.label_order(name)?;
        self.calls.push(self.counter);
        Ok(Flow::Jump(target))
    }

    pub(super) fn exec_return(&mut self) -> RunResult<Flow> {
        let target = self.calls.pop()?;
        Ok(Flow::Jump(target))
    }

    pub(super) fn exec_exit(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let status = self.resolve_int(instruction.arg(0))?;
        let status = u8::try_from(status).ok().filter(|s| *s <= 49).ok_or_else(|| {
            InterpretError::operand_value(format!("invalid EXIT status {status}"))
        })?;
        Ok(Flow::Exit(status))
    }
}
