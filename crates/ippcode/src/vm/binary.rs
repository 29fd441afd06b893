//! Arithmetic and boolean instructions, register and stack forms.
//!
//! Arithmetic is `Int x Int -> Int` with wrapping two's-complement
//! semantics; division is floored (the quotient rounds toward negative
//! infinity) and the only value error is division by zero. Stack forms pop
//! the right-hand operand first.

use super::{Flow, Vm};
use crate::{
    error::{InterpretError, RunResult},
    io::{InputSource, OutputSink},
    program::Instruction,
    tracer::VmTracer,
    value::Value,
};

/// One of the four integer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ArithOp {
    Add,
    Sub,
    Mul,
    Idiv,
}

impl ArithOp {
    fn apply(self, lhs: i64, rhs: i64) -> RunResult<i64> {
        match self {
            Self::Add => Ok(lhs.wrapping_add(rhs)),
            Self::Sub => Ok(lhs.wrapping_sub(rhs)),
            Self::Mul => Ok(lhs.wrapping_mul(rhs)),
            Self::Idiv => {
                if rhs == 0 {
                    return Err(InterpretError::operand_value("division by zero"));
                }
                // floored division: the quotient rounds toward negative
                // infinity, so -7 IDIV 2 is -4
                let quotient = lhs.wrapping_div(rhs);
                let remainder = lhs.wrapping_rem(rhs);
                if remainder != 0 && (remainder < 0) != (rhs < 0) {
                    Ok(quotient - 1)
                } else {
                    Ok(quotient)
                }
            }
        }
    }
}

/// One of the two binary boolean operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    fn apply(self, lhs: bool, rhs: bool) -> bool {
        match self {
            Self::And => lhs && rhs,
            Self::Or => lhs || rhs,
        }
    }
}

impl<O: OutputSink, I: InputSource, Tr: VmTracer> Vm<'_, O, I, Tr> {
    pub(super) fn exec_arith(&mut self, instruction: &Instruction, op: ArithOp) -> RunResult<Flow> {
        let lhs = self.resolve_int(instruction.arg(1))?;
        let rhs = self.resolve_int(instruction.arg(2))?;
        let result = op.apply(lhs, rhs)?;
        self.assign_to(instruction.arg(0), Value::Int(result))
    }

    pub(super) fn exec_arith_stack(&mut self, op: ArithOp) -> RunResult<Flow> {
        let rhs = self.pop_int()?;
        let lhs = self.pop_int()?;
        self.operands.push(Value::Int(op.apply(lhs, rhs)?));
        Ok(Flow::Next)
    }

    pub(super) fn exec_bool(&mut self, instruction: &Instruction, op: BoolOp) -> RunResult<Flow> {
        let lhs = self.resolve_bool(instruction.arg(1))?;
        let rhs = self.resolve_bool(instruction.arg(2))?;
        self.assign_to(instruction.arg(0), Value::Bool(op.apply(lhs, rhs)))
    }

    pub(super) fn exec_bool_stack(&mut self, op: BoolOp) -> RunResult<Flow> {
        let rhs = self.pop_bool()?;
        let lhs = self.pop_bool()?;
        self.operands.push(Value::Bool(op.apply(lhs, rhs)));
        Ok(Flow::Next)
    }

    pub(super) fn exec_not(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let operand = self.resolve_bool(instruction.arg(1))?;
        self.assign_to(instruction.arg(0), Value::Bool(!operand))
    }

    pub(super) fn exec_not_stack(&mut self) -> RunResult<Flow> {
        let operand = self.pop_bool()?;
        self.operands.push(Value::Bool(!operand));
        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn idiv_floors_toward_negative_infinity() {
        assert_eq!(ArithOp::Idiv.apply(7, 2).unwrap(), 3);
        assert_eq!(ArithOp::Idiv.apply(-7, 2).unwrap(), -4);
        assert_eq!(ArithOp::Idiv.apply(7, -2).unwrap(), -4);
        assert_eq!(ArithOp::Idiv.apply(-7, -2).unwrap(), 3);
        // exact quotients need no adjustment
        assert_eq!(ArithOp::Idiv.apply(-6, 2).unwrap(), -3);
        assert_eq!(ArithOp::Idiv.apply(6, -2).unwrap(), -3);
    }

    #[test]
    fn idiv_by_zero() {
        assert_eq!(
            ArithOp::Idiv.apply(1, 0).unwrap_err().kind(),
            ErrorKind::OperandValue
        );
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(ArithOp::Add.apply(i64::MAX, 1).unwrap(), i64::MIN);
        assert_eq!(ArithOp::Idiv.apply(i64::MIN, -1).unwrap(), i64::MIN);
    }
}
