//! Relational instructions, register and stack forms.
//!
//! `LT`/`GT` order two operands of the same type (int, bool, or string;
//! strings lexicographically by code points; false < true) and reject nil.
//! `EQ` additionally accepts nil against anything: the operands are equal
//! iff both are nil. The jump-if instructions in `flow` share the equality
//! helper.

use std::cmp::Ordering;

use super::{Flow, Vm};
use crate::{
    error::{InterpretError, RunResult},
    io::{InputSource, OutputSink},
    program::Instruction,
    tracer::VmTracer,
    value::Value,
};

/// Which ordering a comparison instruction tests for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Comparison {
    Lt,
    Gt,
}

impl Comparison {
    fn matches(self, ordering: Ordering) -> bool {
        match self {
            Self::Lt => ordering == Ordering::Less,
            Self::Gt => ordering == Ordering::Greater,
        }
    }
}

/// Orders two operands of identical type. Nil and mixed-type pairs are
/// type errors.
fn compare_order(lhs: &Value, rhs: &Value, comparison: Comparison) -> RunResult<bool> {
    let ordering = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => {
            return Err(InterpretError::operand_type(format!(
                "cannot order {} and {}",
                lhs.type_name(),
                rhs.type_name()
            )));
        }
    };
    Ok(comparison.matches(ordering))
}

/// Equality of two operands. Nil compares against anything (equal iff both
/// nil); any other mixed-type pair is a type error.
pub(super) fn values_equal(lhs: &Value, rhs: &Value) -> RunResult<bool> {
    match (lhs, rhs) {
        (Value::Nil, Value::Nil) => Ok(true),
        (Value::Nil, _) | (_, Value::Nil) => Ok(false),
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        _ => Err(InterpretError::operand_type(format!(
            "cannot compare {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

impl<O: OutputSink, I: InputSource, Tr: VmTracer> Vm<'_, O, I, Tr> {
    pub(super) fn exec_compare(
        &mut self,
        instruction: &Instruction,
        comparison: Comparison,
    ) -> RunResult<Flow> {
        let lhs = self.resolve(instruction.arg(1))?;
        let rhs = self.resolve(instruction.arg(2))?;
        let result = compare_order(lhs, rhs, comparison)?;
        self.assign_to(instruction.arg(0), Value::Bool(result))
    }

    pub(super) fn exec_compare_stack(&mut self, comparison: Comparison) -> RunResult<Flow> {
        let rhs = self.operands.pop()?;
        let lhs = self.operands.pop()?;
        let result = compare_order(&lhs, &rhs, comparison)?;
        self.operands.push(Value::Bool(result));
        Ok(Flow::Next)
    }

    pub(super) fn exec_eq(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let lhs = self.resolve(instruction.arg(1))?;
        let rhs = self.resolve(instruction.arg(2))?;
        let result = values_equal(lhs, rhs)?;
        self.assign_to(instruction.arg(0), Value::Bool(result))
    }

    pub(super) fn exec_eq_stack(&mut self) -> RunResult<Flow> {
        let rhs = self.operands.pop()?;
        let lhs = self.operands.pop()?;
        let result = values_equal(&lhs, &rhs)?;
        self.operands.push(Value::Bool(result));
        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn s(text: &str) -> Value {
        Value::Str(text.to_owned())
    }

    #[test]
    fn orders_ints_bools_strings() {
        assert!(compare_order(&Value::Int(1), &Value::Int(2), Comparison::Lt).unwrap());
        assert!(compare_order(&Value::Bool(false), &Value::Bool(true), Comparison::Lt).unwrap());
        assert!(compare_order(&s("abc"), &s("abd"), Comparison::Lt).unwrap());
        assert!(!compare_order(&s("b"), &s("ab"), Comparison::Lt).unwrap());
        assert!(compare_order(&Value::Int(3), &Value::Int(2), Comparison::Gt).unwrap());
    }

    #[test]
    fn ordering_rejects_nil_and_mixed_types() {
        assert_eq!(
            compare_order(&Value::Nil, &Value::Nil, Comparison::Lt)
                .unwrap_err()
                .kind(),
            ErrorKind::OperandType
        );
        assert_eq!(
            compare_order(&Value::Int(1), &s("1"), Comparison::Gt)
                .unwrap_err()
                .kind(),
            ErrorKind::OperandType
        );
    }

    #[test]
    fn equality_accepts_nil_against_anything() {
        assert!(values_equal(&Value::Nil, &Value::Nil).unwrap());
        assert!(!values_equal(&Value::Nil, &Value::Int(0)).unwrap());
        assert!(!values_equal(&s(""), &Value::Nil).unwrap());
        assert!(values_equal(&Value::Int(5), &Value::Int(5)).unwrap());
        assert_eq!(
            values_equal(&Value::Int(1), &Value::Bool(true)).unwrap_err().kind(),
            ErrorKind::OperandType
        );
    }
}
