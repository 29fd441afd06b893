//! String, character, and conversion instructions.
//!
//! All positions are code-point indices. An index outside `[0, length)`, a
//! character code that is not a valid Unicode scalar value, and an empty
//! `SETCHAR` replacement are string-operation errors; wrong operand types
//! remain type errors.

use super::{Flow, Vm};
use crate::{
    error::{InterpretError, RunResult},
    io::{InputSource, OutputSink},
    program::Instruction,
    tracer::VmTracer,
    value::Value,
};

/// The character with the given code, for `INT2CHAR`.
fn char_for_code(code: i64) -> RunResult<char> {
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| {
            InterpretError::string_operation(format!("invalid character code {code}"))
        })
}

/// The code point at a (possibly negative) index, for `STRI2INT` and
/// `GETCHAR`.
fn char_at(s: &str, index: i64) -> RunResult<char> {
    usize::try_from(index)
        .ok()
        .and_then(|i| s.chars().nth(i))
        .ok_or_else(|| {
            InterpretError::string_operation(format!("string index {index} is out of range"))
        })
}

fn code_point_count(s: &str) -> i64 {
    i64::try_from(s.chars().count()).unwrap_or(i64::MAX)
}

impl<O: OutputSink, I: InputSource, Tr: VmTracer> Vm<'_, O, I, Tr> {
    pub(super) fn exec_int2char(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let code = self.resolve_int(instruction.arg(1))?;
        let decoded = char_for_code(code)?;
        self.assign_to(instruction.arg(0), Value::Str(decoded.to_string()))
    }

    pub(super) fn exec_int2char_stack(&mut self) -> RunResult<Flow> {
        let code = self.pop_int()?;
        let decoded = char_for_code(code)?;
        self.operands.push(Value::Str(decoded.to_string()));
        Ok(Flow::Next)
    }

    pub(super) fn exec_stri2int(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let s = self.resolve_str(instruction.arg(1))?;
        let index = self.resolve_int(instruction.arg(2))?;
        let code = i64::from(u32::from(char_at(s, index)?));
        self.assign_to(instruction.arg(0), Value::Int(code))
    }

    pub(super) fn exec_stri2int_stack(&mut self) -> RunResult<Flow> {
        let index = self.pop_int()?;
        let s = self.pop_str()?;
        let code = i64::from(u32::from(char_at(&s, index)?));
        self.operands.push(Value::Int(code));
        Ok(Flow::Next)
    }

    pub(super) fn exec_concat(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let mut result = self.resolve_str(instruction.arg(1))?.to_owned();
        result.push_str(self.resolve_str(instruction.arg(2))?);
        self.assign_to(instruction.arg(0), Value::Str(result))
    }

    pub(super) fn exec_strlen(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let length = code_point_count(self.resolve_str(instruction.arg(1))?);
        self.assign_to(instruction.arg(0), Value::Int(length))
    }

    pub(super) fn exec_getchar(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let s = self.resolve_str(instruction.arg(1))?;
        let index = self.resolve_int(instruction.arg(2))?;
        let picked = char_at(s, index)?;
        self.assign_to(instruction.arg(0), Value::Str(picked.to_string()))
    }

    /// `SETCHAR` modifies the destination in place: it must already hold a
    /// string, and the code point at the index is replaced with the first
    /// code point of the replacement operand.
    pub(super) fn exec_setchar(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let dst = super::var_operand(instruction.arg(0))?;
        let current = self.frames.read(dst)?;
        if !current.is_set() {
            return Err(InterpretError::missing_value(format!(
                "variable {dst} is not defined"
            )));
        }
        let Value::Str(target) = current else {
            return Err(InterpretError::operand_type(format!(
                "SETCHAR target must be a string, got {}",
                current.type_name()
            )));
        };

        let index = self.resolve_int(instruction.arg(1))?;
        let replacement = self.resolve_str(instruction.arg(2))?;

        let position = usize::try_from(index)
            .ok()
            .filter(|i| *i < target.chars().count())
            .ok_or_else(|| {
                InterpretError::string_operation(format!(
                    "string index {index} is out of range"
                ))
            })?;
        let first = replacement.chars().next().ok_or_else(|| {
            InterpretError::string_operation("empty replacement string")
        })?;

        let updated: String = target
            .chars()
            .enumerate()
            .map(|(i, c)| if i == position { first } else { c })
            .collect();
        self.assign_to(instruction.arg(0), Value::Str(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn char_for_code_bounds() {
        assert_eq!(char_for_code(97).unwrap(), 'a');
        assert_eq!(char_for_code(0x1_F600).unwrap(), '\u{1F600}');
        assert_eq!(char_for_code(-1).unwrap_err().kind(), ErrorKind::StringOperation);
        assert_eq!(
            char_for_code(0x11_0000).unwrap_err().kind(),
            ErrorKind::StringOperation
        );
        // surrogate range is not a valid scalar value
        assert_eq!(
            char_for_code(0xD800).unwrap_err().kind(),
            ErrorKind::StringOperation
        );
    }

    #[test]
    fn char_at_counts_code_points() {
        assert_eq!(char_at("příliš", 2).unwrap(), 'í');
        assert_eq!(char_at("ab", -1).unwrap_err().kind(), ErrorKind::StringOperation);
        assert_eq!(char_at("ab", 2).unwrap_err().kind(), ErrorKind::StringOperation);
    }
}
