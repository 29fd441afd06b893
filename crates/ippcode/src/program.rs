//! Decoded instructions and the loaded program.
//!
//! The loader produces [`Instruction`] values; [`Program`] owns them sorted
//! by their declared order together with the two side tables the engine
//! needs: order → position, and label → order.

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::{
    error::{InterpretError, RunResult},
    frame::VarRef,
    opcode::Opcode,
    value::{DataType, Value},
};

/// One decoded operand, parsed and validated at load time.
///
/// String literals are already escape-decoded; boolean literals are already
/// normalized. Variable references keep their frame qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// A variable reference.
    Var(VarRef),
    /// A label name.
    Label(String),
    /// A type name, as used by `READ`.
    Type(DataType),
    /// An int/string/bool/nil literal, carried as its runtime value.
    Literal(Value),
}

/// A decoded instruction: opcode, declared order, and 0-3 operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    /// The positive integer key defining program order and jump targets.
    pub order: i32,
    pub args: SmallVec<[Arg; 3]>,
}

impl Instruction {
    /// The operand at `index`. Arity was validated at load time, so a
    /// missing operand is a programming error, not an input error.
    #[must_use]
    pub fn arg(&self, index: usize) -> &Arg {
        &self.args[index]
    }
}

/// A loaded program: instructions sorted by order, plus label and position
/// tables.
#[derive(Debug)]
pub struct Program {
    /// Instructions in ascending order of their `order` key.
    instructions: Vec<Instruction>,
    /// Maps each declared order to its index in `instructions`.
    position_of: AHashMap<i32, usize>,
    /// Maps each label name to the order of its `LABEL` instruction.
    labels: AHashMap<String, i32>,
}

impl Program {
    /// Builds the program table from decoded instructions: sorts by order,
    /// indexes positions, and registers labels.
    ///
    /// Duplicate orders are a structural error; duplicate labels are a
    /// semantic error.
    pub(crate) fn from_instructions(mut instructions: Vec<Instruction>) -> RunResult<Self> {
        instructions.sort_by_key(|instruction| instruction.order);

        let mut position_of = AHashMap::with_capacity(instructions.len());
        let mut labels = AHashMap::new();
        for (position, instruction) in instructions.iter().enumerate() {
            if position_of.insert(instruction.order, position).is_some() {
                return Err(InterpretError::structure(format!(
                    "duplicate instruction order {}",
                    instruction.order
                )));
            }
            if instruction.opcode == Opcode::Label {
                let Arg::Label(name) = instruction.arg(0) else {
                    return Err(InterpretError::structure("LABEL without a label operand"));
                };
                if labels.insert(name.clone(), instruction.order).is_some() {
                    return Err(InterpretError::semantic(format!(
                        "label {name} is already defined"
                    )));
                }
            }
        }

        Ok(Self {
            instructions,
            position_of,
            labels,
        })
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The instruction at a sorted position.
    #[must_use]
    pub fn get(&self, position: usize) -> &Instruction {
        &self.instructions[position]
    }

    /// The sorted position of a declared order, if that order exists.
    #[must_use]
    pub fn position_of_order(&self, order: i32) -> Option<usize> {
        self.position_of.get(&order).copied()
    }

    /// The order a label is bound to. An unknown label is a semantic error.
    pub fn label_order(&self, name: &str) -> RunResult<i32> {
        self.labels.get(name).copied().ok_or_else(|| {
            InterpretError::semantic(format!("label {name} is not defined"))
        })
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;
    use crate::error::ErrorKind;

    fn label_instruction(order: i32, name: &str) -> Instruction {
        Instruction {
            opcode: Opcode::Label,
            order,
            args: smallvec![Arg::Label(name.to_owned())],
        }
    }

    fn bare(opcode: Opcode, order: i32) -> Instruction {
        Instruction {
            opcode,
            order,
            args: SmallVec::new(),
        }
    }

    #[test]
    fn sorts_by_order_and_indexes_positions() {
        let program = Program::from_instructions(vec![
            bare(Opcode::Break, 30),
            bare(Opcode::CreateFrame, 10),
            bare(Opcode::PushFrame, 20),
        ])
        .unwrap();

        assert_eq!(program.get(0).order, 10);
        assert_eq!(program.get(1).order, 20);
        assert_eq!(program.get(2).order, 30);
        assert_eq!(program.position_of_order(20), Some(1));
        assert_eq!(program.position_of_order(15), None);
    }

    #[test]
    fn duplicate_order_is_structural() {
        let err = Program::from_instructions(vec![
            bare(Opcode::Break, 1),
            bare(Opcode::CreateFrame, 1),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::XmlStructure);
    }

    #[test]
    fn labels_are_registered_and_unique() {
        let program =
            Program::from_instructions(vec![label_instruction(5, "main")]).unwrap();
        assert_eq!(program.label_order("main").unwrap(), 5);
        assert_eq!(
            program.label_order("missing").unwrap_err().kind(),
            ErrorKind::Semantic
        );

        let err = Program::from_instructions(vec![
            label_instruction(1, "twice"),
            label_instruction(2, "twice"),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Semantic);
    }
}
