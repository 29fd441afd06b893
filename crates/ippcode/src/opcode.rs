//! The IPPcode22 instruction set.
//!
//! One enum variant per opcode, plus the fixed operand signature the loader
//! validates against. There is no per-opcode type hierarchy; the engine
//! dispatches on this enum with a single match.

use strum::{Display, EnumString, IntoStaticStr};

/// What an operand position accepts in source form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// A variable reference (`type="var"`).
    Var,
    /// A symbol: a variable reference or an int/string/bool/nil literal.
    Symb,
    /// A label name (`type="label"`).
    Label,
    /// A type name (`type="type"`): one of `int`, `string`, `bool`.
    Type,
}

/// All IPPcode22 opcodes. The serialized form is the uppercase source
/// spelling; the loader uppercases opcodes before lookup, so source
/// spelling is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Opcode {
    // Frames and variables
    Move,
    CreateFrame,
    PushFrame,
    PopFrame,
    DefVar,
    Call,
    Return,

    // Operand stack
    Pushs,
    Pops,
    Clears,

    // Arithmetic, relational, boolean
    Add,
    Sub,
    Mul,
    Idiv,
    Lt,
    Gt,
    Eq,
    And,
    Or,
    Not,
    Adds,
    Subs,
    Muls,
    Idivs,
    Lts,
    Gts,
    Eqs,
    Ands,
    Ors,
    Nots,

    // Conversions
    Int2Char,
    Stri2Int,
    Int2Chars,
    Stri2Ints,

    // Input/output
    Read,
    Write,

    // Strings
    Concat,
    Strlen,
    GetChar,
    SetChar,

    // Types
    Type,

    // Control flow
    Label,
    Jump,
    JumpIfEq,
    JumpIfNeq,
    JumpIfEqs,
    JumpIfNeqs,
    Exit,

    // Diagnostics
    Dprint,
    Break,
}

impl Opcode {
    /// The fixed operand signature of this opcode. Arity is the signature's
    /// length; the loader checks both the count and the kind of every
    /// `argN` element against it.
    #[must_use]
    pub fn signature(self) -> &'static [OperandKind] {
        use OperandKind::{Label, Symb, Type, Var};
        match self {
            Self::CreateFrame
            | Self::PushFrame
            | Self::PopFrame
            | Self::Return
            | Self::Clears
            | Self::Adds
            | Self::Subs
            | Self::Muls
            | Self::Idivs
            | Self::Lts
            | Self::Gts
            | Self::Eqs
            | Self::Ands
            | Self::Ors
            | Self::Nots
            | Self::Int2Chars
            | Self::Stri2Ints
            | Self::Break => &[],

            Self::DefVar | Self::Pops => &[Var],
            Self::Call | Self::Label | Self::Jump | Self::JumpIfEqs | Self::JumpIfNeqs => &[Label],
            Self::Pushs | Self::Write | Self::Exit | Self::Dprint => &[Symb],

            Self::Move | Self::Int2Char | Self::Strlen | Self::Type | Self::Not => &[Var, Symb],
            Self::Read => &[Var, Type],

            Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Idiv
            | Self::Lt
            | Self::Gt
            | Self::Eq
            | Self::And
            | Self::Or
            | Self::Stri2Int
            | Self::Concat
            | Self::GetChar
            | Self::SetChar => &[Var, Symb, Symb],

            Self::JumpIfEq | Self::JumpIfNeq => &[Label, Symb, Symb],
        }
    }

    /// Number of operands this opcode takes.
    #[must_use]
    pub fn arity(self) -> usize {
        self.signature().len()
    }
}
