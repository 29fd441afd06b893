//! Failure taxonomy for loading and executing IPPcode22 programs.
//!
//! Every failure the interpreter can produce maps one-to-one onto a process
//! exit code. There is no recovery: the first error aborts the run and the
//! caller (normally the CLI) turns it into the process outcome.

use std::fmt;

use strum::IntoStaticStr;

/// Result type alias for operations that can produce an interpreter error.
pub type RunResult<T> = Result<T, InterpretError>;

/// Closed set of failure kinds, one per diagnostic exit code.
///
/// The two `Xml*` kinds are raised by the loader, the rest by the engine.
/// Variable redefinition and label problems share a kind (and exit code)
/// because both are semantic errors in a referenced identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum ErrorKind {
    /// The source document is not well-formed XML.
    XmlMalformed,
    /// Well-formed XML with an unexpected shape: wrong element or attribute,
    /// bad arity, invalid type tag, or a bad/duplicate order.
    XmlStructure,
    /// Semantic error in a referenced identifier: undefined or duplicated
    /// label, redefinition of a variable.
    Semantic,
    /// An operand's runtime type does not match the operation's contract.
    OperandType,
    /// Access to a variable that was never declared in its frame.
    UndeclaredVariable,
    /// The addressed frame does not exist: no temporary frame, or an empty
    /// local-frame stack.
    FrameMissing,
    /// A value was needed but none exists: declared-but-unset variable, or
    /// an empty operand/call stack.
    MissingValue,
    /// An operand has the right type but a forbidden value: division by
    /// zero, `EXIT` status out of range.
    OperandValue,
    /// Invalid string operation: index out of range, bad character value.
    StringOperation,
}

impl ErrorKind {
    /// The process exit code assigned to this kind of failure.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::XmlMalformed => 31,
            Self::XmlStructure => 32,
            Self::Semantic => 52,
            Self::OperandType => 53,
            Self::UndeclaredVariable => 54,
            Self::FrameMissing => 55,
            Self::MissingValue => 56,
            Self::OperandValue => 57,
            Self::StringOperation => 58,
        }
    }
}

/// An interpreter failure: a kind fixing the exit code, plus a one-line
/// diagnostic for stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretError {
    kind: ErrorKind,
    message: String,
}

impl InterpretError {
    /// Creates an error of the given kind with a preformatted message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The failure kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The process exit code this failure maps to.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    /// The diagnostic message, without a trailing newline.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn malformed_xml(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::XmlMalformed, message)
    }

    pub(crate) fn structure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::XmlStructure, message)
    }

    pub(crate) fn semantic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Semantic, message)
    }

    pub(crate) fn operand_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OperandType, message)
    }

    pub(crate) fn undeclared(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndeclaredVariable, message)
    }

    pub(crate) fn frame_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FrameMissing, message)
    }

    pub(crate) fn missing_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingValue, message)
    }

    pub(crate) fn operand_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OperandValue, message)
    }

    pub(crate) fn string_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StringOperation, message)
    }
}

impl fmt::Display for InterpretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for InterpretError {}
