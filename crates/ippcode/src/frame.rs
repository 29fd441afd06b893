//! Variable frames and their registry.
//!
//! Variables live in frames: one global frame for the program's lifetime, an
//! optional temporary frame, and a stack of local frames of which only the
//! top is addressable. The registry owns all of them; the temporary-to-local
//! transition is a move, so there is never shared ownership of a frame.

use std::fmt;

use indexmap::IndexMap;

use crate::{
    error::{InterpretError, RunResult},
    value::Value,
};

/// The two-letter frame qualifier of a variable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// `GF` - the global frame.
    Global,
    /// `LF` - the top of the local-frame stack.
    Local,
    /// `TF` - the current temporary frame.
    Temporary,
}

impl FrameKind {
    /// Decodes a frame prefix. Anything but the three exact uppercase forms
    /// is rejected.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "GF" => Some(Self::Global),
            "LF" => Some(Self::Local),
            "TF" => Some(Self::Temporary),
            _ => None,
        }
    }

    /// The prefix as written in source, e.g. `GF`.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Global => "GF",
            Self::Local => "LF",
            Self::Temporary => "TF",
        }
    }
}

/// A parsed variable reference: frame qualifier plus short-name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    pub frame: FrameKind,
    pub name: String,
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.frame.prefix(), self.name)
    }
}

/// A single frame: an insertion-ordered mapping from variable short-name to
/// its slot. Insertion order is kept so `BREAK` dumps are deterministic.
#[derive(Debug, Default)]
pub struct Frame {
    vars: IndexMap<String, Value>,
}

impl Frame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` with an unset slot. Redeclaration in the same frame
    /// is a semantic error.
    pub fn declare(&mut self, var: &VarRef) -> RunResult<()> {
        if self.vars.contains_key(&var.name) {
            return Err(InterpretError::semantic(format!(
                "redefinition of variable {var}"
            )));
        }
        self.vars.insert(var.name.clone(), Value::Unset);
        Ok(())
    }

    /// Replaces the slot of a declared variable.
    pub fn assign(&mut self, var: &VarRef, value: Value) -> RunResult<()> {
        match self.vars.get_mut(&var.name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(InterpretError::undeclared(format!(
                "variable {var} is not declared"
            ))),
        }
    }

    /// Reads the slot of a declared variable. The caller decides whether an
    /// unset slot is acceptable.
    pub fn read(&self, var: &VarRef) -> RunResult<&Value> {
        self.vars.get(&var.name).ok_or_else(|| {
            InterpretError::undeclared(format!("variable {var} is not declared"))
        })
    }

    /// Iterates `(short-name, slot)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Owner of the global frame, the current temporary frame, and the stack of
/// local frames.
#[derive(Debug, Default)]
pub struct FrameRegistry {
    global: Frame,
    temporary: Option<Frame>,
    locals: Vec<Frame>,
}

impl FrameRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a frame qualifier to the frame it addresses. Addressing `LF`
    /// with an empty local stack or `TF` without a temporary frame is a
    /// frame error.
    pub fn frame(&self, kind: FrameKind) -> RunResult<&Frame> {
        match kind {
            FrameKind::Global => Ok(&self.global),
            FrameKind::Local => self
                .locals
                .last()
                .ok_or_else(|| InterpretError::frame_missing("local frame stack is empty")),
            FrameKind::Temporary => self
                .temporary
                .as_ref()
                .ok_or_else(|| InterpretError::frame_missing("temporary frame does not exist")),
        }
    }

    fn frame_mut(&mut self, kind: FrameKind) -> RunResult<&mut Frame> {
        match kind {
            FrameKind::Global => Ok(&mut self.global),
            FrameKind::Local => self
                .locals
                .last_mut()
                .ok_or_else(|| InterpretError::frame_missing("local frame stack is empty")),
            FrameKind::Temporary => self
                .temporary
                .as_mut()
                .ok_or_else(|| InterpretError::frame_missing("temporary frame does not exist")),
        }
    }

    /// Declares a new, unset variable in the frame its reference names.
    pub fn declare(&mut self, var: &VarRef) -> RunResult<()> {
        self.frame_mut(var.frame)?.declare(var)
    }

    /// Assigns a defined value to a declared variable.
    pub fn assign(&mut self, var: &VarRef, value: Value) -> RunResult<()> {
        debug_assert!(value.is_set(), "assignments always carry a defined value");
        self.frame_mut(var.frame)?.assign(var, value)
    }

    /// Reads a variable's slot, which may be unset.
    pub fn read(&self, var: &VarRef) -> RunResult<&Value> {
        self.frame(var.frame)?.read(var)
    }

    /// `CREATEFRAME`: replaces any current temporary frame with a fresh one.
    pub fn create_temp(&mut self) {
        self.temporary = Some(Frame::new());
    }

    /// `PUSHFRAME`: moves the temporary frame onto the local stack, leaving
    /// no temporary frame behind.
    pub fn push_temp_as_local(&mut self) -> RunResult<()> {
        match self.temporary.take() {
            Some(frame) => {
                self.locals.push(frame);
                Ok(())
            }
            None => Err(InterpretError::frame_missing(
                "temporary frame does not exist",
            )),
        }
    }

    /// `POPFRAME`: pops the top local frame and installs it as the temporary
    /// frame, discarding any previous one.
    pub fn pop_local_into_temp(&mut self) -> RunResult<()> {
        match self.locals.pop() {
            Some(frame) => {
                self.temporary = Some(frame);
                Ok(())
            }
            None => Err(InterpretError::frame_missing("local frame stack is empty")),
        }
    }

    /// The current temporary frame, if one exists. Used by `BREAK`.
    #[must_use]
    pub fn temporary(&self) -> Option<&Frame> {
        self.temporary.as_ref()
    }

    /// The local-frame stack, bottom first. Used by `BREAK`.
    #[must_use]
    pub fn locals(&self) -> &[Frame] {
        &self.locals
    }

    /// The global frame. Used by `BREAK`.
    #[must_use]
    pub fn global(&self) -> &Frame {
        &self.global
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn var(frame: FrameKind, name: &str) -> VarRef {
        VarRef {
            frame,
            name: name.to_owned(),
        }
    }

    #[test]
    fn declare_read_assign() {
        let mut frames = FrameRegistry::new();
        let x = var(FrameKind::Global, "x");
        frames.declare(&x).unwrap();
        assert_eq!(frames.read(&x).unwrap(), &Value::Unset);
        frames.assign(&x, Value::Int(1)).unwrap();
        assert_eq!(frames.read(&x).unwrap(), &Value::Int(1));
    }

    #[test]
    fn redeclaration_is_semantic_error() {
        let mut frames = FrameRegistry::new();
        let x = var(FrameKind::Global, "x");
        frames.declare(&x).unwrap();
        let err = frames.declare(&x).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Semantic);
    }

    #[test]
    fn undeclared_read_and_assign() {
        let mut frames = FrameRegistry::new();
        let x = var(FrameKind::Global, "x");
        assert_eq!(frames.read(&x).unwrap_err().kind(), ErrorKind::UndeclaredVariable);
        assert_eq!(
            frames.assign(&x, Value::Int(0)).unwrap_err().kind(),
            ErrorKind::UndeclaredVariable
        );
    }

    #[test]
    fn missing_frames() {
        let mut frames = FrameRegistry::new();
        let tf_x = var(FrameKind::Temporary, "x");
        let lf_x = var(FrameKind::Local, "x");
        assert_eq!(frames.read(&tf_x).unwrap_err().kind(), ErrorKind::FrameMissing);
        assert_eq!(frames.read(&lf_x).unwrap_err().kind(), ErrorKind::FrameMissing);
        assert_eq!(
            frames.push_temp_as_local().unwrap_err().kind(),
            ErrorKind::FrameMissing
        );
        assert_eq!(
            frames.pop_local_into_temp().unwrap_err().kind(),
            ErrorKind::FrameMissing
        );
    }

    #[test]
    fn temp_to_local_is_a_move() {
        let mut frames = FrameRegistry::new();
        frames.create_temp();
        frames.declare(&var(FrameKind::Temporary, "x")).unwrap();
        frames.push_temp_as_local().unwrap();

        // TF is gone, the same variable is now visible through LF.
        assert_eq!(
            frames.read(&var(FrameKind::Temporary, "x")).unwrap_err().kind(),
            ErrorKind::FrameMissing
        );
        assert_eq!(frames.read(&var(FrameKind::Local, "x")).unwrap(), &Value::Unset);

        frames.pop_local_into_temp().unwrap();
        assert_eq!(frames.read(&var(FrameKind::Temporary, "x")).unwrap(), &Value::Unset);
        assert_eq!(
            frames.read(&var(FrameKind::Local, "x")).unwrap_err().kind(),
            ErrorKind::FrameMissing
        );
    }

    #[test]
    fn createframe_discards_previous_temp() {
        let mut frames = FrameRegistry::new();
        frames.create_temp();
        frames.declare(&var(FrameKind::Temporary, "x")).unwrap();
        frames.create_temp();
        assert_eq!(
            frames.read(&var(FrameKind::Temporary, "x")).unwrap_err().kind(),
            ErrorKind::UndeclaredVariable
        );
    }
}
