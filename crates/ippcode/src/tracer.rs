//! Execution tracing hooks.
//!
//! The engine is parameterized over a [`VmTracer`]; with the default
//! [`NoopTracer`] every hook monomorphizes to nothing, so tracing costs
//! nothing unless a caller opts in. [`StderrTracer`] logs each dispatched
//! instruction, which is handy when debugging a misbehaving program.

use crate::opcode::Opcode;

/// Hook points at key execution events.
pub trait VmTracer {
    /// Called before an instruction is dispatched.
    fn on_instruction(&mut self, order: i32, opcode: Opcode) {
        let _ = (order, opcode);
    }

    /// Called when a control transfer retargets the instruction counter.
    fn on_jump(&mut self, from_order: i32, to_order: i32) {
        let _ = (from_order, to_order);
    }
}

/// Zero-cost tracer; the production default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl VmTracer for NoopTracer {}

/// Tracer printing a human-readable execution log to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrTracer;

impl VmTracer for StderrTracer {
    fn on_instruction(&mut self, order: i32, opcode: Opcode) {
        eprintln!("[{order}] {opcode}");
    }

    fn on_jump(&mut self, from_order: i32, to_order: i32) {
        eprintln!("[{from_order}] -> {to_order}");
    }
}
