//! The execution engine.
//!
//! [`Vm`] owns every piece of runtime state: the frame registry, the operand
//! and call stacks, and the instruction counter. Handlers are methods split
//! across the submodules by instruction group; dispatch is a single match on
//! the opcode, there is no per-opcode type hierarchy and no dynamic dispatch.
//!
//! Control transfers work on declared orders, not positions: a handler
//! returns [`Flow::Jump`] carrying the target order, and the loop resumes at
//! the position *after* that order. Targets are always a `LABEL` (a no-op)
//! or the order of the `CALL` being returned from, so skipping the target
//! itself is exactly the intended semantics.

mod binary;
mod compare;
mod diag;
mod flow;
mod strings;

use binary::{ArithOp, BoolOp};
use compare::Comparison;

use crate::{
    error::{InterpretError, RunResult},
    frame::{FrameRegistry, VarRef},
    io::{InputSource, OutputSink},
    opcode::Opcode,
    program::{Arg, Instruction, Program},
    run::Outcome,
    stack::{CallStack, OperandStack},
    tracer::VmTracer,
    value::{DataType, Value},
};

/// What the engine loop does after a handler finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Advance to the next position.
    Next,
    /// Transfer control: resume after the instruction with this order.
    Jump(i32),
    /// Terminate the program with this status.
    Exit(u8),
}

/// The interpreter engine for one program run.
pub(crate) struct Vm<'a, O: OutputSink, I: InputSource, Tr: VmTracer> {
    program: &'a Program,
    frames: FrameRegistry,
    operands: OperandStack,
    calls: CallStack,
    /// Order of the instruction currently executing.
    counter: i32,
    output: &'a mut O,
    input: &'a mut I,
    tracer: Tr,
}

impl<'a, O: OutputSink, I: InputSource, Tr: VmTracer> Vm<'a, O, I, Tr> {
    pub fn new(program: &'a Program, output: &'a mut O, input: &'a mut I, tracer: Tr) -> Self {
        Self {
            program,
            frames: FrameRegistry::new(),
            operands: OperandStack::new(),
            calls: CallStack::new(),
            counter: 0,
            output,
            input,
            tracer,
        }
    }

    /// Runs the program to termination: until an `EXIT` executes or the
    /// position runs past the last instruction.
    pub fn run(mut self) -> RunResult<Outcome> {
        let program = self.program;
        let mut position = 0;
        while position < program.len() {
            let instruction = program.get(position);
            self.counter = instruction.order;
            self.tracer.on_instruction(instruction.order, instruction.opcode);
            match self.dispatch(instruction)? {
                Flow::Next => position += 1,
                Flow::Jump(order) => {
                    self.tracer.on_jump(instruction.order, order);
                    let target = program.position_of_order(order).ok_or_else(|| {
                        InterpretError::semantic(format!("no instruction with order {order}"))
                    })?;
                    position = target + 1;
                }
                Flow::Exit(status) => return Ok(Outcome::Exit(status)),
            }
        }
        Ok(Outcome::Completed)
    }

    fn dispatch(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        match instruction.opcode {
            Opcode::Move => self.exec_move(instruction),
            Opcode::CreateFrame => {
                self.frames.create_temp();
                Ok(Flow::Next)
            }
            Opcode::PushFrame => {
                self.frames.push_temp_as_local()?;
                Ok(Flow::Next)
            }
            Opcode::PopFrame => {
                self.frames.pop_local_into_temp()?;
                Ok(Flow::Next)
            }
            Opcode::DefVar => self.exec_defvar(instruction),
            Opcode::Call => self.exec_call(instruction),
            Opcode::Return => self.exec_return(),

            Opcode::Pushs => self.exec_pushs(instruction),
            Opcode::Pops => self.exec_pops(instruction),
            Opcode::Clears => {
                self.operands.clear();
                Ok(Flow::Next)
            }

            Opcode::Add => self.exec_arith(instruction, ArithOp::Add),
            Opcode::Sub => self.exec_arith(instruction, ArithOp::Sub),
            Opcode::Mul => self.exec_arith(instruction, ArithOp::Mul),
            Opcode::Idiv => self.exec_arith(instruction, ArithOp::Idiv),
            Opcode::Adds => self.exec_arith_stack(ArithOp::Add),
            Opcode::Subs => self.exec_arith_stack(ArithOp::Sub),
            Opcode::Muls => self.exec_arith_stack(ArithOp::Mul),
            Opcode::Idivs => self.exec_arith_stack(ArithOp::Idiv),

            Opcode::Lt => self.exec_compare(instruction, Comparison::Lt),
            Opcode::Gt => self.exec_compare(instruction, Comparison::Gt),
            Opcode::Eq => self.exec_eq(instruction),
            Opcode::Lts => self.exec_compare_stack(Comparison::Lt),
            Opcode::Gts => self.exec_compare_stack(Comparison::Gt),
            Opcode::Eqs => self.exec_eq_stack(),

            Opcode::And => self.exec_bool(instruction, BoolOp::And),
            Opcode::Or => self.exec_bool(instruction, BoolOp::Or),
            Opcode::Not => self.exec_not(instruction),
            Opcode::Ands => self.exec_bool_stack(BoolOp::And),
            Opcode::Ors => self.exec_bool_stack(BoolOp::Or),
            Opcode::Nots => self.exec_not_stack(),

            Opcode::Int2Char => self.exec_int2char(instruction),
            Opcode::Stri2Int => self.exec_stri2int(instruction),
            Opcode::Int2Chars => self.exec_int2char_stack(),
            Opcode::Stri2Ints => self.exec_stri2int_stack(),

            Opcode::Read => self.exec_read(instruction),
            Opcode::Write => self.exec_write(instruction),

            Opcode::Concat => self.exec_concat(instruction),
            Opcode::Strlen => self.exec_strlen(instruction),
            Opcode::GetChar => self.exec_getchar(instruction),
            Opcode::SetChar => self.exec_setchar(instruction),

            Opcode::Type => self.exec_type(instruction),

            Opcode::Label => Ok(Flow::Next),
            Opcode::Jump => self.exec_jump(instruction),
            Opcode::JumpIfEq => self.exec_jump_if_eq(instruction, false),
            Opcode::JumpIfNeq => self.exec_jump_if_eq(instruction, true),
            Opcode::JumpIfEqs => self.exec_jump_if_eq_stack(instruction, false),
            Opcode::JumpIfNeqs => self.exec_jump_if_eq_stack(instruction, true),
            Opcode::Exit => self.exec_exit(instruction),

            Opcode::Dprint => self.exec_dprint(instruction),
            Opcode::Break => self.exec_break(),
        }
    }

    // --- operand resolution ---

    /// Resolves one operand to a defined value: variable references are read
    /// from the registry, literals already are values.
    ///
    /// An undeclared variable is reported before anything else; a declared
    /// but unset one is a missing-value error.
    fn resolve<'v>(&'v self, arg: &'v Arg) -> RunResult<&'v Value> {
        match arg {
            Arg::Var(var) => {
                let value = self.frames.read(var)?;
                if value.is_set() {
                    Ok(value)
                } else {
                    Err(InterpretError::missing_value(format!(
                        "variable {var} is not defined"
                    )))
                }
            }
            Arg::Literal(value) => Ok(value),
            // The loader never lets a label or type name through to a value
            // position; defend anyway.
            Arg::Label(_) | Arg::Type(_) => {
                Err(InterpretError::structure("operand is not a value"))
            }
        }
    }

    fn resolve_int(&self, arg: &Arg) -> RunResult<i64> {
        match self.resolve(arg)? {
            Value::Int(n) => Ok(*n),
            other => Err(InterpretError::operand_type(format!(
                "expected int operand, got {}",
                other.type_name()
            ))),
        }
    }

    fn resolve_bool(&self, arg: &Arg) -> RunResult<bool> {
        match self.resolve(arg)? {
            Value::Bool(b) => Ok(*b),
            other => Err(InterpretError::operand_type(format!(
                "expected bool operand, got {}",
                other.type_name()
            ))),
        }
    }

    fn resolve_str<'v>(&'v self, arg: &'v Arg) -> RunResult<&'v str> {
        match self.resolve(arg)? {
            Value::Str(s) => Ok(s),
            other => Err(InterpretError::operand_type(format!(
                "expected string operand, got {}",
                other.type_name()
            ))),
        }
    }

    /// Assigns a computed value into the destination operand.
    fn assign_to(&mut self, arg: &Arg, value: Value) -> RunResult<Flow> {
        let var = var_operand(arg)?;
        self.frames.assign(var, value)?;
        Ok(Flow::Next)
    }

    // --- operand stack helpers ---

    fn pop_int(&mut self) -> RunResult<i64> {
        match self.operands.pop()? {
            Value::Int(n) => Ok(n),
            other => Err(InterpretError::operand_type(format!(
                "expected int on the operand stack, got {}",
                other.type_name()
            ))),
        }
    }

    fn pop_bool(&mut self) -> RunResult<bool> {
        match self.operands.pop()? {
            Value::Bool(b) => Ok(b),
            other => Err(InterpretError::operand_type(format!(
                "expected bool on the operand stack, got {}",
                other.type_name()
            ))),
        }
    }

    fn pop_str(&mut self) -> RunResult<String> {
        match self.operands.pop()? {
            Value::Str(s) => Ok(s),
            other => Err(InterpretError::operand_type(format!(
                "expected string on the operand stack, got {}",
                other.type_name()
            ))),
        }
    }

    // --- frames, variables, operand stack ---

    fn exec_move(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let value = self.resolve(instruction.arg(1))?.clone();
        self.assign_to(instruction.arg(0), value)
    }

    fn exec_defvar(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let var = var_operand(instruction.arg(0))?;
        self.frames.declare(var)?;
        Ok(Flow::Next)
    }

    fn exec_pushs(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let value = self.resolve(instruction.arg(0))?.clone();
        self.operands.push(value);
        Ok(Flow::Next)
    }

    fn exec_pops(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let value = self.operands.pop()?;
        self.assign_to(instruction.arg(0), value)
    }

    // --- input, output, type introspection ---

    fn exec_read(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let requested = type_operand(instruction.arg(1))?;
        let line = self.input.read_line();
        let value = convert_read_line(line, requested);
        self.assign_to(instruction.arg(0), value)
    }

    fn exec_write(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let text = self.resolve(instruction.arg(0))?.to_string();
        self.output.stdout_write(&text);
        Ok(Flow::Next)
    }

    /// `TYPE` inspects without needing a defined value: an unset variable
    /// yields the empty string instead of a missing-value error.
    fn exec_type(&mut self, instruction: &Instruction) -> RunResult<Flow> {
        let name = match instruction.arg(1) {
            Arg::Var(var) => self.frames.read(var)?.type_name(),
            Arg::Literal(value) => value.type_name(),
            Arg::Label(_) | Arg::Type(_) => {
                return Err(InterpretError::structure("operand is not a value"));
            }
        };
        self.assign_to(instruction.arg(0), Value::Str(name.to_owned()))
    }
}

/// The destination operand of a write-back instruction.
fn var_operand(arg: &Arg) -> RunResult<&VarRef> {
    match arg {
        Arg::Var(var) => Ok(var),
        _ => Err(InterpretError::structure("operand is not a variable")),
    }
}

/// The label operand of a control-transfer instruction.
fn label_operand(arg: &Arg) -> RunResult<&str> {
    match arg {
        Arg::Label(name) => Ok(name),
        _ => Err(InterpretError::structure("operand is not a label")),
    }
}

/// The type-name operand of `READ`.
fn type_operand(arg: &Arg) -> RunResult<DataType> {
    match arg {
        Arg::Type(data_type) => Ok(*data_type),
        _ => Err(InterpretError::structure("operand is not a type name")),
    }
}

/// Converts one `READ` input line to the requested type. End-of-stream and
/// conversion failures both yield nil.
fn convert_read_line(line: Option<String>, requested: DataType) -> Value {
    let Some(line) = line else {
        return Value::Nil;
    };
    match requested {
        DataType::Int => line.trim().parse::<i64>().map_or(Value::Nil, Value::Int),
        DataType::String => Value::Str(line),
        DataType::Bool => Value::Bool(line.eq_ignore_ascii_case("true")),
        // the loader rejects `nil` as a READ type name
        DataType::Nil => Value::Nil,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_conversions() {
        let line = |s: &str| Some(s.to_owned());
        assert_eq!(convert_read_line(line("42"), DataType::Int), Value::Int(42));
        assert_eq!(convert_read_line(line(" 42 "), DataType::Int), Value::Int(42));
        assert_eq!(convert_read_line(line("42abc"), DataType::Int), Value::Nil);
        assert_eq!(convert_read_line(line(""), DataType::Int), Value::Nil);
        assert_eq!(
            convert_read_line(line("hello"), DataType::String),
            Value::Str("hello".to_owned())
        );
        assert_eq!(convert_read_line(line("TRUE"), DataType::Bool), Value::Bool(true));
        assert_eq!(convert_read_line(line("tRuE"), DataType::Bool), Value::Bool(true));
        assert_eq!(convert_read_line(line("yes"), DataType::Bool), Value::Bool(false));
        assert_eq!(convert_read_line(None, DataType::Int), Value::Nil);
        assert_eq!(convert_read_line(None, DataType::Bool), Value::Nil);
        assert_eq!(convert_read_line(None, DataType::String), Value::Nil);
    }
}
