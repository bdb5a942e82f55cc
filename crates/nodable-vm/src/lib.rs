//! Executes [`nodable_compiler::Bytecode`] — `spec.md` §4.6's "minimal
//! interpreter": a value stack expressed as nested frames keyed by
//! variable identity, plus the four logical registers.

mod error;

pub use error::RuntimeError;

use nodable_compiler::{builtin_invokables, Bytecode, FunctionId, Instruction, Invokable, Operand, Register, Value};
use nodable_graph::NodeId;
use rustc_hash::FxHashMap;
use tracing::trace;

/// The value left in `rax` when the program halts — either by running off
/// the end of the instruction stream or executing `ret`.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramResult(pub Value);

impl ProgramResult {
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

#[derive(Default)]
struct Frame {
    variables: FxHashMap<NodeId, Value>,
}

struct Registers {
    rax: Value,
    rdx: Value,
    esp: Value,
    ebp: Value,
}

impl Default for Registers {
    fn default() -> Self {
        Self { rax: Value::Void, rdx: Value::Void, esp: Value::Void, ebp: Value::Void }
    }
}

struct Vm {
    frames: Vec<Frame>,
    registers: Registers,
    /// Result of the most recent `cmp`: `true` means the two registers
    /// were equal (the VM's zero flag).
    zero_flag: bool,
    invokables: Vec<Invokable>,
}

/// Runs `bytecode` to completion and returns the program's result.
pub fn run(bytecode: &Bytecode) -> Result<ProgramResult, RuntimeError> {
    let mut vm = Vm::new();
    vm.execute(bytecode)
}

impl Vm {
    fn new() -> Self {
        Self { frames: Vec::new(), registers: Registers::default(), zero_flag: false, invokables: builtin_invokables() }
    }

    fn execute(&mut self, bytecode: &Bytecode) -> Result<ProgramResult, RuntimeError> {
        let instructions = bytecode.instructions();
        let mut pc = 0usize;
        while pc < instructions.len() {
            trace!(pc, instruction = ?instructions[pc], "executing");
            match &instructions[pc] {
                Instruction::PushStackFrame(_scope) => {
                    self.frames.push(Frame::default());
                    pc += 1;
                }
                Instruction::PopStackFrame(_scope) => {
                    self.frames.pop().ok_or(RuntimeError::StackUnderflow)?;
                    pc += 1;
                }
                Instruction::PushVar(id) => {
                    self.current_frame_mut()?.variables.insert(*id, Value::Void);
                    pc += 1;
                }
                Instruction::PopVar(id) => {
                    self.current_frame_mut()?.variables.remove(id);
                    pc += 1;
                }
                Instruction::Mov { dst, src } => {
                    let value = self.read_operand(src)?;
                    self.write_operand(dst, value)?;
                    pc += 1;
                }
                Instruction::Cmp(a, b) => {
                    self.zero_flag = self.read_register(*a) == self.read_register(*b);
                    pc += 1;
                }
                Instruction::Jmp(target) => pc = *target,
                Instruction::Jne(target) => pc = if self.zero_flag { pc + 1 } else { *target },
                Instruction::Jeq(target) => pc = if self.zero_flag { *target } else { pc + 1 },
                Instruction::Call(id) => {
                    self.dispatch(*id)?;
                    pc += 1;
                }
                Instruction::Ret => return Ok(ProgramResult(self.registers.rax.clone())),
            }
        }
        Ok(ProgramResult(self.registers.rax.clone()))
    }

    fn current_frame_mut(&mut self) -> Result<&mut Frame, RuntimeError> {
        self.frames.last_mut().ok_or(RuntimeError::StackUnderflow)
    }

    fn read_register(&self, register: Register) -> Value {
        match register {
            Register::Rax => self.registers.rax.clone(),
            Register::Rdx => self.registers.rdx.clone(),
            Register::Esp => self.registers.esp.clone(),
            Register::Ebp => self.registers.ebp.clone(),
        }
    }

    fn write_register(&mut self, register: Register, value: Value) {
        match register {
            Register::Rax => self.registers.rax = value,
            Register::Rdx => self.registers.rdx = value,
            Register::Esp => self.registers.esp = value,
            Register::Ebp => self.registers.ebp = value,
        }
    }

    fn lookup_variable(&self, id: NodeId) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.variables.get(&id))
    }

    fn store_variable(&mut self, id: NodeId, value: Value) -> Result<(), RuntimeError> {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.variables.get_mut(&id) {
                *slot = value;
                return Ok(());
            }
        }
        Err(RuntimeError::UndefinedVariable(id))
    }

    fn read_operand(&self, operand: &Operand) -> Result<Value, RuntimeError> {
        match operand {
            Operand::Register(r) => Ok(self.read_register(*r)),
            Operand::Immediate(v) => Ok(v.clone()),
            Operand::Variable(id) => self.lookup_variable(*id).cloned().ok_or(RuntimeError::UndefinedVariable(*id)),
        }
    }

    fn write_operand(&mut self, operand: &Operand, value: Value) -> Result<(), RuntimeError> {
        match operand {
            Operand::Register(r) => {
                self.write_register(*r, value);
                Ok(())
            }
            Operand::Variable(id) => self.store_variable(*id, value),
            Operand::Immediate(v) => Err(RuntimeError::TypeMismatch { expected: "mov destination", found: v.type_name() }),
        }
    }

    fn dispatch(&mut self, id: FunctionId) -> Result<(), RuntimeError> {
        let invokable = self
            .invokables
            .iter()
            .find(|inv| inv.id == id)
            .ok_or_else(|| RuntimeError::UnknownInvokable(format!("{id:?}")))?;
        let name = invokable.name;
        let arity = invokable.arity();
        let result = match arity {
            1 => call_unary(name, self.registers.rax.clone())?,
            2 => call_binary(name, self.registers.rdx.clone(), self.registers.rax.clone())?,
            _ => return Err(RuntimeError::UnknownInvokable(name.to_string())),
        };
        self.registers.rax = result;
        Ok(())
    }
}

fn call_unary(name: &str, operand: Value) -> Result<Value, RuntimeError> {
    match name {
        "-" => match operand {
            Value::Int(i) => Ok(Value::Int(-i)),
            other => other.as_double().map(|d| Value::Double(-d)).ok_or(RuntimeError::TypeMismatch {
                expected: "int or double",
                found: other.type_name(),
            }),
        },
        "!" => operand
            .as_bool()
            .map(|b| Value::Bool(!b))
            .ok_or(RuntimeError::TypeMismatch { expected: "bool", found: operand.type_name() }),
        _ => Err(RuntimeError::UnknownInvokable(name.to_string())),
    }
}

fn call_binary(name: &str, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match name {
        "+" => add(lhs, rhs),
        "-" => arith(lhs, rhs, |a, b| a - b, |a, b| a - b),
        "*" => arith(lhs, rhs, |a, b| a * b, |a, b| a * b),
        "/" => divide(lhs, rhs),
        "==" => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        "!=" => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        "<" => compare(lhs, rhs, |a, b| a < b, |a, b| a < b),
        ">" => compare(lhs, rhs, |a, b| a > b, |a, b| a > b),
        "<=" => compare(lhs, rhs, |a, b| a <= b, |a, b| a <= b),
        ">=" => compare(lhs, rhs, |a, b| a >= b, |a, b| a >= b),
        _ => Err(RuntimeError::UnknownInvokable(name.to_string())),
    }
}

fn add(lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    if let (Value::String(a), Value::String(b)) = (&lhs, &rhs) {
        return Ok(Value::String(format!("{a}{b}")));
    }
    arith(lhs, rhs, |a, b| a + b, |a, b| a + b)
}

fn arith(lhs: Value, rhs: Value, int_op: fn(i64, i64) -> i64, double_op: fn(f64, f64) -> f64) -> Result<Value, RuntimeError> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        return Ok(Value::Int(int_op(*a, *b)));
    }
    let a = lhs.as_double().ok_or(RuntimeError::TypeMismatch { expected: "int or double", found: lhs.type_name() })?;
    let b = rhs.as_double().ok_or(RuntimeError::TypeMismatch { expected: "int or double", found: rhs.type_name() })?;
    Ok(Value::Double(double_op(a, b)))
}

fn divide(lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        if *b == 0 {
            return Err(RuntimeError::DivisionByZero);
        }
        return Ok(Value::Int(a / b));
    }
    let a = lhs.as_double().ok_or(RuntimeError::TypeMismatch { expected: "int or double", found: lhs.type_name() })?;
    let b = rhs.as_double().ok_or(RuntimeError::TypeMismatch { expected: "int or double", found: rhs.type_name() })?;
    if b == 0.0 {
        return Err(RuntimeError::DivisionByZero);
    }
    Ok(Value::Double(a / b))
}

fn compare(lhs: Value, rhs: Value, int_op: fn(i64, i64) -> bool, double_op: fn(f64, f64) -> bool) -> Result<Value, RuntimeError> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        return Ok(Value::Bool(int_op(*a, *b)));
    }
    let a = lhs.as_double().ok_or(RuntimeError::TypeMismatch { expected: "int or double", found: lhs.type_name() })?;
    let b = rhs.as_double().ok_or(RuntimeError::TypeMismatch { expected: "int or double", found: rhs.type_name() })?;
    Ok(Value::Bool(double_op(a, b)))
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Double(a), Value::Double(b)) => a == b,
        (Value::Int(_) | Value::Double(_), Value::Int(_) | Value::Double(_)) => {
            lhs.as_double() == rhs.as_double()
        }
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Void, Value::Void) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodable_compiler::compile;
    use nodable_graph::Graph;
    use nodable_parser::parse;

    fn run_source(source: &str) -> Value {
        let mut graph = Graph::new();
        assert!(parse(source, &mut graph), "source failed to parse: {source}");
        let bytecode = compile(&graph).expect("compiles");
        run(&bytecode).expect("runs").into_value()
    }

    #[test]
    fn evaluates_integer_addition() {
        assert_eq!(run_source("1 + 2;"), Value::Int(3));
    }

    #[test]
    fn evaluates_mixed_int_double_arithmetic_by_widening() {
        assert_eq!(run_source("1 + 2.5;"), Value::Double(3.5));
    }

    #[test]
    fn evaluates_comparison() {
        assert_eq!(run_source("1 < 2;"), Value::Bool(true));
    }

    #[test]
    fn evaluates_unary_negation() {
        assert_eq!(run_source("-(5);"), Value::Int(-5));
    }

    #[test]
    fn loads_a_declared_variable() {
        assert_eq!(run_source("int x = 41; x + 1;"), Value::Int(42));
    }

    #[test]
    fn integer_division_by_zero_is_a_runtime_error() {
        let mut graph = Graph::new();
        assert!(parse("1 / 0;", &mut graph));
        let bytecode = compile(&graph).expect("compiles");
        assert_eq!(run(&bytecode), Err(RuntimeError::DivisionByZero));
    }

    #[test]
    fn if_true_branch_runs_and_false_branch_does_not() {
        assert_eq!(run_source("int x = 0; if(1 == 1) { x + 10; } else { x + 20; }"), Value::Int(10));
    }

    #[test]
    fn if_false_branch_runs_when_condition_fails() {
        assert_eq!(run_source("int x = 0; if(1 == 2) { x + 10; } else { x + 20; }"), Value::Int(20));
    }

    /// `x < 1` is false on the very first check, so the body never runs;
    /// the last value left in `rax` is the failed condition check itself.
    #[test]
    fn while_loop_skips_body_when_condition_starts_false() {
        assert_eq!(run_source("int x = 1; while(x < 1) { x; }"), Value::Bool(false));
    }

    #[test]
    fn assignment_reassigns_a_declared_variable() {
        assert_eq!(run_source("int x = 1; x = 2; x;"), Value::Int(2));
    }

    #[test]
    fn for_loop_increments_with_plain_assignment() {
        assert_eq!(run_source("int sum = 0; for(int i = 0; i < 3; i = i + 1) { sum = sum + i; } sum;"), Value::Int(3));
    }

    #[test]
    fn empty_program_result_is_void() {
        assert_eq!(run_source(""), Value::Void);
    }
}
