//! The bytecode instruction set from `spec.md` §4.5/§6: a flat, jump-
//! addressed instruction stream plus the four logical registers.

use nodable_graph::{NodeId, ScopeId};

use crate::invokable::FunctionId;
use crate::value::Value;

/// The VM's four logical registers. `rax` carries the accumulator / last
/// evaluated value; `rdx` is scratch (used by `cmp`); `esp`/`ebp` track the
/// value-stack pointer and the current frame's base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    Rax,
    Rdx,
    Esp,
    Ebp,
}

/// The source side of a `mov`: either another register, an immediate
/// constant baked in at compile time, or a declared variable's slot.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Register(Register),
    Immediate(Value),
    Variable(NodeId),
}

/// One bytecode instruction. Jump targets (`Jmp`/`Jne`/`Jeq`) are absolute
/// indices into the instruction stream, patched in after the jump's
/// destination is known — see [`crate::Compiler::patch`].
///
/// `Mov`'s destination is widened from the register-only `mov(dst_reg,
/// src_value)` `spec.md` §4.5 describes to any [`Operand`]: a variable's
/// frame slot is allocated up front by `PushVar` (hoisted ahead of the
/// statement that initializes it), so writing an initializer's result —
/// or a call argument — into it needs a store target beyond the two
/// scratch registers.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    PushStackFrame(ScopeId),
    PopStackFrame(ScopeId),
    PushVar(NodeId),
    PopVar(NodeId),
    Mov { dst: Operand, src: Operand },
    Cmp(Register, Register),
    Jmp(usize),
    Jne(usize),
    Jeq(usize),
    Call(FunctionId),
    Ret,
}

/// A compiled program: a flat instruction stream the VM executes starting
/// at index 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bytecode {
    instructions: Vec<Instruction>,
}

impl Bytecode {
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub(crate) fn push(&mut self, instruction: Instruction) -> usize {
        let index = self.instructions.len();
        self.instructions.push(instruction);
        index
    }

    pub(crate) fn patch(&mut self, index: usize, instruction: Instruction) {
        self.instructions[index] = instruction;
    }

    #[must_use]
    pub fn next_index(&self) -> usize {
        self.instructions.len()
    }
}
