//! `RuntimeError` — hand-written `Display`, no `thiserror`, matching
//! `nodable_common::diagnostics::Diagnostic`'s own hand-written impl; core
//! crates keep this dependency-free.

use nodable_graph::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// `Call` named an invokable id the VM's built-in table doesn't carry.
    UnknownInvokable(String),
    /// Integer or floating-point division where the divisor evaluated to
    /// zero.
    DivisionByZero,
    /// An invokable's operand couldn't be coerced to the type it needed
    /// (e.g. `!` applied to a non-`bool`).
    TypeMismatch { expected: &'static str, found: &'static str },
    /// `Mov`/`Cmp` referenced a variable no `PushVar` in any live frame
    /// declared — a compiler invariant violation, not a user error.
    UndefinedVariable(NodeId),
    /// `PopStackFrame`/`PopVar` ran with no matching frame on the stack.
    StackUnderflow,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownInvokable(name) => write!(f, "no invokable registered for call id ({name})"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::UndefinedVariable(id) => write!(f, "undefined variable {id:?}"),
            Self::StackUnderflow => write!(f, "frame stack underflow"),
        }
    }
}

impl std::error::Error for RuntimeError {}
