//! The runtime value a register or stack slot holds — the 64-bit typed
//! word `spec.md` §4.5 describes, expressed as a tagged enum instead of a
//! literal bit-packed union (the VM only ever needs to move, compare and
//! print these, never reinterpret their bits).

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// The absence of a value — an uninitialized register or a `void`
    /// invokable's result.
    Void,
}

impl Value {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Void => "void",
        }
    }

    /// Truthiness used by `jne`/`jeq` branch evaluation: a non-zero `bool`.
    /// Any other type reaching a branch test is a VM-level type mismatch,
    /// caught by the caller before this is consulted.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Void => write!(f, "void"),
        }
    }
}
