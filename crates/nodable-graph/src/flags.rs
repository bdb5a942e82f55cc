//! Small flag/enum types shared by slots, properties and the mutation API.

/// Direction a slot points: into the node (`Input`) or out of it
/// (`Output`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// What kind of connection a slot carries: a data value, or control flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Value,
    Flow,
}

/// Breaks symmetry when a node has two slots with the same
/// direction+role (e.g. an operator's two value-input slots, or an `if`
/// node's two flow-output branches).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Order {
    First,
    Second,
}

/// How many adjacent slots a slot may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capacity {
    Limited(u8),
    Unlimited,
}

impl Capacity {
    #[must_use]
    pub const fn one() -> Self {
        Self::Limited(1)
    }

    #[must_use]
    pub fn allows(self, current_len: usize) -> bool {
        match self {
            Self::Limited(max) => current_len < max as usize,
            Self::Unlimited => true,
        }
    }
}

/// Property flags. Exactly one property per node carries `IS_THIS`,
/// representing the node itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropertyFlags(u8);

impl PropertyFlags {
    pub const NONE: Self = Self(0);
    pub const IS_REFERENCE: Self = Self(1 << 0);
    pub const IS_PRIVATE: Self = Self(1 << 1);
    pub const IS_THIS: Self = Self(1 << 2);

    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    #[must_use]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }
}

/// Flags accepted by [`crate::Graph::connect`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectFlags(u8);

impl ConnectFlags {
    pub const NONE: Self = Self(0);
    /// Automatically connect the opposite-direction slot pairing where one
    /// applies (e.g. connecting a variable's declaration-output also wires
    /// its value property as an input on the consumer side).
    pub const ALLOW_SIDE_EFFECTS: Self = Self(1 << 0);

    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }
}

/// Flags accepted by [`crate::Graph::disconnect`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisconnectFlags(u8);

impl DisconnectFlags {
    pub const NONE: Self = Self(0);
    pub const ALLOW_SIDE_EFFECTS: Self = Self(1 << 0);

    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }
}

/// Flags accepted by [`crate::Graph::find_variable`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LookupFlags(u8);

impl LookupFlags {
    pub const NONE: Self = Self(0);
    pub const RECURSE_PARENT_SCOPES: Self = Self(1 << 0);

    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }
}
