//! Property — a named, typed value cell attached to a node.

use nodable_lang::ValueType;
use nodable_scanner::Token;

use crate::flags::PropertyFlags;
use crate::ids::NodeId;

pub struct Property {
    owner: NodeId,
    name: String,
    ty: ValueType,
    /// The token carrying the literal text this property was parsed from;
    /// `None` for synthesized properties (e.g. the `this` self-reference,
    /// or a property created by the compiler/host rather than the parser).
    token: Option<Token>,
    flags: PropertyFlags,
}

impl Property {
    pub(crate) fn new(owner: NodeId, name: impl Into<String>, ty: ValueType, flags: PropertyFlags) -> Self {
        Self { owner, name: name.into(), ty, token: None, flags }
    }

    #[must_use]
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.ty
    }

    pub fn set_value_type(&mut self, ty: ValueType) {
        self.ty = ty;
    }

    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn set_token(&mut self, token: Token) {
        self.token = Some(token);
    }

    #[must_use]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    #[must_use]
    pub fn is_this(&self) -> bool {
        self.flags.has(PropertyFlags::IS_THIS)
    }

    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.flags.has(PropertyFlags::IS_REFERENCE)
    }
}
