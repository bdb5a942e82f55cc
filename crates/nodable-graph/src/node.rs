//! Node — a vertex in the graph: a kind tag, a property bag, a slot bag,
//! and a place in a lexical scope.

use indexmap::IndexMap;
use nodable_scanner::Token;
use rustc_hash::FxHashMap;

use crate::ids::{PropertyId, ScopeId, SlotId};

/// The name every node's synthetic self-reference property is stored
/// under. Exactly one property per node carries [`crate::PropertyFlags::IS_THIS`]
/// and it is always this one, created by the node factory before any
/// kind-specific properties.
pub const THIS_PROPERTY_NAME: &str = "this";

/// Named structural token keys shared by the parser (which writes them)
/// and the serializer (which reads them back), so both crates agree on
/// the key strings without either importing the other.
pub const TOKEN_KEYWORD: &str = "keyword";
pub const TOKEN_ELSE: &str = "else";
pub const TOKEN_TYPE: &str = "type";
pub const TOKEN_IDENTIFIER: &str = "identifier";
pub const TOKEN_ASSIGN: &str = "assign";
pub const TOKEN_OPERATOR: &str = "operator";

/// What a node represents. Behavior that used to live in a class hierarchy
/// (the origin has per-kind subclasses) is expressed instead as a plain
/// enum plus small capability queries on [`NodeKind`] — see
/// `NodeKind::has_condition`, `has_flow_branches`, `has_internal_scope`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An explicit `{ ... }` block, or the graph's implicit root.
    Scope,
    /// A generic node with no further structure (rarely constructed
    /// directly; kept for parity with the origin's default node shape).
    Default,
    /// A bare `;`.
    EmptyInstruction,
    Literal,
    Variable,
    VariableRef,
    Operator,
    FunctionCall,
    If,
    ForLoop,
    WhileLoop,
}

impl NodeKind {
    /// Whether nodes of this kind own a `condition` property.
    #[must_use]
    pub const fn has_condition(self) -> bool {
        matches!(self, Self::If | Self::ForLoop | Self::WhileLoop)
    }

    /// Whether nodes of this kind own one or more flow-output branch slots.
    #[must_use]
    pub const fn has_flow_branches(self) -> bool {
        matches!(self, Self::If | Self::ForLoop | Self::WhileLoop)
    }

    /// Whether nodes of this kind own an internal [`crate::Scope`]
    /// (the scope, if, for, while and root kinds; partitions live inside
    /// that internal scope).
    #[must_use]
    pub const fn has_internal_scope(self) -> bool {
        matches!(self, Self::Scope | Self::If | Self::ForLoop | Self::WhileLoop)
    }
}

/// A vertex in the graph.
pub struct Node {
    kind: NodeKind,
    name: String,
    properties: IndexMap<String, PropertyId>,
    slots: Vec<SlotId>,
    /// Trailing `;` or `\n` preserved for serialization (an
    /// `expression_block`'s optional semicolon, for instance).
    suffix_token: Option<Token>,
    /// Named structural tokens that don't belong to any one property —
    /// `if`/`else`/`for`/`while` keywords, a variable's type-keyword,
    /// identifier and `=` tokens. Keyed by a fixed set of string
    /// constants declared alongside each parser production that uses
    /// them (see `nodable_parser`).
    tokens: FxHashMap<&'static str, Token>,
    scope: ScopeId,
    internal_scope: Option<ScopeId>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, name: String, scope: ScopeId) -> Self {
        Self {
            kind,
            name,
            properties: IndexMap::new(),
            slots: Vec::new(),
            suffix_token: None,
            tokens: FxHashMap::default(),
            scope,
            internal_scope: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    #[must_use]
    pub fn internal_scope(&self) -> Option<ScopeId> {
        self.internal_scope
    }

    pub(crate) fn set_internal_scope(&mut self, scope: ScopeId) {
        self.internal_scope = Some(scope);
    }

    #[must_use]
    pub fn suffix_token(&self) -> Option<&Token> {
        self.suffix_token.as_ref()
    }

    pub fn set_suffix_token(&mut self, token: Token) {
        self.suffix_token = Some(token);
    }

    #[must_use]
    pub fn token(&self, key: &str) -> Option<&Token> {
        self.tokens.get(key)
    }

    pub fn set_token(&mut self, key: &'static str, token: Token) {
        self.tokens.insert(key, token);
    }

    /// Declares a property under `name`. Panics (a graph invariant
    /// violation, not a user-facing error) if the name already exists on
    /// this node — node factories only ever declare each name once.
    pub(crate) fn declare_property(&mut self, name: impl Into<String>, id: PropertyId) {
        let name = name.into();
        let previous = self.properties.insert(name.clone(), id);
        assert!(previous.is_none(), "duplicate property name {name:?} on node");
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyId> {
        self.properties.get(name).copied()
    }

    #[must_use]
    pub fn this_property(&self) -> PropertyId {
        *self.properties.get(THIS_PROPERTY_NAME).expect("every node has a `this` property")
    }

    /// Properties in insertion order (the `this` self-reference always
    /// comes first).
    pub fn properties(&self) -> impl Iterator<Item = (&str, PropertyId)> {
        self.properties.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub(crate) fn add_slot(&mut self, slot: SlotId) {
        self.slots.push(slot);
    }

    #[must_use]
    pub fn slots(&self) -> &[SlotId] {
        &self.slots
    }
}
