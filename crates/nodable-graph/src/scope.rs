//! Scope — a first-class lexical scope owned by a node.

use indexmap::IndexMap;
use nodable_scanner::Token;

use crate::ids::{NodeId, ScopeId};

/// A lexical scope: the backbone of nodes it directly contains, the
/// variables it declares, and any sub-scope partitions (an `if`'s true/false
/// arms, a `for`'s header+body).
pub struct Scope {
    owner: NodeId,
    parent: Option<ScopeId>,
    depth: u32,
    /// The ordered, flow-connected chain of nodes directly inside this
    /// scope.
    backbone: Vec<NodeId>,
    /// Variables declared directly in this scope, keyed by identifier.
    /// Insertion order preserved; lookup walks parent scopes via
    /// `Graph::find_variable`.
    variables: IndexMap<String, NodeId>,
    /// Sub-scope partitions, in source order (an `if` has exactly two: true
    /// then false; a `for` has exactly one: the body).
    partitions: Vec<ScopeId>,
    begin_token: Option<Token>,
    end_token: Option<Token>,
}

impl Scope {
    pub(crate) fn new(owner: NodeId, parent: Option<ScopeId>, depth: u32) -> Self {
        Self {
            owner,
            parent,
            depth,
            backbone: Vec::new(),
            variables: IndexMap::new(),
            partitions: Vec::new(),
            begin_token: None,
            end_token: None,
        }
    }

    #[must_use]
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    #[must_use]
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[must_use]
    pub fn backbone(&self) -> &[NodeId] {
        &self.backbone
    }

    pub(crate) fn push_backbone(&mut self, node: NodeId) {
        self.backbone.push(node);
    }

    pub(crate) fn remove_backbone(&mut self, node: NodeId) {
        self.backbone.retain(|&n| n != node);
    }

    #[must_use]
    pub fn variables(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.variables.iter().map(|(name, id)| (name.as_str(), *id))
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<NodeId> {
        self.variables.get(name).copied()
    }

    /// Declares a variable. Returns `false` (and declares nothing) if the
    /// name is already taken in this scope — identifiers are unique per
    /// declaring scope.
    #[must_use]
    pub(crate) fn declare_variable(&mut self, name: impl Into<String>, node: NodeId) -> bool {
        let name = name.into();
        if self.variables.contains_key(&name) {
            return false;
        }
        self.variables.insert(name, node);
        true
    }

    pub(crate) fn remove_variable(&mut self, name: &str) {
        self.variables.shift_remove(name);
    }

    #[must_use]
    pub fn partitions(&self) -> &[ScopeId] {
        &self.partitions
    }

    pub(crate) fn push_partition(&mut self, scope: ScopeId) {
        self.partitions.push(scope);
    }

    #[must_use]
    pub fn begin_token(&self) -> Option<&Token> {
        self.begin_token.as_ref()
    }

    pub fn set_begin_token(&mut self, token: Token) {
        self.begin_token = Some(token);
    }

    #[must_use]
    pub fn end_token(&self) -> Option<&Token> {
        self.end_token.as_ref()
    }

    pub fn set_end_token(&mut self, token: Token) {
        self.end_token = Some(token);
    }
}
