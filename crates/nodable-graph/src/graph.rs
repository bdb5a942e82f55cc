//! The graph itself: arenas for every entity kind, the edge registry, and
//! the host-facing mutation API that keeps slots, scopes and signals
//! consistent.

use nodable_lang::ValueType;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::arena::Arena;
use crate::components::ComponentBag;
use crate::edge::Edge;
use crate::flags::{
    Capacity, ConnectFlags, Direction, DisconnectFlags, LookupFlags, Order, PropertyFlags, Role,
};
use crate::ids::{EdgeId, NodeId, PropertyId, ScopeId, SlotId};
use crate::node::{Node, NodeKind, THIS_PROPERTY_NAME};
use crate::property::Property;
use crate::scope::Scope;
use crate::signal::{Signal, SignalBus};
use crate::slot::Slot;

/// The graph: sole owner of every node, property, slot, scope and edge.
pub struct Graph {
    nodes: Arena<Node>,
    properties: Arena<Property>,
    slots: Arena<Slot>,
    scopes: Arena<Scope>,
    edges: Arena<Edge>,
    /// Fast lookup from a slot to the edges touching it; kept consistent
    /// with `Slot::adjacents` by every mutation in this module.
    edges_by_slot: FxHashMap<SlotId, Vec<EdgeId>>,
    root: NodeId,
    root_scope: ScopeId,
    components: ComponentBag,
    signals: SignalBus,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let mut scopes = Arena::new();

        // The root node owns the root scope, and the root scope's owner is
        // the root node — resolved by reserving the node's id first and
        // using it to build its own scope before the node itself exists.
        let mut root_scope_id = None;
        let root = nodes.insert_with(|node_id| {
            let scope_id = scopes.insert(Scope::new(node_id, None, 0));
            root_scope_id = Some(scope_id);
            Node::new(NodeKind::Scope, String::new(), scope_id)
        });
        let root_scope = root_scope_id.expect("set inside insert_with");
        nodes.get_mut(root).expect("just inserted").set_internal_scope(root_scope);

        let mut graph = Self {
            nodes,
            properties: Arena::new(),
            slots: Arena::new(),
            scopes,
            edges: Arena::new(),
            edges_by_slot: FxHashMap::default(),
            root,
            root_scope,
            components: ComponentBag::new(),
            signals: SignalBus::new(),
        };
        graph.install_shape(root, NodeKind::Scope);
        graph
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn root_scope(&self) -> ScopeId {
        self.root_scope
    }

    #[must_use]
    pub fn components(&self) -> &ComponentBag {
        &self.components
    }

    #[must_use]
    pub fn components_mut(&mut self) -> &mut ComponentBag {
        &mut self.components
    }

    pub fn subscribe(&mut self, listener: impl FnMut(Signal) + 'static) {
        self.signals.subscribe(listener);
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    #[must_use]
    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.properties.get(id)
    }

    #[must_use]
    pub fn property_mut(&mut self, id: PropertyId) -> Option<&mut Property> {
        self.properties.get_mut(id)
    }

    #[must_use]
    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(id)
    }

    #[must_use]
    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.get_mut(id)
    }

    #[must_use]
    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id)
    }

    #[must_use]
    pub fn scope_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.scopes.get_mut(id)
    }

    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Finds the slot on `node`'s `property_name` property that has the
    /// given `direction`/`order`. Node factories declare at most one slot
    /// per (property, direction, order) triple, so this is unambiguous.
    #[must_use]
    pub fn find_slot(
        &self,
        node: NodeId,
        property_name: &str,
        direction: Direction,
        order: Order,
    ) -> Option<SlotId> {
        let node = self.nodes.get(node)?;
        let property = node.property(property_name)?;
        node.slots().iter().copied().find(|&slot_id| {
            self.slots.get(slot_id).is_some_and(|slot| {
                slot.property() == property && slot.direction() == direction && slot.order() == order
            })
        })
    }

    #[must_use]
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    // ---- factory -----------------------------------------------------

    /// Allocates a node of `kind`, installs its canonical property/slot
    /// shape, records `scope` as its owner, and emits `AddNode`. Does
    /// *not* add the node to `scope`'s backbone — only nodes that are
    /// themselves a program statement belong there (see
    /// [`Self::attach_to_backbone`]); a sub-expression's nodes are
    /// reached by following its edges, not by a separate backbone slot.
    pub fn create_node(&mut self, kind: NodeKind, scope: ScopeId) -> NodeId {
        let id = self.nodes.insert(Node::new(kind, String::new(), scope));
        self.install_shape(id, kind);
        trace!(?kind, "created node");
        self.signals.emit(Signal::AddNode(id));
        id
    }

    /// Marks `node` as one of `scope`'s top-level, flow-connected
    /// statements. Called by the parser once per parsed statement
    /// (`atomic_code_block`'s result), never for sub-expression nodes.
    pub fn attach_to_backbone(&mut self, scope: ScopeId, node: NodeId) {
        if let Some(s) = self.scopes.get_mut(scope) {
            s.push_backbone(node);
        }
    }

    /// Creates a fresh child scope owned by `owner`, parented under
    /// `parent`.
    pub(crate) fn create_scope(&mut self, owner: NodeId, parent: Option<ScopeId>) -> ScopeId {
        let depth = parent.and_then(|p| self.scopes.get(p)).map_or(0, |s| s.depth() + 1);
        self.scopes.insert(Scope::new(owner, parent, depth))
    }

    fn declare_property(
        &mut self,
        owner: NodeId,
        name: &'static str,
        ty: ValueType,
        flags: PropertyFlags,
    ) -> PropertyId {
        let id = self.properties.insert(Property::new(owner, name, ty, flags));
        self.nodes.get_mut(owner).expect("owner exists").declare_property(name, id);
        id
    }

    fn declare_slot(
        &mut self,
        owner: NodeId,
        property: PropertyId,
        direction: Direction,
        role: Role,
        order: Order,
        capacity: Capacity,
    ) -> SlotId {
        let id = self.slots.insert(Slot::new(owner, property, direction, role, order, capacity));
        self.nodes.get_mut(owner).expect("owner exists").add_slot(id);
        id
    }

    /// Installs the canonical property/slot shape for `kind` on `node`,
    /// starting with the `this` self-reference every node carries.
    fn install_shape(&mut self, node: NodeId, kind: NodeKind) {
        let this_prop = self.declare_property(
            node,
            THIS_PROPERTY_NAME,
            ValueType::NodeReference,
            PropertyFlags::NONE.with(PropertyFlags::IS_THIS).with(PropertyFlags::IS_REFERENCE),
        );
        self.declare_slot(
            node,
            this_prop,
            Direction::Output,
            Role::Value,
            Order::First,
            Capacity::Unlimited,
        );

        match kind {
            NodeKind::Scope => {
                // The root node's scope is created by `Graph::new` before
                // this call (its owner/scope pair is bootstrapped
                // together); every other explicit `{ ... }` block gets a
                // fresh child scope here.
                if self.nodes.get(node).expect("just created").internal_scope().is_none() {
                    let parent = self.nodes.get(node).expect("just created").scope();
                    let scope = self.create_scope(node, Some(parent));
                    self.nodes.get_mut(node).expect("just created").set_internal_scope(scope);
                }
            }
            NodeKind::Default | NodeKind::EmptyInstruction => {}
            NodeKind::Literal => {
                let value = self.declare_property(node, "value", ValueType::Any, PropertyFlags::NONE);
                self.declare_slot(node, value, Direction::Output, Role::Value, Order::First, Capacity::Unlimited);
            }
            NodeKind::Variable => {
                let value = self.declare_property(node, "value", ValueType::Any, PropertyFlags::NONE);
                self.declare_slot(node, value, Direction::Input, Role::Value, Order::First, Capacity::one());
                // declaration-output: the edge that declares+initializes this
                // variable in the flow.
                self.declare_slot(node, value, Direction::Output, Role::Value, Order::First, Capacity::one());
                // reference-output: edges from variable_ref readers.
                self.declare_slot(node, value, Direction::Output, Role::Value, Order::Second, Capacity::Unlimited);
            }
            NodeKind::VariableRef => {
                let value = self.declare_property(node, "value", ValueType::Any, PropertyFlags::IS_REFERENCE);
                self.declare_slot(node, value, Direction::Input, Role::Value, Order::First, Capacity::one());
                self.declare_slot(node, value, Direction::Output, Role::Value, Order::First, Capacity::Unlimited);
            }
            NodeKind::Operator => {
                let result = self.declare_property(node, "result", ValueType::Any, PropertyFlags::NONE);
                self.declare_slot(node, result, Direction::Output, Role::Value, Order::First, Capacity::Unlimited);
                let lvalue = self.declare_property(node, "lvalue", ValueType::Any, PropertyFlags::NONE);
                self.declare_slot(node, lvalue, Direction::Input, Role::Value, Order::First, Capacity::one());
                let rvalue = self.declare_property(node, "rvalue", ValueType::Any, PropertyFlags::NONE);
                self.declare_slot(node, rvalue, Direction::Input, Role::Value, Order::Second, Capacity::one());
            }
            NodeKind::FunctionCall => {
                let result = self.declare_property(node, "result", ValueType::Any, PropertyFlags::NONE);
                self.declare_slot(node, result, Direction::Output, Role::Value, Order::First, Capacity::Unlimited);
                // Arguments are declared by the caller via `declare_argument`
                // once the callee's arity is known (parser/compiler side).
            }
            NodeKind::If => {
                let condition =
                    self.declare_property(node, "condition", ValueType::Bool, PropertyFlags::NONE);
                self.declare_slot(node, condition, Direction::Input, Role::Value, Order::First, Capacity::one());
                self.declare_slot(node, condition, Direction::Output, Role::Flow, Order::First, Capacity::one());
                self.declare_slot(node, condition, Direction::Output, Role::Flow, Order::Second, Capacity::one());
                let scope = self.create_scope(node, Some(self.node(node).expect("exists").scope()));
                self.nodes.get_mut(node).expect("exists").set_internal_scope(scope);
                let true_branch = self.create_scope(node, Some(scope));
                let false_branch = self.create_scope(node, Some(scope));
                let s = self.scopes.get_mut(scope).expect("just created");
                s.push_partition(true_branch);
                s.push_partition(false_branch);
            }
            NodeKind::ForLoop => {
                let init =
                    self.declare_property(node, "initialization", ValueType::Any, PropertyFlags::NONE);
                self.declare_slot(node, init, Direction::Input, Role::Value, Order::First, Capacity::one());
                let condition =
                    self.declare_property(node, "condition", ValueType::Bool, PropertyFlags::NONE);
                self.declare_slot(node, condition, Direction::Input, Role::Value, Order::First, Capacity::one());
                let iteration =
                    self.declare_property(node, "iteration", ValueType::Any, PropertyFlags::NONE);
                self.declare_slot(node, iteration, Direction::Input, Role::Value, Order::First, Capacity::one());
                self.declare_slot(node, condition, Direction::Output, Role::Flow, Order::First, Capacity::one());
                let scope = self.create_scope(node, Some(self.node(node).expect("exists").scope()));
                self.nodes.get_mut(node).expect("exists").set_internal_scope(scope);
                let body = self.create_scope(node, Some(scope));
                self.scopes.get_mut(scope).expect("just created").push_partition(body);
            }
            NodeKind::WhileLoop => {
                let condition =
                    self.declare_property(node, "condition", ValueType::Bool, PropertyFlags::NONE);
                self.declare_slot(node, condition, Direction::Input, Role::Value, Order::First, Capacity::one());
                self.declare_slot(node, condition, Direction::Output, Role::Flow, Order::First, Capacity::one());
                let scope = self.create_scope(node, Some(self.node(node).expect("exists").scope()));
                self.nodes.get_mut(node).expect("exists").set_internal_scope(scope);
                let body = self.create_scope(node, Some(scope));
                self.scopes.get_mut(scope).expect("just created").push_partition(body);
            }
        }
    }

    /// Declares an extra named argument property+input-slot on a
    /// `function_call` node, used once the callee's parameter list is
    /// known. Not part of the static per-kind shape because arity varies
    /// per call site. Each argument gets its own property name, so unlike
    /// the fixed two-slot shapes there is no need for an `Order` tag to
    /// break symmetry.
    pub fn declare_argument(&mut self, node: NodeId, name: impl Into<String>) -> PropertyId {
        let name: String = name.into();
        let id = self.properties.insert(Property::new(node, name.clone(), ValueType::Any, PropertyFlags::NONE));
        self.nodes.get_mut(node).expect("owner exists").declare_property(name, id);
        self.declare_slot(node, id, Direction::Input, Role::Value, Order::First, Capacity::one());
        id
    }

    // ---- mutation ------------------------------------------------------

    /// Connects `tail` to `head`. Both slots must have opposite direction
    /// and matching role, neither may be full, and they must not be the
    /// same slot. Returns `None` (a graph-invariant violation; callers are
    /// expected to have validated this beforehand) only if either slot id
    /// is stale.
    pub fn connect(&mut self, tail: SlotId, head: SlotId, flags: ConnectFlags) -> Option<EdgeId> {
        if tail == head {
            return None;
        }
        {
            let tail_slot = self.slots.get(tail)?;
            let head_slot = self.slots.get(head)?;
            assert_eq!(tail_slot.role(), head_slot.role(), "edge endpoints must share a role");
            assert_eq!(
                tail_slot.direction(),
                head_slot.direction().opposite(),
                "edge endpoints must have opposite direction"
            );
            assert!(!tail_slot.is_full(), "tail slot at capacity");
            assert!(!head_slot.is_full(), "head slot at capacity");
        }

        let edge_id = self.edges.insert(Edge::new(tail, head));
        self.slots.get_mut(tail).expect("checked above").push_adjacent(head);
        self.slots.get_mut(head).expect("checked above").push_adjacent(tail);
        self.edges_by_slot.entry(tail).or_default().push(edge_id);
        self.edges_by_slot.entry(head).or_default().push(edge_id);

        if flags.has(ConnectFlags::ALLOW_SIDE_EFFECTS) {
            self.apply_connect_side_effects(tail, head);
        }

        self.signals.emit(Signal::Change);
        Some(edge_id)
    }

    /// A variable's declaration-output slot, when connected, also makes
    /// the variable's own `value` input live — the declaration both
    /// declares and initializes.
    fn apply_connect_side_effects(&mut self, _tail: SlotId, _head: SlotId) {
        // The canonical shape already wires declaration/reference outputs
        // to share the variable's `value` property; no additional slots
        // need connecting today. Kept as an explicit hook because the
        // origin's side-effect table has room to grow (e.g. propagating a
        // literal's type onto a freshly connected consumer).
    }

    pub fn disconnect(&mut self, edge_id: EdgeId, _flags: DisconnectFlags) {
        let Some(edge) = self.edges.remove(edge_id) else { return };
        if let Some(slot) = self.slots.get_mut(edge.tail()) {
            slot.remove_adjacent(edge.head());
        }
        if let Some(slot) = self.slots.get_mut(edge.head()) {
            slot.remove_adjacent(edge.tail());
        }
        self.remove_edge_index(edge.tail(), edge_id);
        self.remove_edge_index(edge.head(), edge_id);
        self.signals.emit(Signal::Change);
    }

    fn remove_edge_index(&mut self, slot: SlotId, edge_id: EdgeId) {
        if let Some(list) = self.edges_by_slot.get_mut(&slot) {
            list.retain(|&e| e != edge_id);
        }
    }

    /// Connects `tail` to `head` unless both already carry a literal value,
    /// in which case the tail's literal is merged into the head slot's
    /// owning property instead of wiring an edge.
    pub fn connect_or_merge(&mut self, tail: SlotId, head: SlotId) -> Option<EdgeId> {
        let both_literal = self
            .slots
            .get(tail)
            .and_then(|s| self.nodes.get(s.owner()))
            .is_some_and(|n| n.kind() == NodeKind::Literal)
            && self
                .slots
                .get(head)
                .and_then(|s| self.nodes.get(s.owner()))
                .is_some_and(|n| n.kind() == NodeKind::Literal);

        if both_literal {
            let tail_owner = self.slots.get(tail)?.owner();
            let head_owner = self.slots.get(head)?.owner();
            let tail_value = self.node(tail_owner)?.property("value")?;
            let head_value = self.node(head_owner)?.property("value")?;
            if let Some(token) = self.property(tail_value).and_then(|p| p.token()).cloned() {
                self.property_mut(head_value)?.set_token(token);
            }
            self.signals.emit(Signal::Change);
            None
        } else {
            self.connect(tail, head, ConnectFlags::NONE)
        }
    }

    /// Destroys a node: disconnects every edge touching any of its slots,
    /// detaches it from its scope — freeing its declared-variable-name
    /// binding too, if it held one — (and recursively frees any internal
    /// scope it owned, including partitions), then frees its properties,
    /// slots and the node itself.
    pub fn destroy(&mut self, node_id: NodeId) {
        assert!(node_id != self.root, "the root node cannot be destroyed");
        let Some(node) = self.nodes.get(node_id) else { return };

        let slot_ids: Vec<SlotId> = node.slots().to_vec();
        for slot_id in &slot_ids {
            let edge_ids: Vec<EdgeId> =
                self.edges_by_slot.get(slot_id).cloned().unwrap_or_default();
            for edge_id in edge_ids {
                self.disconnect(edge_id, DisconnectFlags::NONE);
            }
        }

        let node = self.nodes.get(node_id).expect("still present");
        let scope_id = node.scope();
        let internal = node.internal_scope();
        let declared_name = (node.kind() == NodeKind::Variable).then(|| node.name().to_string());

        if let Some(s) = self.scopes.get_mut(scope_id) {
            s.remove_backbone(node_id);
        }
        if let Some(name) = declared_name {
            if let Some(s) = self.scopes.get_mut(scope_id) {
                if s.variable(&name) == Some(node_id) {
                    s.remove_variable(&name);
                }
            }
        }
        if let Some(internal_scope) = internal {
            self.destroy_scope_tree(internal_scope);
        }

        let property_ids: Vec<PropertyId> =
            self.nodes.get(node_id).expect("still present").properties().map(|(_, id)| id).collect();
        for id in property_ids {
            self.properties.remove(id);
        }
        for slot_id in slot_ids {
            self.slots.remove(slot_id);
            self.edges_by_slot.remove(&slot_id);
        }

        self.nodes.remove(node_id);
        trace!("destroyed node");
        self.signals.emit(Signal::RemoveNode(node_id));
    }

    /// Destroys every node owned by `scope_id` (its backbone statements
    /// and every sub-expression node they reference), recursing into each
    /// node's own internal scope through the ordinary `destroy` path, and
    /// recursing into any partition sub-scopes. Leaves `scope_id` itself
    /// alive and empty.
    fn destroy_scope_members(&mut self, scope_id: ScopeId) {
        let Some(scope) = self.scopes.get(scope_id) else { return };
        let partitions = scope.partitions().to_vec();
        let members: Vec<NodeId> =
            self.nodes.iter().filter(|(_, n)| n.scope() == scope_id).map(|(id, _)| id).collect();
        for node in members {
            if self.nodes.contains(node) {
                self.destroy(node);
            }
        }
        for partition in partitions {
            self.destroy_scope_tree(partition);
        }
    }

    /// Like [`Self::destroy_scope_members`], but also frees `scope_id`
    /// itself — used when the scope's owning node is being destroyed.
    fn destroy_scope_tree(&mut self, scope_id: ScopeId) {
        self.destroy_scope_members(scope_id);
        self.scopes.remove(scope_id);
    }

    /// Looks up `name` starting in `scope`, optionally walking parent
    /// scopes.
    #[must_use]
    pub fn find_variable(&self, name: &str, scope: ScopeId, flags: LookupFlags) -> Option<NodeId> {
        let mut current = Some(scope);
        loop {
            let scope_id = current?;
            let scope = self.scopes.get(scope_id)?;
            if let Some(node) = scope.variable(name) {
                return Some(node);
            }
            if !flags.has(LookupFlags::RECURSE_PARENT_SCOPES) {
                return None;
            }
            current = scope.parent();
        }
    }

    /// Registers `node` (expected to be a `Variable` node) as the
    /// declaration for `name` in `scope`. Returns `false` if `name` is
    /// already declared in that scope.
    #[must_use]
    pub fn declare_variable(&mut self, scope: ScopeId, name: impl Into<String>, node: NodeId) -> bool {
        self.scopes.get_mut(scope).is_some_and(|s| s.declare_variable(name, node))
    }

    /// Destroys every node except the root, restores a fresh graph's
    /// completeness state, and re-emits `Reset`.
    pub fn reset(&mut self) {
        let root_scope = self.root_scope;
        self.destroy_scope_members(root_scope);
        assert!(self.nodes.iter().count() == 1, "reset must leave only the root node");
        self.components = ComponentBag::new();
        self.signals.emit(Signal::Reset);
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        // A graph is complete when every value-role input slot that isn't
        // optional (condition/value inputs) is connected. The parser is
        // responsible for marking incompleteness explicitly via the
        // `IsComplete(false)` signal when it falls back to permissive
        // resolution; this query reflects that same contract for callers
        // who only have the graph.
        self.components.get::<bool>().copied().unwrap_or(true)
    }

    pub fn mark_complete(&mut self, complete: bool) {
        self.components.insert(complete);
        self.signals.emit(Signal::IsComplete(complete));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_scope_with_internal_scope() {
        let graph = Graph::new();
        let root = graph.node(graph.root()).unwrap();
        assert_eq!(root.kind(), NodeKind::Scope);
        assert!(root.internal_scope().is_some());
    }

    #[test]
    fn create_node_does_not_auto_attach_to_backbone() {
        let mut graph = Graph::new();
        let root_scope = graph.root_scope();
        let lit = graph.create_node(NodeKind::Literal, root_scope);
        assert!(!graph.scope(root_scope).unwrap().backbone().contains(&lit));
        assert_eq!(graph.node(lit).unwrap().scope(), root_scope);
    }

    #[test]
    fn attach_to_backbone_adds_node_to_scope_backbone() {
        let mut graph = Graph::new();
        let root_scope = graph.root_scope();
        let lit = graph.create_node(NodeKind::Literal, root_scope);
        graph.attach_to_backbone(root_scope, lit);
        assert!(graph.scope(root_scope).unwrap().backbone().contains(&lit));
    }

    #[test]
    fn connect_creates_reciprocal_adjacency() {
        let mut graph = Graph::new();
        let root_scope = graph.root_scope();
        let a = graph.create_node(NodeKind::Literal, root_scope);
        let b = graph.create_node(NodeKind::Operator, root_scope);

        let a_value = graph.node(a).unwrap().property("value").unwrap();
        let a_out = graph.node(a).unwrap().slots().iter().copied().find(|&s| {
            let slot = graph.slot(s).unwrap();
            slot.property() == a_value && slot.direction() == Direction::Output
        }).unwrap();
        let b_lvalue = graph.node(b).unwrap().property("lvalue").unwrap();
        let b_in = graph.node(b).unwrap().slots().iter().copied().find(|&s| {
            graph.slot(s).unwrap().property() == b_lvalue
        }).unwrap();

        let edge = graph.connect(a_out, b_in, ConnectFlags::NONE).unwrap();
        assert!(graph.slot(a_out).unwrap().adjacents().contains(&b_in));
        assert!(graph.slot(b_in).unwrap().adjacents().contains(&a_out));
        assert!(graph.edge(edge).is_some());
    }

    #[test]
    fn destroy_removes_node_from_backbone_and_disconnects_edges() {
        let mut graph = Graph::new();
        let root_scope = graph.root_scope();
        let a = graph.create_node(NodeKind::Literal, root_scope);
        let b = graph.create_node(NodeKind::Operator, root_scope);
        graph.attach_to_backbone(root_scope, a);
        let a_value = graph.node(a).unwrap().property("value").unwrap();
        let a_out = graph.node(a).unwrap().slots().iter().copied().find(|&s| {
            graph.slot(s).unwrap().property() == a_value && graph.slot(s).unwrap().direction() == Direction::Output
        }).unwrap();
        let b_lvalue = graph.node(b).unwrap().property("lvalue").unwrap();
        let b_in = graph.node(b).unwrap().slots().iter().copied().find(|&s| {
            graph.slot(s).unwrap().property() == b_lvalue
        }).unwrap();
        graph.connect(a_out, b_in, ConnectFlags::NONE).unwrap();

        graph.destroy(a);
        assert!(!graph.scope(root_scope).unwrap().backbone().contains(&a));
        assert!(graph.slot(b_in).is_none() || graph.slot(b_in).unwrap().adjacents().is_empty());
    }

    #[test]
    fn find_variable_recurses_into_parent_scope() {
        let mut graph = Graph::new();
        let root_scope = graph.root_scope();
        let var = graph.create_node(NodeKind::Variable, root_scope);
        graph.declare_variable(root_scope, "x", var);

        let if_node = graph.create_node(NodeKind::If, root_scope);
        let if_scope = graph.node(if_node).unwrap().internal_scope().unwrap();
        let true_branch = graph.scope(if_scope).unwrap().partitions()[0];

        assert_eq!(
            graph.find_variable("x", true_branch, LookupFlags::NONE),
            None
        );
        assert_eq!(
            graph.find_variable("x", true_branch, LookupFlags::RECURSE_PARENT_SCOPES),
            Some(var)
        );
    }

    #[test]
    fn reset_keeps_only_root() {
        let mut graph = Graph::new();
        let root_scope = graph.root_scope();
        let lit = graph.create_node(NodeKind::Literal, root_scope);
        let empty = graph.create_node(NodeKind::EmptyInstruction, root_scope);
        graph.attach_to_backbone(root_scope, lit);
        graph.attach_to_backbone(root_scope, empty);

        graph.reset();
        assert_eq!(graph.nodes().count(), 1);
        assert_eq!(graph.scope(root_scope).unwrap().backbone().len(), 0);
    }

    #[test]
    fn reset_clears_completeness_flag() {
        let mut graph = Graph::new();
        graph.mark_complete(false);
        assert!(!graph.is_complete());

        graph.reset();
        assert!(graph.is_complete());
    }

    #[test]
    fn destroy_frees_the_variable_name_for_redeclaration() {
        let mut graph = Graph::new();
        let root_scope = graph.root_scope();
        let var = graph.create_node(NodeKind::Variable, root_scope);
        assert!(graph.declare_variable(root_scope, "a", var));

        graph.destroy(var);
        let redeclared = graph.create_node(NodeKind::Variable, root_scope);
        assert!(graph.declare_variable(root_scope, "a", redeclared));
    }

    #[test]
    fn destroy_scope_members_frees_every_declared_name() {
        let mut graph = Graph::new();
        let root_scope = graph.root_scope();
        let var = graph.create_node(NodeKind::Variable, root_scope);
        graph.attach_to_backbone(root_scope, var);
        assert!(graph.declare_variable(root_scope, "a", var));

        graph.reset();
        assert!(graph.scope(root_scope).unwrap().variable("a").is_none());
        let redeclared = graph.create_node(NodeKind::Variable, root_scope);
        assert!(graph.declare_variable(root_scope, "a", redeclared));
    }
}
