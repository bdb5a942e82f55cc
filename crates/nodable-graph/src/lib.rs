//! The graph data model: nodes, properties, slots and scopes, addressed
//! through generation-checked handles so the graph can be mutated freely
//! without risking dangling references.

mod arena;
mod components;
mod edge;
mod flags;
mod graph;
mod ids;
mod node;
mod property;
mod scope;
mod signal;
mod slot;

pub use arena::{Arena, Id};
pub use components::ComponentBag;
pub use edge::Edge;
pub use flags::{
    Capacity, ConnectFlags, Direction, DisconnectFlags, LookupFlags, Order, PropertyFlags, Role,
};
pub use graph::Graph;
pub use ids::{EdgeId, NodeId, PropertyId, ScopeId, SlotId};
pub use node::{
    Node, NodeKind, THIS_PROPERTY_NAME, TOKEN_ASSIGN, TOKEN_ELSE, TOKEN_IDENTIFIER, TOKEN_KEYWORD,
    TOKEN_OPERATOR, TOKEN_TYPE,
};
pub use property::Property;
pub use scope::Scope;
pub use signal::{Signal, SignalBus};
pub use slot::Slot;
