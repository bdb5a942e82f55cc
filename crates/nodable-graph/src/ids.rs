//! Stable, generation-checked handles into the graph's arenas.

use crate::arena::Id;
use crate::edge::Edge;
use crate::node::Node;
use crate::property::Property;
use crate::scope::Scope;
use crate::slot::Slot;

pub type NodeId = Id<Node>;
pub type ScopeId = Id<Scope>;
pub type SlotId = Id<Slot>;
pub type PropertyId = Id<Property>;
pub type EdgeId = Id<Edge>;
