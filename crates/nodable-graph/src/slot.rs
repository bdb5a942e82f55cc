//! Slot — a directed, typed connection point on a node.

use crate::flags::{Capacity, Direction, Order, Role};
use crate::ids::{NodeId, PropertyId, SlotId};

pub struct Slot {
    owner: NodeId,
    property: PropertyId,
    direction: Direction,
    role: Role,
    order: Order,
    capacity: Capacity,
    /// Adjacent slots, in connection order. A weak reference in spirit —
    /// the arena, not this list, owns the adjacent slot.
    adjacents: Vec<SlotId>,
}

impl Slot {
    pub(crate) fn new(
        owner: NodeId,
        property: PropertyId,
        direction: Direction,
        role: Role,
        order: Order,
        capacity: Capacity,
    ) -> Self {
        Self { owner, property, direction, role, order, capacity, adjacents: Vec::new() }
    }

    #[must_use]
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    #[must_use]
    pub fn property(&self) -> PropertyId {
        self.property
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn order(&self) -> Order {
        self.order
    }

    #[must_use]
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    #[must_use]
    pub fn adjacents(&self) -> &[SlotId] {
        &self.adjacents
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        !self.capacity.allows(self.adjacents.len())
    }

    #[must_use]
    pub fn first_adjacent(&self) -> Option<SlotId> {
        self.adjacents.first().copied()
    }

    pub(crate) fn push_adjacent(&mut self, other: SlotId) {
        self.adjacents.push(other);
    }

    pub(crate) fn remove_adjacent(&mut self, other: SlotId) {
        self.adjacents.retain(|&s| s != other);
    }
}
