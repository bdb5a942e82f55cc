//! A small type-keyed bag for attaching host-defined data to the graph
//! itself (not to individual nodes) — mirrors the origin's component
//! system, reduced to the one use this port needs: letting callers (the
//! compiler, the CLI) stash auxiliary state alongside a graph without the
//! graph crate needing to know its shape.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct ComponentBag {
    entries: FxHashMap<TypeId, Box<dyn Any>>,
}

impl ComponentBag {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: FxHashMap::default() }
    }

    pub fn insert<T: Any>(&mut self, value: T) {
        self.entries.insert(TypeId::of::<T>(), Box::new(value));
    }

    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.entries.get(&TypeId::of::<T>()).and_then(|b| b.downcast_ref())
    }

    #[must_use]
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.entries.get_mut(&TypeId::of::<T>()).and_then(|b| b.downcast_mut())
    }

    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.entries.remove(&TypeId::of::<T>()).and_then(|b| b.downcast().ok()).map(|b| *b)
    }

    #[must_use]
    pub fn contains<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }
}
