//! Bounded newest-first collections.
//!
//! [`RetainedFeed`] keeps at most `capacity` records, newest at the front.
//! New records are prepended and the oldest are evicted from the back.
//! Records that carry an [`EntityId`] can be upserted: an id already present
//! is replaced in place without moving, an unseen id is prepended.

use std::collections::VecDeque;

use crate::domain::{Detection, EntityId, Event, Incident};

/// Records that may carry an upstream identity.
pub trait Identified {
    /// The record's id, if it has one.
    fn entity_id(&self) -> Option<&EntityId>;
}

impl Identified for Event {
    fn entity_id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

impl Identified for Incident {
    fn entity_id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

impl Identified for Detection {
    fn entity_id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

/// Result of [`RetainedFeed::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// An existing record at this index was replaced in place.
    Replaced(usize),
    /// The record was new and has been prepended.
    Inserted,
}

/// Newest-first collection with a fixed retention bound.
#[derive(Debug, Clone)]
pub struct RetainedFeed<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RetainedFeed<T> {
    /// Creates an empty feed retaining at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Prepends a record, evicting the oldest ones beyond capacity.
    ///
    /// Returns how many records were evicted.
    pub fn push_front(&mut self, item: T) -> usize {
        self.items.push_front(item);
        let before = self.items.len();
        self.items.truncate(self.capacity);
        before - self.items.len()
    }

    /// Replaces the whole feed with `items`, given newest first, keeping
    /// only the first `capacity` of them.
    pub fn replace_all(&mut self, items: impl IntoIterator<Item = T>) {
        self.items = items.into_iter().take(self.capacity).collect();
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> {
        self.items.iter()
    }

    /// Record at `index` (0 = newest).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Identified> RetainedFeed<T> {
    /// Index of the record with `id`.
    #[must_use]
    pub fn position(&self, id: &EntityId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.entity_id() == Some(id))
    }

    /// Replaces the record sharing `item`'s id in place, or prepends `item`
    /// when its id is absent or unknown.
    pub fn upsert(&mut self, item: T) -> Upsert {
        let existing = item.entity_id().and_then(|id| self.position(id));
        if let Some(index) = existing
            && let Some(slot) = self.items.get_mut(index)
        {
            *slot = item;
            return Upsert::Replaced(index);
        }
        self.push_front(item);
        Upsert::Inserted
    }
}

impl<T> Default for RetainedFeed<T> {
    fn default() -> Self {
        Self::new(0)
    }
}
