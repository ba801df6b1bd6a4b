use std::collections::BTreeMap;

use crate::aggregate::AggregateRef;

/// Snapshot of one lane's pending registrations, handed to the store.
///
/// Each category is ordered by aggregate id.
#[derive(Clone, Default)]
pub struct ChangeSet {
    pub(crate) created: BTreeMap<String, AggregateRef>,
    pub(crate) modified: BTreeMap<String, AggregateRef>,
    pub(crate) deleted: BTreeMap<String, AggregateRef>,
}

impl ChangeSet {
    pub fn created(&self) -> impl Iterator<Item = (&str, &AggregateRef)> {
        self.created.iter().map(|(id, aggregate)| (id.as_str(), aggregate))
    }

    pub fn modified(&self) -> impl Iterator<Item = (&str, &AggregateRef)> {
        self.modified.iter().map(|(id, aggregate)| (id.as_str(), aggregate))
    }

    pub fn deleted(&self) -> impl Iterator<Item = (&str, &AggregateRef)> {
        self.deleted.iter().map(|(id, aggregate)| (id.as_str(), aggregate))
    }

    /// Every aggregate, new first, then modified, then deleted.
    pub fn all(&self) -> impl Iterator<Item = (&str, &AggregateRef)> {
        self.created().chain(self.modified()).chain(self.deleted())
    }

    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    pub fn len(&self) -> usize {
        self.created.len() + self.modified.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
