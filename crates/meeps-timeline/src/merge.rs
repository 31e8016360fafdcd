//! Seen-id merging for polled lists.
//!
//! `merge_unseen` is the single place where freshly fetched items meet the
//! list already on screen: unseen items are prepended in their incoming
//! order, already-displayed ones are dropped, and the result is capped.
//! Merging the same batch twice yields the same list. `prepend_older` is
//! the history-page variant, which keeps items that carry no id.

use std::collections::HashSet;
use std::hash::Hash;

use meeps_types::{Message, StableId};

/// Anything with a stable identity across polls.
pub trait Identified {
    type Id: Eq + Hash + Clone;

    fn stable_id(&self) -> Option<&Self::Id>;
}

impl Identified for Message {
    type Id = StableId;

    fn stable_id(&self) -> Option<&StableId> {
        self.id.as_ref()
    }
}

/// Items of `incoming` whose id is not in `existing`, in incoming order.
/// Items without an id cannot be tracked and are skipped, as are
/// duplicates within `incoming` itself.
pub fn fresh_items<'a, T: Identified>(incoming: &'a [T], existing: &[T]) -> Vec<&'a T> {
    let mut seen: HashSet<&T::Id> = existing.iter().filter_map(Identified::stable_id).collect();
    incoming
        .iter()
        .filter(|item| match item.stable_id() {
            Some(id) => seen.insert(id),
            None => false,
        })
        .collect()
}

/// Prepend the unseen items of `incoming` to `existing` and cap the result
/// at `cap` items (the oldest entries fall off the end).
pub fn merge_unseen<T: Identified + Clone>(incoming: &[T], existing: &[T], cap: usize) -> Vec<T> {
    let fresh = fresh_items(incoming, existing);
    fresh
        .into_iter()
        .cloned()
        .chain(existing.iter().cloned())
        .take(cap)
        .collect()
}

/// Splice an older page in front of `existing`. Items already shown are
/// dropped; items without an id cannot be matched and are kept.
pub fn prepend_older<T: Identified + Clone>(older: &[T], existing: &[T]) -> Vec<T> {
    let mut seen: HashSet<&T::Id> = existing.iter().filter_map(Identified::stable_id).collect();
    older
        .iter()
        .filter(|item| item.stable_id().is_none_or(|id| seen.insert(id)))
        .chain(existing)
        .cloned()
        .collect()
}
