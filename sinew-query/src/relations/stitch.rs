//! Writing loaded children back into their parents' slots.

use tracing::trace;

use crate::key::RecordKey;

use super::link::Slot;
use super::loader::KeyedChildren;

/// Assign each parent the children grouped under its key.
///
/// `keys` is aligned with `parents`. Every parent's slot is overwritten:
/// unmatched parents (including those with a zero key) receive the empty
/// value of the slot, so running the same step twice gives the same result.
/// Returns the number of parents that received at least one child.
pub fn attach<P, C: Clone>(
    parents: &mut [&mut P],
    keys: &[Option<RecordKey>],
    slot: &Slot<P, C>,
    children: &KeyedChildren<C>,
) -> usize {
    let mut matched = 0;

    for (parent, key) in parents.iter_mut().zip(keys) {
        let parent: &mut P = parent;
        let found = key
            .as_ref()
            .and_then(|k| children.get(k))
            .filter(|records| !records.is_empty());
        if found.is_some() {
            matched += 1;
        }

        match slot {
            Slot::One(field) => {
                *field(parent) = found.and_then(|r| r.first()).cloned();
            }
            Slot::OneBoxed(field) => {
                *field(parent) = found.and_then(|r| r.first()).cloned().map(Box::new);
            }
            Slot::Embedded(field, empty) => {
                *field(parent) = match found.and_then(|r| r.first()) {
                    Some(child) => child.clone(),
                    None => empty(),
                };
            }
            Slot::Many(field) => {
                *field(parent) = found.cloned().unwrap_or_default();
            }
            Slot::ManyBoxed(field) => {
                *field(parent) = found
                    .map(|r| r.iter().cloned().map(Box::new).collect())
                    .unwrap_or_default();
            }
        }
    }

    trace!(parents = parents.len(), matched, slot = ?slot, "Stitched children");
    matched
}
