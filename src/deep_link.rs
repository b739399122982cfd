//! Resolve "open at record N" requests into a progress fraction.

use crate::collection::{Collection, DeepLinkTarget};
use tracing::debug;

/// Fraction for the first record whose ordinal matches `target`.
///
/// Returns `None` when the target names another collection, when the
/// collection is empty, or when no record carries the ordinal. Targets past
/// the end are not clamped; the caller falls back to the persisted position.
pub fn resolve(target: &DeepLinkTarget, collection: &Collection) -> Option<f64> {
    if &target.collection != collection.key() {
        debug!(
            requested = %target.collection,
            loaded = %collection.key(),
            "Deep link targets a different collection"
        );
        return None;
    }
    resolve_ordinal(target.ordinal, collection)
}

pub fn resolve_ordinal(ordinal: u32, collection: &Collection) -> Option<f64> {
    let count = collection.len();
    if count == 0 {
        return None;
    }
    match collection.position_of(ordinal) {
        Some(index) => Some(index as f64 / count as f64),
        None => {
            debug!(ordinal, count, "Deep link ordinal not present in collection");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionKey, numbered};

    #[test]
    fn ordinal_76_of_150_resolves_to_half() {
        let collection = numbered("Génesis/1", 150);
        let target = DeepLinkTarget::new(CollectionKey::new("Génesis/1"), 76);
        assert_eq!(resolve(&target, &collection), Some(0.5));
    }

    #[test]
    fn first_ordinal_resolves_to_zero() {
        let collection = numbered("Juan/3", 36);
        assert_eq!(resolve_ordinal(1, &collection), Some(0.0));
    }

    #[test]
    fn out_of_range_ordinals_are_absent_not_clamped() {
        let collection = numbered("Juan/3", 36);
        assert_eq!(resolve_ordinal(0, &collection), None);
        assert_eq!(resolve_ordinal(37, &collection), None);
        assert_eq!(resolve_ordinal(u32::MAX, &collection), None);
    }

    #[test]
    fn other_collection_key_is_absent() {
        let collection = numbered("Juan/3", 36);
        let target = DeepLinkTarget::new(CollectionKey::new("Juan/4"), 2);
        assert_eq!(resolve(&target, &collection), None);
    }

    #[test]
    fn empty_collection_is_absent() {
        let collection = numbered("vacío", 0);
        assert_eq!(resolve_ordinal(1, &collection), None);
    }
}
