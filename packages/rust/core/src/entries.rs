//! Skeleton entry resolution.

use skeletonize_shared::{DEFAULT_ENTRY_NAME, EntryMap, EntryValue, Result, SkeletonError};

/// Derive the skeleton entry map.
///
/// - A mapping `primary` is taken as-is (order preserved).
/// - A bare `primary` becomes a single entry named after the first key of
///   the host's `parent` entry mapping, or `"main"` when the parent is not a
///   mapping.
///
/// Fails only when `primary` is absent or an empty mapping.
pub fn resolve_entries(primary: Option<&EntryValue>, parent: Option<&EntryValue>) -> Result<EntryMap> {
    let primary =
        primary.ok_or_else(|| SkeletonError::config("skeleton build config has no entry"))?;

    match primary {
        EntryValue::Map(map) if map.is_empty() => {
            Err(SkeletonError::config("skeleton entry mapping is empty"))
        }
        EntryValue::Map(map) => Ok(map.clone()),
        EntryValue::Spec(spec) => {
            let name = parent
                .and_then(EntryValue::as_map)
                .and_then(EntryMap::first_key)
                .unwrap_or(DEFAULT_ENTRY_NAME);

            let mut map = EntryMap::new();
            map.insert(name, spec.clone());
            Ok(map)
        }
    }
}
