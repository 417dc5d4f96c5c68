//! Name-keyed merge of two catalogs followed by a full renumbering.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ModelError, ModelResult};
use crate::store::{EntityStore, HasName, Indexed};

use super::sort_key::MergeOrder;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Drop existing entries absent from the import unless protected
    pub remove_missing: bool,
    /// Original indices that survive `remove_missing`
    pub protected: BTreeSet<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome<T> {
    /// Sorted and renumbered 1..N
    pub merged: EntityStore<T>,
    /// Old existing index -> new index, for every surviving existing entry
    pub reorder_map: BTreeMap<u32, u32>,
    /// Old imported index -> new index
    pub imported_map: BTreeMap<u32, u32>,
    pub removed_any: bool,
}

fn index_by_name<'a, T>(store: &'a EntityStore<T>) -> ModelResult<HashMap<&'a str, &'a T>>
where
    T: Indexed + HasName,
{
    let mut by_name = HashMap::with_capacity(store.len());
    for item in store {
        if by_name.insert(item.name(), item).is_some() {
            return Err(ModelError::merge_conflict(T::KIND, item.name()));
        }
    }
    Ok(by_name)
}

/// Merge `imported` into `existing` by name.
///
/// Existing entries found in the import take the imported attributes; new
/// imported entries are appended. The union is sorted by [`MergeOrder`] and
/// renumbered from 1. Inputs are not modified.
pub fn merge_and_reorder<T>(
    existing: &EntityStore<T>,
    imported: &EntityStore<T>,
    options: &MergeOptions,
) -> ModelResult<MergeOutcome<T>>
where
    T: Indexed + HasName + MergeOrder + Clone,
{
    let existing_by_name = index_by_name(existing)?;
    let imported_by_name = index_by_name(imported)?;

    // (original existing index, original imported index, entry)
    let mut merged: Vec<(Option<u32>, Option<u32>, T)> = Vec::with_capacity(existing.len() + imported.len());

    for item in existing {
        let old_index = item.index();
        match imported_by_name.get(item.name()) {
            Some(&incoming) => {
                let mut updated = incoming.clone();
                updated.set_index(old_index);
                merged.push((Some(old_index), Some(incoming.index()), updated));
            }
            None if !options.remove_missing || options.protected.contains(&old_index) => {
                merged.push((Some(old_index), None, item.clone()));
            }
            None => debug!(kind = T::KIND, name = item.name(), index = old_index, "dropping entry missing from import"),
        }
    }

    for item in imported {
        if !existing_by_name.contains_key(item.name()) {
            merged.push((None, Some(item.index()), item.clone()));
        }
    }

    merged.sort_by_cached_key(|(_, _, item)| item.sort_key());

    let mut reorder_map = BTreeMap::new();
    let mut imported_map = BTreeMap::new();
    let mut items = Vec::with_capacity(merged.len());
    for (position, (old_existing, old_imported, mut item)) in merged.into_iter().enumerate() {
        let new_index = position as u32 + 1;
        if let Some(old) = old_existing {
            reorder_map.insert(old, new_index);
        }
        if let Some(old) = old_imported {
            imported_map.insert(old, new_index);
        }
        item.set_index(new_index);
        items.push(item);
    }

    let removed_any = reorder_map.len() != existing.len();
    debug!(kind = T::KIND, merged = items.len(), removed_any, "merged catalog");
    Ok(MergeOutcome {
        merged: EntityStore::from_items(items)?,
        reorder_map,
        imported_map,
        removed_any,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Material, MaterialKind, SpringMaterial};

    fn spring(index: u32, name: &str, stiffness: f64) -> Material {
        Material {
            index,
            type_index: 2,
            name: name.to_string(),
            misc1: [0; 4],
            misc2: 0,
            kind: MaterialKind::Spring(SpringMaterial {
                stiffness,
                min: 0.0,
                max: 0.0,
            }),
        }
    }

    fn stiffness(m: &Material) -> f64 {
        match &m.kind {
            MaterialKind::Spring(s) => s.stiffness,
            MaterialKind::Isotropic(_) => f64::NAN,
        }
    }

    #[test]
    fn test_overwrite_and_append() {
        let existing = EntityStore::from_items(vec![spring(1, "A", 0.0), spring(2, "B", 1.0)]).unwrap();
        let imported = EntityStore::from_items(vec![spring(1, "B", 9.0), spring(2, "C", 0.0)]).unwrap();

        let outcome = merge_and_reorder(&existing, &imported, &MergeOptions::default()).unwrap();
        let merged: Vec<(u32, &str, f64)> =
            outcome.merged.iter().map(|m| (m.index, m.name.as_str(), stiffness(m))).collect();
        assert_eq!(merged, vec![(1, "A", 0.0), (2, "B", 9.0), (3, "C", 0.0)]);
        assert_eq!(outcome.reorder_map, BTreeMap::from([(1, 1), (2, 2)]));
        assert_eq!(outcome.imported_map, BTreeMap::from([(1, 2), (2, 3)]));
        assert!(!outcome.removed_any);

        // inputs untouched
        assert_eq!(stiffness(existing.get(2).unwrap()), 1.0);
    }

    #[test]
    fn test_sorted_by_merge_order() {
        let existing = EntityStore::from_items(vec![spring(1, "zeta", 0.0), spring(2, "Alpha", 0.0)]).unwrap();
        let outcome = merge_and_reorder(&existing, &EntityStore::new(), &MergeOptions::default()).unwrap();
        assert_eq!(outcome.merged.get(1).unwrap().name, "Alpha");
        assert_eq!(outcome.reorder_map, BTreeMap::from([(1, 2), (2, 1)]));
    }

    #[test]
    fn test_protected_entry_survives_removal() {
        let existing = EntityStore::from_items(vec![spring(1, "A", 0.0), spring(2, "B", 0.0)]).unwrap();
        let imported = EntityStore::from_items(vec![spring(1, "C", 0.0)]).unwrap();
        let options = MergeOptions {
            remove_missing: true,
            protected: BTreeSet::from([1]),
        };

        let outcome = merge_and_reorder(&existing, &imported, &options).unwrap();
        let names: Vec<&str> = outcome.merged.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert!(outcome.removed_any);
        assert!(!outcome.reorder_map.contains_key(&2));
    }

    #[test]
    fn test_duplicate_name_is_conflict() {
        let existing = EntityStore::from_items(vec![spring(1, "A", 0.0), spring(2, "A", 1.0)]).unwrap();
        let err = merge_and_reorder(&existing, &EntityStore::new(), &MergeOptions::default()).unwrap_err();
        assert_eq!(err, ModelError::merge_conflict("Material", "A"));
    }
}
