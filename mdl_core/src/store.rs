//! # Entity Store
//!
//! An ordered arena of entities keyed by their integer index. Iteration
//! follows insertion order; [`EntityStore::index_list`] gives the sorted
//! indices. Lookup by index is O(1).
//!
//! The capability traits at the bottom of this module are how generic code
//! asks an entity for its index, its merge key, or its elset reference.
//!
//! ```rust
//! use mdl_core::entities::Node;
//! use mdl_core::store::EntityStore;
//!
//! let mut nodes = EntityStore::new();
//! nodes.add(Node::new(2, 0.0, 0.0, 0.0)).unwrap();
//! nodes.add(Node::new(1, 5.0, 0.0, 0.0)).unwrap();
//! assert_eq!(nodes.index_list(), vec![1, 2]);
//! assert!(nodes.add(Node::new(1, 9.0, 9.0, 9.0)).is_err());
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{ModelError, ModelResult};
use crate::ids::ElsetRef;

/// Ordered collection of entities with unique indices.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityStore<T> {
    items: Vec<T>,
    positions: HashMap<u32, usize>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        EntityStore {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T: Indexed> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from items, failing on the first duplicate index.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> ModelResult<Self> {
        let mut store = Self::new();
        store.extend(items)?;
        Ok(store)
    }

    /// Append an entity. Its index must not already be present.
    pub fn add(&mut self, item: T) -> ModelResult<()> {
        let index = item.index();
        if self.positions.contains_key(&index) {
            return Err(ModelError::duplicate_index(T::KIND, index));
        }
        self.positions.insert(index, self.items.len());
        self.items.push(item);
        Ok(())
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) -> ModelResult<()> {
        for item in items {
            self.add(item)?;
        }
        Ok(())
    }

    /// Remove and return the entity with `index`, keeping the order of the rest.
    pub fn remove(&mut self, index: u32) -> Option<T> {
        let position = self.positions.remove(&index)?;
        let item = self.items.remove(position);
        for slot in self.positions.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(item)
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.positions.get(&index).map(|&p| &self.items[p])
    }

    /// Mutable access by index. The index itself must not be changed
    /// through the returned reference.
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        let position = *self.positions.get(&index)?;
        self.items.get_mut(position)
    }

    pub fn contains(&self, index: u32) -> bool {
        self.positions.contains_key(&index)
    }

    /// Indices in ascending order.
    pub fn index_list(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = self.positions.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Largest index in the store, 0 when empty.
    pub fn max_index(&self) -> u32 {
        self.positions.keys().copied().max().unwrap_or(0)
    }

    /// Entities ordered by index.
    pub fn sorted(&self) -> Vec<&T> {
        let mut refs: Vec<&T> = self.items.iter().collect();
        refs.sort_by_key(|item| item.index());
        refs
    }

    /// A fresh store numbered 1..N in insertion order, plus the old -> new map.
    pub fn reindexed(&self) -> (Self, BTreeMap<u32, u32>)
    where
        T: Clone,
    {
        let mut map = BTreeMap::new();
        let mut store = Self::new();
        for (position, item) in self.items.iter().enumerate() {
            let new_index = position as u32 + 1;
            map.insert(item.index(), new_index);
            let mut copy = item.clone();
            copy.set_index(new_index);
            store.positions.insert(new_index, position);
            store.items.push(copy);
        }
        (store, map)
    }
}

impl<T> EntityStore<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entities in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<'a, T> IntoIterator for &'a EntityStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for EntityStore<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Indexed + Deserialize<'de>> Deserialize<'de> for EntityStore<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        EntityStore::from_items(items).map_err(D::Error::custom)
    }
}

// ============================================================================
// Capability traits
// ============================================================================

/// An entity with a unique integer index inside its store.
pub trait Indexed {
    /// Entity kind used in diagnostics
    const KIND: &'static str;

    fn index(&self) -> u32;
    fn set_index(&mut self, index: u32);
}

/// An entity identified across models by its name.
pub trait HasName {
    fn name(&self) -> &str;
}

/// An entity bound to an elset (layout items and slabs).
pub trait HasElsetRef {
    fn elset(&self) -> ElsetRef;
    fn set_elset(&mut self, elset: ElsetRef);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Node;

    fn node(i: u32) -> Node {
        Node::new(i, i as f64, 0.0, 0.0)
    }

    #[test]
    fn test_add_rejects_duplicate_index() {
        let mut store = EntityStore::new();
        store.add(node(1)).unwrap();
        let err = store.add(node(1)).unwrap_err();
        assert_eq!(err, ModelError::duplicate_index("Node", 1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insertion_order_and_sorted_indices() {
        let store = EntityStore::from_items(vec![node(3), node(1), node(2)]).unwrap();
        let order: Vec<u32> = store.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![3, 1, 2]);
        assert_eq!(store.index_list(), vec![1, 2, 3]);
        assert_eq!(store.max_index(), 3);
    }

    #[test]
    fn test_remove_keeps_lookup_consistent() {
        let mut store = EntityStore::from_items(vec![node(5), node(6), node(7)]).unwrap();
        let removed = store.remove(5).unwrap();
        assert_eq!(removed.index, 5);
        assert!(store.remove(5).is_none());
        assert_eq!(store.get(7).unwrap().x, 7.0);
        assert_eq!(store.get(6).unwrap().x, 6.0);
    }

    #[test]
    fn test_reindexed_is_one_based_in_insertion_order() {
        let store = EntityStore::from_items(vec![node(10), node(4)]).unwrap();
        let (fresh, map) = store.reindexed();
        assert_eq!(fresh.index_list(), vec![1, 2]);
        assert_eq!(fresh.get(1).unwrap().x, 10.0);
        assert_eq!(map.get(&4), Some(&2));
        // source untouched
        assert_eq!(store.index_list(), vec![4, 10]);
    }

    #[test]
    fn test_serde_as_plain_list() {
        let store = EntityStore::from_items(vec![node(1), node(2)]).unwrap();
        let json = serde_json::to_string(&store).unwrap();
        assert!(json.starts_with('['));
        let back: EntityStore<Node> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);

        let dup = format!("[{},{}]", serde_json::to_string(&node(1)).unwrap(), serde_json::to_string(&node(1)).unwrap());
        assert!(serde_json::from_str::<EntityStore<Node>>(&dup).is_err());
    }
}
