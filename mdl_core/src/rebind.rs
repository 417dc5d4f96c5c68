//! # Layout Rebinding
//!
//! After an elset merge every beam, column and slab still names its old
//! elset index. [`LayoutRebinder`] moves them onto the merged elsets through
//! the merge's reorder map. A reference the map does not cover is fatal.
//! Regions reference slabs, which keep their indices, so they are not
//! touched.

use std::collections::BTreeMap;

use tracing::debug;

use crate::entities::{Elset, Layout, LayoutItem, Layouts, Slab};
use crate::errors::{ModelError, ModelResult};
use crate::ids::ElsetRef;
use crate::store::{EntityStore, HasElsetRef, Indexed};

#[derive(Debug, Clone, Copy)]
pub struct LayoutRebinder<'a> {
    reorder_map: &'a BTreeMap<u32, u32>,
    elsets: &'a EntityStore<Elset>,
}

impl<'a> LayoutRebinder<'a> {
    /// `reorder_map` maps old elset indices to indices in `elsets`.
    pub fn new(reorder_map: &'a BTreeMap<u32, u32>, elsets: &'a EntityStore<Elset>) -> Self {
        LayoutRebinder { reorder_map, elsets }
    }

    fn rebind<T: Indexed + HasElsetRef + Clone>(&self, item: &T) -> ModelResult<T> {
        let old = item.elset().get();
        let missing = |target_index| ModelError::missing_reference(T::KIND, item.index(), "elset", Elset::KIND, target_index);

        let &new = self.reorder_map.get(&old).ok_or_else(|| missing(old))?;
        if !self.elsets.contains(new) {
            return Err(missing(new));
        }
        let mut rebound = item.clone();
        rebound.set_elset(ElsetRef(new));
        Ok(rebound)
    }

    fn rebind_all<T: Indexed + HasElsetRef + Clone>(&self, items: &EntityStore<T>) -> ModelResult<EntityStore<T>> {
        let rebound = items.iter().map(|item| self.rebind(item)).collect::<ModelResult<Vec<T>>>()?;
        EntityStore::from_items(rebound)
    }

    pub fn rebind_layouts<T: LayoutItem>(&self, layouts: &Layouts<T>) -> ModelResult<Layouts<T>> {
        let mut result = Layouts::new();
        for layout in layouts {
            result.add(Layout {
                floor: layout.floor,
                items: self.rebind_all(&layout.items)?,
            })?;
        }
        debug!(kind = T::LAYOUT_KIND, floors = result.len(), "rebound layouts");
        Ok(result)
    }

    pub fn rebind_slabs(&self, slabs: &EntityStore<Slab>) -> ModelResult<EntityStore<Slab>> {
        self.rebind_all(slabs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Beam, BeamLayouts};
    use crate::ids::{DesignRef, MaterialRef, NodeRef, SectionRef};

    fn elsets(indices: &[u32]) -> EntityStore<Elset> {
        EntityStore::from_items(indices.iter().map(|&i| Elset {
            index: i,
            material: MaterialRef(1),
            section: SectionRef(i),
            design: DesignRef(i),
            texture: 0,
        }))
        .unwrap()
    }

    fn beams(elset: u32) -> BeamLayouts {
        let beam = Beam {
            index: 1,
            start: NodeRef(1),
            end: NodeRef(2),
            elset: ElsetRef(elset),
            group: 0,
            beam_type: 1,
            misc: String::new(),
        };
        let mut layouts = BeamLayouts::new();
        layouts.add(Layout::with_items(1, vec![beam]).unwrap()).unwrap();
        layouts
    }

    #[test]
    fn test_rebind_follows_map() {
        let map = BTreeMap::from([(5, 2)]);
        let merged = elsets(&[1, 2]);
        let rebound = LayoutRebinder::new(&map, &merged).rebind_layouts(&beams(5)).unwrap();
        assert_eq!(rebound.get(1).unwrap().get_item(1).unwrap().elset, ElsetRef(2));
    }

    #[test]
    fn test_unmapped_elset_is_fatal() {
        let map = BTreeMap::from([(4, 1)]);
        let merged = elsets(&[1]);
        let err = LayoutRebinder::new(&map, &merged).rebind_layouts(&beams(5)).unwrap_err();
        assert_eq!(err, ModelError::missing_reference("Beam", 1, "elset", "Elset", 5));
    }

    #[test]
    fn test_mapped_to_absent_elset_is_fatal() {
        let map = BTreeMap::from([(5, 9)]);
        let merged = elsets(&[1]);
        let err = LayoutRebinder::new(&map, &merged).rebind_layouts(&beams(5)).unwrap_err();
        assert_eq!(err, ModelError::missing_reference("Beam", 1, "elset", "Elset", 9));
    }
}
