//! # Entities
//!
//! Typed records of the structural model. Every entity has an integer
//! `index` unique in its store; cross-references are typed handles from
//! [`crate::ids`], resolved through the store of the target kind.
//!
//! | Entity | References |
//! |---|---|
//! | [`Node`] | - |
//! | [`Material`], [`Section`], [`Design`] | - |
//! | [`Elset`] | material, section, design |
//! | [`Beam`] | start node, end node, elset |
//! | [`Column`] | location node, elset |
//! | [`Slab`] | elset |
//! | [`Region`] | slab, four edge nodes |
//! | [`FrameLoadTable`] | - |
//! | [`BeamLoad`] | load table, beam by floor-local index |

pub mod design;
pub mod elset;
pub mod frame;
pub mod layout;
pub mod load;
pub mod material;
pub mod node;
pub mod section;
pub mod slab;

use std::collections::BTreeSet;

pub use design::{ConcreteShape, Design, DesignFactors, DesignKind, ReinforcedConcrete, SteelFrame};
pub use elset::Elset;
pub use frame::{Beam, Column};
pub use layout::{BeamLayouts, ColumnLayouts, Layout, LayoutItem, Layouts};
pub use load::{BeamLoad, FrameLoadTable, LoadDirection};
pub use material::{IsotropicMaterial, Material, MaterialKind, SpringMaterial};
pub use node::Node;
pub use section::{Section, SectionMisc, SectionShape};
pub use slab::{Region, Slab};

use crate::ids::ElsetRef;
use crate::store::{EntityStore, HasElsetRef};

/// Every elset referenced by a layout item or a slab.
///
/// This is the protected set for an elset merge: used elsets must survive
/// even when `remove_missing` is on.
pub fn used_elsets(
    beams: &BeamLayouts,
    columns: &ColumnLayouts,
    slabs: &EntityStore<Slab>,
) -> BTreeSet<ElsetRef> {
    let mut used = BTreeSet::new();
    for layout in beams {
        used.extend(layout.items.iter().map(HasElsetRef::elset));
    }
    for layout in columns {
        used.extend(layout.items.iter().map(HasElsetRef::elset));
    }
    used.extend(slabs.iter().map(HasElsetRef::elset));
    used
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NodeRef;

    #[test]
    fn test_used_elsets_spans_layouts_and_slabs() {
        let beam = Beam {
            index: 1,
            start: NodeRef(1),
            end: NodeRef(2),
            elset: ElsetRef(3),
            group: 0,
            beam_type: 0,
            misc: String::new(),
        };
        let column = Column {
            index: 1,
            location: NodeRef(1),
            elset: ElsetRef(5),
            group: 0,
            alpha: 0,
            misc: String::new(),
        };
        let slab = Slab {
            index: 1,
            name: "S12".to_string(),
            slab_type: 1,
            elset: ElsetRef(1),
            thick: 12.0,
            q_dl: 0.0,
            q_ll: 0.0,
            weight: 0.0,
            cost: 0.0,
        };

        let mut beams = BeamLayouts::new();
        beams.add(Layout::with_items(1, vec![beam]).unwrap()).unwrap();
        let mut columns = ColumnLayouts::new();
        columns.add(Layout::with_items(1, vec![column]).unwrap()).unwrap();
        let slabs = EntityStore::from_items(vec![slab]).unwrap();

        let used: Vec<u32> = used_elsets(&beams, &columns, &slabs).into_iter().map(|e| e.0).collect();
        assert_eq!(used, vec![1, 3, 5]);
    }
}
