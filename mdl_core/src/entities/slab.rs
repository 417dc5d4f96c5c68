//! Slabs (`FLOORSLAB`) and the quadrilateral floor regions (`REGION`) that
//! place them.

use serde::{Deserialize, Serialize};

use crate::ids::{ElsetRef, NodeRef, SlabRef};
use crate::store::{HasElsetRef, HasName, Indexed};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    pub index: u32,
    pub name: String,
    pub slab_type: i64,
    pub elset: ElsetRef,
    pub thick: f64,
    pub q_dl: f64,
    pub q_ll: f64,
    pub weight: f64,
    pub cost: f64,
}

/// A slab panel on one floor bounded by four nodes.
///
/// `edges` is kept in canonical order (counter-clockwise, starting at the
/// lexicographically smallest corner) whenever the engine builds a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub index: u32,
    pub floor: u32,
    pub slab: SlabRef,
    pub option: i64,
    pub q_dl_add: f64,
    pub q_ll_add: f64,
    pub edges: [NodeRef; 4],
    pub offset: i64,
    pub misc: String,
}

impl Region {
    /// Edge nodes as a sorted set, used for duplicate detection.
    pub fn node_set(&self) -> [NodeRef; 4] {
        let mut set = self.edges;
        set.sort();
        set
    }
}

impl Indexed for Slab {
    const KIND: &'static str = "Slab";

    fn index(&self) -> u32 {
        self.index
    }

    fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}

impl HasName for Slab {
    fn name(&self) -> &str {
        &self.name
    }
}

impl HasElsetRef for Slab {
    fn elset(&self) -> ElsetRef {
        self.elset
    }

    fn set_elset(&mut self, elset: ElsetRef) {
        self.elset = elset;
    }
}

impl Indexed for Region {
    const KIND: &'static str = "Region";

    fn index(&self) -> u32 {
        self.index
    }

    fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}
