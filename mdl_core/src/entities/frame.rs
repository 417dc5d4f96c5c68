//! # Frame Members
//!
//! Beams and columns. Both live inside a per-floor [`Layout`](super::Layout)
//! and are numbered from 1 within their floor. The trailing columns of their
//! records are not modeled and travel as an opaque `misc` string.

use serde::{Deserialize, Serialize};

use crate::ids::{ElsetRef, NodeRef};
use crate::store::{HasElsetRef, Indexed};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    pub index: u32,
    pub start: NodeRef,
    pub end: NodeRef,
    pub elset: ElsetRef,
    pub group: i64,
    pub beam_type: i64,
    pub misc: String,
}

impl Beam {
    /// End nodes with the smaller index first; beams are undirected.
    pub fn node_pair(&self) -> (NodeRef, NodeRef) {
        unordered_pair(self.start, self.end)
    }
}

pub(crate) fn unordered_pair(a: NodeRef, b: NodeRef) -> (NodeRef, NodeRef) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub index: u32,
    pub location: NodeRef,
    pub elset: ElsetRef,
    pub group: i64,
    pub alpha: i64,
    pub misc: String,
}

impl Indexed for Beam {
    const KIND: &'static str = "Beam";

    fn index(&self) -> u32 {
        self.index
    }

    fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}

impl HasElsetRef for Beam {
    fn elset(&self) -> ElsetRef {
        self.elset
    }

    fn set_elset(&mut self, elset: ElsetRef) {
        self.elset = elset;
    }
}

impl Indexed for Column {
    const KIND: &'static str = "Column";

    fn index(&self) -> u32 {
        self.index
    }

    fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}

impl HasElsetRef for Column {
    fn elset(&self) -> ElsetRef {
        self.elset
    }

    fn set_elset(&mut self, elset: ElsetRef) {
        self.elset = elset;
    }
}
