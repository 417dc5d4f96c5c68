//! Nodes: indexed points in model space.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::ids::NodeRef;
use crate::store::Indexed;

/// A joint of the structural model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub index: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Node {
    pub fn new(index: u32, x: f64, y: f64, z: f64) -> Self {
        Node { index, x, y, z }
    }

    pub fn at(index: u32, position: DVec3) -> Self {
        Node::new(index, position.x, position.y, position.z)
    }

    pub fn position(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    pub fn handle(&self) -> NodeRef {
        NodeRef(self.index)
    }
}

impl Indexed for Node {
    const KIND: &'static str = "Node";

    fn index(&self) -> u32 {
        self.index
    }

    fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}
