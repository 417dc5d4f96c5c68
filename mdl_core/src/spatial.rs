//! # Spatial Index
//!
//! Coordinate to node lookup under floating-point tolerance. Coordinates are
//! bucketed by rounding each axis to `rounding_digits` decimals, so a lookup
//! is one hash probe rather than a radius search.
//!
//! Rounding buckets are not the same relation as [`same_location`]: two
//! points 0.4e-6 apart can straddle a bucket boundary, and "same location"
//! is not transitive anyway. Inputs are expected to sit on a grid much
//! coarser than the tolerance.
//!
//! ```rust
//! use glam::DVec3;
//! use mdl_core::entities::Node;
//! use mdl_core::ids::NodeRef;
//! use mdl_core::spatial::SpatialIndex;
//! use mdl_core::store::EntityStore;
//!
//! let nodes = EntityStore::from_items(vec![Node::new(1, 0.0, 0.0, 0.0), Node::new(2, 10.0, 0.0, 0.0)]).unwrap();
//! let index = SpatialIndex::build(&nodes, 6);
//! assert_eq!(index.lookup(DVec3::new(10.0000001, 0.0, 0.0)), Some(NodeRef(2)));
//! assert_eq!(index.lookup_by_offset(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0)), Some(NodeRef(2)));
//! ```

use std::collections::HashMap;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::entities::Node;
use crate::ids::NodeRef;
use crate::store::EntityStore;

type BucketKey = (i64, i64, i64);

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    scale: f64,
    buckets: HashMap<BucketKey, NodeRef>,
}

impl SpatialIndex {
    pub fn new(rounding_digits: u32) -> Self {
        SpatialIndex {
            scale: 10f64.powi(rounding_digits as i32),
            buckets: HashMap::new(),
        }
    }

    /// Index a node store snapshot. When two nodes share a bucket the one
    /// inserted first wins.
    pub fn build(nodes: &EntityStore<Node>, rounding_digits: u32) -> Self {
        let mut index = Self::new(rounding_digits);
        for node in nodes {
            index.insert(node.position(), node.handle());
        }
        index
    }

    fn key(&self, p: DVec3) -> BucketKey {
        let scaled = (p * self.scale).round();
        (scaled.x as i64, scaled.y as i64, scaled.z as i64)
    }

    pub fn lookup(&self, p: DVec3) -> Option<NodeRef> {
        self.buckets.get(&self.key(p)).copied()
    }

    pub fn lookup_by_offset(&self, origin: DVec3, offset: DVec3) -> Option<NodeRef> {
        self.lookup(origin + offset)
    }

    pub fn contains(&self, p: DVec3) -> bool {
        self.buckets.contains_key(&self.key(p))
    }

    /// Register a node position. Returns false (and keeps the existing
    /// entry) when the bucket is already taken.
    pub fn insert(&mut self, p: DVec3, node: NodeRef) -> bool {
        let key = self.key(p);
        if self.buckets.contains_key(&key) {
            return false;
        }
        self.buckets.insert(key, node);
        true
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Per-axis tolerance test: every axis delta strictly below `tolerance`.
pub fn same_location(a: DVec3, b: DVec3, tolerance: f64) -> bool {
    let d = (a - b).abs();
    d.x < tolerance && d.y < tolerance && d.z < tolerance
}

/// Plan extents of a node set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn center(&self) -> DVec2 {
        DVec2::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }
}

pub fn bounds(nodes: &EntityStore<Node>) -> Option<Bounds> {
    let mut iter = nodes.iter();
    let first = iter.next()?;
    let init = Bounds {
        min_x: first.x,
        max_x: first.x,
        min_y: first.y,
        max_y: first.y,
    };
    Some(iter.fold(init, |b, n| Bounds {
        min_x: b.min_x.min(n.x),
        max_x: b.max_x.max(n.x),
        min_y: b.min_y.min(n.y),
        max_y: b.max_y.max(n.y),
    }))
}

/// The node with the lexicographically smallest `(x, y, z)`; the default
/// origin for offset lookups.
pub fn nearest_origin(nodes: &EntityStore<Node>) -> Option<&Node> {
    nodes.iter().min_by(|a, b| {
        a.x.total_cmp(&b.x)
            .then(a.y.total_cmp(&b.y))
            .then(a.z.total_cmp(&b.z))
    })
}

fn on_segment(p: DVec2, a: DVec2, b: DVec2) -> bool {
    const EPS: f64 = 1e-8;
    let cross = (p.y - a.y) * (b.x - a.x) - (p.x - a.x) * (b.y - a.y);
    if cross.abs() > EPS {
        return false;
    }
    (p - a).dot(p - b) <= 0.0
}

fn inside_polygon(p: DVec2, polygon: &[DVec2]) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if on_segment(p, pi, pj) {
            return true;
        }
        if (pi.y > p.y) != (pj.y > p.y) && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Nodes whose plan position lies inside (or on the edge of) the polygon
/// traced by `boundary`. Boundary indices missing from the store are
/// ignored; fewer than three usable corners select nothing.
pub fn select_by_polygon(nodes: &EntityStore<Node>, boundary: &[NodeRef]) -> EntityStore<Node> {
    let polygon: Vec<DVec2> = boundary
        .iter()
        .filter_map(|r| nodes.get(r.get()))
        .map(|n| DVec2::new(n.x, n.y))
        .collect();

    let mut selected = EntityStore::new();
    if polygon.len() < 3 {
        return selected;
    }
    for node in nodes {
        if inside_polygon(DVec2::new(node.x, node.y), &polygon) {
            // indices come from a store, so they are unique
            let _ = selected.add(node.clone());
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> EntityStore<Node> {
        let mut nodes = Vec::new();
        let mut i = 1;
        for y in 0..3 {
            for x in 0..3 {
                nodes.push(Node::new(i, x as f64 * 5.0, y as f64 * 5.0, 0.0));
                i += 1;
            }
        }
        EntityStore::from_items(nodes).unwrap()
    }

    #[test]
    fn test_tolerance_identity() {
        let a = DVec3::new(1.0, 2.0, 3.0);
        assert!(same_location(a, a + DVec3::splat(0.9e-6), 1e-6));
        assert!(!same_location(a, a + DVec3::new(0.0, 1e-6, 0.0), 1e-6));
        assert!(!same_location(a, a + DVec3::new(0.0, 0.0, 2e-6), 1e-6));
    }

    #[test]
    fn test_lookup_rounds_to_bucket() {
        let index = SpatialIndex::build(&grid(), 6);
        assert_eq!(index.lookup(DVec3::new(5.0, 5.0, 0.0)), Some(NodeRef(5)));
        assert_eq!(index.lookup(DVec3::new(5.0000004, 4.9999996, 0.0)), Some(NodeRef(5)));
        assert_eq!(index.lookup(DVec3::new(5.00001, 5.0, 0.0)), None);
    }

    #[test]
    fn test_insert_keeps_first_owner() {
        let mut index = SpatialIndex::new(6);
        assert!(index.insert(DVec3::ZERO, NodeRef(1)));
        assert!(!index.insert(DVec3::new(1e-8, 0.0, 0.0), NodeRef(2)));
        assert_eq!(index.lookup(DVec3::ZERO), Some(NodeRef(1)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_bounds_and_origin() {
        let nodes = grid();
        let b = bounds(&nodes).unwrap();
        assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (0.0, 10.0, 0.0, 10.0));
        assert_eq!(b.center(), DVec2::new(5.0, 5.0));
        assert_eq!(nearest_origin(&nodes).unwrap().index, 1);
        assert!(bounds(&EntityStore::new()).is_none());
    }

    #[test]
    fn test_select_by_polygon_includes_edges() {
        let nodes = grid();
        // lower-left 2x2 cell square: nodes 1, 2, 5, 4
        let boundary = [NodeRef(1), NodeRef(2), NodeRef(5), NodeRef(4)];
        let selected = select_by_polygon(&nodes, &boundary);
        assert_eq!(selected.index_list(), vec![1, 2, 4, 5]);

        let degenerate = select_by_polygon(&nodes, &[NodeRef(1), NodeRef(2)]);
        assert!(degenerate.is_empty());
    }
}
