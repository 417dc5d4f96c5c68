//! Node placement: the only passes that create nodes.

use tracing::debug;

use crate::config::GeometryConfig;
use crate::entities::Node;
use crate::ids::NodeRef;
use crate::spatial::SpatialIndex;
use crate::store::EntityStore;

use super::{Grid, MirrorLine, Placement};

/// Copy every template node into each grid cell of `base`.
///
/// Positions already occupied (by a base node or a node generated earlier in
/// this call) are skipped. New nodes take indices after the current maximum
/// in generation order.
pub fn replicate_nodes(
    base: &EntityStore<Node>,
    template: &EntityStore<Node>,
    grid: &Grid,
    geometry: &GeometryConfig,
) -> EntityStore<Node> {
    let mut index = SpatialIndex::build(base, geometry.rounding_digits);
    let mut result = base.clone();
    let mut next = base.max_index() + 1;

    for node in template {
        for copy in 0..grid.copies() {
            let position = grid.place(copy, node.position());
            if index.insert(position, NodeRef(next)) {
                // `next` is above every index in `result`
                let _ = result.add(Node::at(next, position));
                next += 1;
            }
        }
    }

    debug!(base = base.len(), created = result.len() - base.len(), "replicated nodes");
    result
}

/// Reflect nodes across `line`.
///
/// Without `include_original` every node keeps its index and moves to its
/// mirrored position. With it, originals stay and each mirrored position not
/// already occupied gets a new node.
pub fn mirror_nodes(
    nodes: &EntityStore<Node>,
    line: &MirrorLine,
    include_original: bool,
    geometry: &GeometryConfig,
) -> EntityStore<Node> {
    if !include_original {
        let mut result = EntityStore::new();
        for node in nodes {
            let _ = result.add(Node::at(node.index, line.reflect(node.position())));
        }
        debug!(nodes = result.len(), "mirrored nodes in place");
        return result;
    }

    let mut index = SpatialIndex::build(nodes, geometry.rounding_digits);
    let mut result = nodes.clone();
    let mut next = nodes.max_index() + 1;
    for node in nodes {
        let position = line.reflect(node.position());
        if index.insert(position, NodeRef(next)) {
            let _ = result.add(Node::at(next, position));
            next += 1;
        }
    }
    debug!(original = nodes.len(), created = result.len() - nodes.len(), "mirrored nodes");
    result
}

#[cfg(test)]
mod tests {
    use glam::{DVec2, DVec3};

    use super::*;

    fn store(nodes: Vec<Node>) -> EntityStore<Node> {
        EntityStore::from_items(nodes).unwrap()
    }

    #[test]
    fn test_replicate_is_idempotent() {
        let base = store(vec![Node::new(1, 0.0, 0.0, 0.0)]);
        let grid = Grid::new([1, 0, 0], DVec3::new(10.0, 0.0, 0.0));
        let config = GeometryConfig::default();

        let once = replicate_nodes(&base, &base, &grid, &config);
        assert_eq!(once.as_slice(), &[Node::new(1, 0.0, 0.0, 0.0), Node::new(2, 10.0, 0.0, 0.0)]);

        let twice = replicate_nodes(&once, &base, &grid, &config);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_replicate_indices_follow_max() {
        let base = store(vec![Node::new(7, 0.0, 0.0, 0.0), Node::new(3, 5.0, 0.0, 0.0)]);
        let template = store(vec![Node::new(1, 0.0, 0.0, 0.0), Node::new(2, 5.0, 0.0, 0.0)]);
        let grid = Grid::new([0, 2, 0], DVec3::new(0.0, 4.0, 0.0));

        let result = replicate_nodes(&base, &template, &grid, &GeometryConfig::default());
        let created: Vec<(u32, f64, f64)> = result.iter().skip(2).map(|n| (n.index, n.x, n.y)).collect();
        assert_eq!(created, vec![(8, 0.0, 4.0), (9, 0.0, 8.0), (10, 5.0, 4.0), (11, 5.0, 8.0)]);
        // inputs untouched
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_mirror_in_place_keeps_indices() {
        let nodes = store(vec![Node::new(4, 2.0, 3.0, 1.0)]);
        let line = MirrorLine::new(DVec2::new(5.0, 0.0), DVec2::new(5.0, 1.0), 1e-6).unwrap();
        let mirrored = mirror_nodes(&nodes, &line, false, &GeometryConfig::default());
        let node = mirrored.get(4).unwrap();
        assert!((node.position() - DVec3::new(8.0, 3.0, 1.0)).length() < 1e-9);
    }

    #[test]
    fn test_mirror_with_original_skips_occupied() {
        // node 2 sits on the line, so its image is itself
        let nodes = store(vec![Node::new(1, 0.0, 0.0, 0.0), Node::new(2, 5.0, 0.0, 0.0)]);
        let line = MirrorLine::new(DVec2::new(5.0, 0.0), DVec2::new(5.0, 1.0), 1e-6).unwrap();
        let mirrored = mirror_nodes(&nodes, &line, true, &GeometryConfig::default());
        assert_eq!(mirrored.index_list(), vec![1, 2, 3]);
        assert!((mirrored.get(3).unwrap().x - 10.0).abs() < 1e-9);
    }
}
