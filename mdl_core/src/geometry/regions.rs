//! Slab regions under replicate and mirror.
//!
//! Regions are stored flat (each carries its floor) and renumbered 1..N in
//! output order after every pass.

use std::collections::HashSet;

use tracing::debug;

use crate::config::GeometryConfig;
use crate::entities::{Node, Region};
use crate::errors::ModelResult;
use crate::ids::NodeRef;
use crate::store::{EntityStore, Indexed};

use super::{Grid, MirrorLine, Outcome, Placement, Resolver};

type RegionKey = (u32, [NodeRef; 4]);

fn rounded_key(node: &Node, rounding_digits: u32) -> (i64, i64, i64) {
    let scale = 10f64.powi(rounding_digits as i32);
    let p = (node.position() * scale).round();
    (p.x as i64, p.y as i64, p.z as i64)
}

/// Shoelace sign test in plan.
fn is_ccw(corners: &[&Node; 4]) -> bool {
    let mut area = 0.0;
    for i in 0..4 {
        let (a, b) = (corners[i], corners[(i + 1) % 4]);
        area += (b.x - a.x) * (b.y + a.y);
    }
    area < 0.0
}

/// Counter-clockwise winding starting at the corner with the smallest
/// rounded `(x, y, z)`. Returns `None` if a corner is not in `nodes`.
pub fn canonicalize_edges(edges: [NodeRef; 4], nodes: &EntityStore<Node>, rounding_digits: u32) -> Option<[NodeRef; 4]> {
    let corners = [
        nodes.get(edges[0].get())?,
        nodes.get(edges[1].get())?,
        nodes.get(edges[2].get())?,
        nodes.get(edges[3].get())?,
    ];
    let (edges, corners) = if is_ccw(&corners) {
        (edges, corners)
    } else {
        (
            [edges[0], edges[3], edges[2], edges[1]],
            [corners[0], corners[3], corners[2], corners[1]],
        )
    };

    let start = (0..4).min_by_key(|&i| rounded_key(corners[i], rounding_digits))?;
    Some([edges[start], edges[(start + 1) % 4], edges[(start + 2) % 4], edges[(start + 3) % 4]])
}

fn region_key(region: &Region) -> RegionKey {
    (region.floor, region.node_set())
}

fn place_regions<P: Placement>(
    target: &EntityStore<Region>,
    template: &EntityStore<Region>,
    target_nodes: &EntityStore<Node>,
    resolver: &Resolver<'_, P>,
    include_original: bool,
    rounding_digits: u32,
) -> ModelResult<Outcome<EntityStore<Region>>> {
    let mut regions: Vec<Region> = if include_original { target.iter().cloned().collect() } else { Vec::new() };
    let mut seen: HashSet<RegionKey> = regions.iter().map(region_key).collect();
    let kept = regions.len();

    let mut outcome = Outcome::new(());
    for region in template {
        for copy in 0..resolver.placement.copies() {
            let placed = match resolver.resolve_all(Region::KIND, region.index, copy, &region.edges) {
                Ok(points) => [points[0], points[1], points[2], points[3]],
                Err(warning) => {
                    outcome.skip(warning);
                    continue;
                }
            };
            // every corner was just resolved in `target_nodes`
            let Some(edges) = canonicalize_edges(placed, target_nodes, rounding_digits) else {
                continue;
            };
            let candidate = Region {
                edges,
                ..region.clone()
            };
            if seen.insert(region_key(&candidate)) {
                regions.push(candidate);
            }
        }
    }

    debug!(kept, created = regions.len() - kept, skipped = outcome.warnings.len(), "placed regions");
    for (position, region) in regions.iter_mut().enumerate() {
        region.set_index(position as u32 + 1);
    }
    let store = EntityStore::from_items(regions)?;
    Ok(outcome.map(|_| store))
}

pub fn replicate_regions(
    target: &EntityStore<Region>,
    template: &EntityStore<Region>,
    source_nodes: &EntityStore<Node>,
    target_nodes: &EntityStore<Node>,
    grid: &Grid,
    include_original: bool,
    geometry: &GeometryConfig,
) -> ModelResult<Outcome<EntityStore<Region>>> {
    let resolver = Resolver::new(source_nodes, target_nodes, grid, geometry.rounding_digits);
    place_regions(target, template, target_nodes, &resolver, include_original, geometry.rounding_digits)
}

/// Mirror regions; winding is restored by canonicalization.
pub fn mirror_regions(
    regions: &EntityStore<Region>,
    source_nodes: &EntityStore<Node>,
    target_nodes: &EntityStore<Node>,
    line: &MirrorLine,
    include_original: bool,
    geometry: &GeometryConfig,
) -> ModelResult<Outcome<EntityStore<Region>>> {
    let resolver = Resolver::new(source_nodes, target_nodes, line, geometry.rounding_digits);
    place_regions(regions, regions, target_nodes, &resolver, include_original, geometry.rounding_digits)
}

#[cfg(test)]
mod tests {
    use glam::{DVec2, DVec3};

    use super::*;
    use crate::geometry::{mirror_nodes, replicate_nodes};
    use crate::ids::SlabRef;

    /// 4 --- 3
    /// |     |
    /// 1 --- 2
    fn square() -> EntityStore<Node> {
        EntityStore::from_items(vec![
            Node::new(1, 0.0, 0.0, 0.0),
            Node::new(2, 4.0, 0.0, 0.0),
            Node::new(3, 4.0, 4.0, 0.0),
            Node::new(4, 0.0, 4.0, 0.0),
        ])
        .unwrap()
    }

    fn region(index: u32, edges: [u32; 4]) -> Region {
        Region {
            index,
            floor: 1,
            slab: SlabRef(2),
            option: 0,
            q_dl_add: 0.05,
            q_ll_add: 0.0,
            edges: edges.map(NodeRef),
            offset: 0,
            misc: String::new(),
        }
    }

    #[test]
    fn test_canonical_order_ignores_rotation_and_winding() {
        let nodes = square();
        let expected = Some([1, 2, 3, 4].map(NodeRef));
        for edges in [[1, 2, 3, 4], [3, 4, 1, 2], [1, 4, 3, 2], [2, 1, 4, 3]] {
            assert_eq!(canonicalize_edges(edges.map(NodeRef), &nodes, 6), expected, "{edges:?}");
        }
        assert_eq!(canonicalize_edges([1, 2, 3, 9].map(NodeRef), &nodes, 6), None);
    }

    #[test]
    fn test_replicate_regions_renumbers() {
        let nodes = square();
        let grid = Grid::new([1, 0, 0], DVec3::new(4.0, 0.0, 0.0));
        let config = GeometryConfig::default();
        let target_nodes = replicate_nodes(&nodes, &nodes, &grid, &config);

        let regions = EntityStore::from_items(vec![region(7, [1, 2, 3, 4])]).unwrap();
        let outcome = replicate_regions(&regions, &regions, &nodes, &target_nodes, &grid, true, &config).unwrap();
        assert_eq!(outcome.value.index_list(), vec![1, 2]);

        let copy = outcome.value.get(2).unwrap();
        // (4,0) (8,0) (8,4) (4,4)
        assert_eq!(copy.edges, [2, 5, 6, 3].map(NodeRef));
        assert_eq!(copy.slab, SlabRef(2));
    }

    #[test]
    fn test_mirror_regions_restores_winding() {
        let nodes = square();
        let line = MirrorLine::new(DVec2::new(0.0, 0.0), DVec2::new(0.0, 1.0), 1e-6).unwrap();
        let config = GeometryConfig::default();
        let mirrored = mirror_nodes(&nodes, &line, false, &config);

        let regions = EntityStore::from_items(vec![region(1, [1, 2, 3, 4])]).unwrap();
        let outcome = mirror_regions(&regions, &nodes, &mirrored, &line, false, &config).unwrap();
        let image = outcome.value.get(1).unwrap();
        // mirrored corners: 1 (0,0) 2 (-4,0) 3 (-4,4) 4 (0,4); CCW from (-4,0)
        assert_eq!(image.edges, [2, 1, 4, 3].map(NodeRef));
    }
}
