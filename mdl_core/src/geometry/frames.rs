//! Beam and column layouts under replicate and mirror.
//!
//! Template items keep their floor, elset and attributes; only their node
//! references change. Existing items keep their floor-local indices and new
//! items continue from the floor's current maximum.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::GeometryConfig;
use crate::entities::{BeamLayouts, ColumnLayouts, Layout, LayoutItem, Layouts, Node};
use crate::errors::ModelResult;
use crate::store::EntityStore;

use super::{Grid, MirrorLine, Outcome, Placement, PointBound, Resolver};

fn place_layouts<T, P>(
    target: &Layouts<T>,
    template: &Layouts<T>,
    resolver: &Resolver<'_, P>,
    include_original: bool,
) -> ModelResult<Outcome<Layouts<T>>>
where
    T: LayoutItem + PointBound,
    P: Placement,
{
    let mut result: Layouts<T> = if include_original { target.clone() } else { Layouts::new() };
    let mut seen: HashMap<u32, HashSet<T::Key>> = HashMap::new();
    for layout in &result {
        seen.insert(layout.floor, layout.items.iter().map(PointBound::location_key).collect());
    }

    let mut outcome = Outcome::new(());
    let mut created = 0usize;
    for layout in template {
        for item in &layout.items {
            for copy in 0..resolver.placement.copies() {
                let points = match resolver.resolve_all(T::KIND, item.index(), copy, &item.points()) {
                    Ok(points) => points,
                    Err(warning) => {
                        outcome.skip(warning);
                        continue;
                    }
                };
                let mut candidate = item.with_points(&points);
                if !seen.entry(layout.floor).or_default().insert(candidate.location_key()) {
                    continue;
                }

                if !result.contains(layout.floor) {
                    result.add(Layout::new(layout.floor))?;
                }
                if let Some(floor) = result.get_mut(layout.floor) {
                    candidate.set_index(floor.next_index());
                    floor.items.add(candidate)?;
                    created += 1;
                }
            }
        }
    }

    debug!(kind = T::LAYOUT_KIND, created, skipped = outcome.warnings.len(), "placed layout items");
    Ok(outcome.map(|_| result))
}

/// Replicate template beams onto `target`. `target_nodes` must already hold
/// the replicated nodes.
pub fn replicate_beams(
    target: &BeamLayouts,
    template: &BeamLayouts,
    source_nodes: &EntityStore<Node>,
    target_nodes: &EntityStore<Node>,
    grid: &Grid,
    include_original: bool,
    geometry: &GeometryConfig,
) -> ModelResult<Outcome<BeamLayouts>> {
    let resolver = Resolver::new(source_nodes, target_nodes, grid, geometry.rounding_digits);
    place_layouts(target, template, &resolver, include_original)
}

pub fn replicate_columns(
    target: &ColumnLayouts,
    template: &ColumnLayouts,
    source_nodes: &EntityStore<Node>,
    target_nodes: &EntityStore<Node>,
    grid: &Grid,
    include_original: bool,
    geometry: &GeometryConfig,
) -> ModelResult<Outcome<ColumnLayouts>> {
    let resolver = Resolver::new(source_nodes, target_nodes, grid, geometry.rounding_digits);
    place_layouts(target, template, &resolver, include_original)
}

/// Mirror beams. `source_nodes` are the nodes before mirroring and
/// `target_nodes` the output of [`mirror_nodes`](super::mirror_nodes).
pub fn mirror_beams(
    target: &BeamLayouts,
    to_mirror: &BeamLayouts,
    source_nodes: &EntityStore<Node>,
    target_nodes: &EntityStore<Node>,
    line: &MirrorLine,
    include_original: bool,
    geometry: &GeometryConfig,
) -> ModelResult<Outcome<BeamLayouts>> {
    let resolver = Resolver::new(source_nodes, target_nodes, line, geometry.rounding_digits);
    place_layouts(target, to_mirror, &resolver, include_original)
}

pub fn mirror_columns(
    target: &ColumnLayouts,
    to_mirror: &ColumnLayouts,
    source_nodes: &EntityStore<Node>,
    target_nodes: &EntityStore<Node>,
    line: &MirrorLine,
    include_original: bool,
    geometry: &GeometryConfig,
) -> ModelResult<Outcome<ColumnLayouts>> {
    let resolver = Resolver::new(source_nodes, target_nodes, line, geometry.rounding_digits);
    place_layouts(target, to_mirror, &resolver, include_original)
}
