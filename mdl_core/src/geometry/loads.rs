//! Beam loads under replicate and mirror.
//!
//! A beam load names its beam by `(floor, floor-local index)`, which means
//! nothing once layouts are rebuilt. The pass therefore finds the template
//! beam, places its end nodes and looks the resulting node pair up among the
//! beams of the final layouts. Collisions with existing loads are decided by
//! [`ConflictPolicy`] on the key `(floor, unordered node pair, load case)`.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::GeometryConfig;
use crate::entities::frame::unordered_pair;
use crate::entities::{BeamLayouts, BeamLoad, Node};
use crate::errors::{ModelError, ModelResult};
use crate::ids::NodeRef;
use crate::store::{EntityStore, Indexed};

use super::{ConflictPolicy, Grid, MirrorLine, Outcome, Placement, PointBound, Resolver};

type LoadKey = (u32, (NodeRef, NodeRef), u32);

/// Layouts and nodes on both sides of a placement.
#[derive(Debug, Clone, Copy)]
pub struct BeamLoadSources<'a> {
    /// Layouts the loads being copied refer to
    pub layouts_original: &'a BeamLayouts,
    /// Layouts after the beam pass
    pub layouts_final: &'a BeamLayouts,
    pub source_nodes: &'a EntityStore<Node>,
    pub target_nodes: &'a EntityStore<Node>,
}

/// `floor -> node pair -> beam index` for the final layouts.
fn beam_lookup(layouts: &BeamLayouts) -> HashMap<u32, HashMap<(NodeRef, NodeRef), u32>> {
    let mut lookup: HashMap<u32, HashMap<(NodeRef, NodeRef), u32>> = HashMap::new();
    for layout in layouts {
        let floor = lookup.entry(layout.floor).or_default();
        for beam in &layout.items {
            floor.entry(beam.location_key()).or_insert(beam.index);
        }
    }
    lookup
}

fn existing_key(load: &BeamLoad, layouts: &BeamLayouts) -> Option<LoadKey> {
    let beam = layouts.get(load.floor)?.get_item(load.beam_id)?;
    Some((load.floor, beam.location_key(), load.load_case))
}

fn place_loads<P: Placement>(
    base: &EntityStore<BeamLoad>,
    to_copy: &EntityStore<BeamLoad>,
    sources: &BeamLoadSources<'_>,
    placement: &P,
    include_original: bool,
    policy: ConflictPolicy,
    geometry: &GeometryConfig,
) -> ModelResult<Outcome<EntityStore<BeamLoad>>> {
    let resolver = Resolver::new(sources.source_nodes, sources.target_nodes, placement, geometry.rounding_digits);
    let final_beams = beam_lookup(sources.layouts_final);
    let mut outcome = Outcome::new(());

    let mut fresh: Vec<(LoadKey, BeamLoad)> = Vec::new();
    for load in to_copy {
        let Some(beam) = sources
            .layouts_original
            .get(load.floor)
            .and_then(|layout| layout.get_item(load.beam_id))
        else {
            outcome.skip(ModelError::geometry_mismatch(
                BeamLoad::KIND,
                load.index,
                format!("beam {} on floor {} does not exist", load.beam_id, load.floor),
            ));
            continue;
        };

        for copy in 0..placement.copies() {
            let pair = match resolver.resolve_all(BeamLoad::KIND, load.index, copy, &beam.points()) {
                Ok(points) => unordered_pair(points[0], points[1]),
                Err(warning) => {
                    outcome.skip(warning);
                    continue;
                }
            };
            let Some(&beam_id) = final_beams.get(&load.floor).and_then(|floor| floor.get(&pair)) else {
                outcome.skip(ModelError::geometry_mismatch(
                    BeamLoad::KIND,
                    load.index,
                    format!("no beam between nodes {} and {} on floor {}", pair.0, pair.1, load.floor),
                ));
                continue;
            };
            let placed = BeamLoad {
                beam_id,
                ..load.clone()
            };
            fresh.push(((load.floor, pair, load.load_case), placed));
        }
    }

    let mut loads: Vec<BeamLoad> = Vec::new();
    if include_original {
        match policy {
            ConflictPolicy::Add => {
                loads.extend(base.iter().cloned());
                loads.extend(fresh.iter().map(|(_, load)| load.clone()));
            }
            ConflictPolicy::Skip => {
                let existing: HashSet<LoadKey> =
                    base.iter().filter_map(|l| existing_key(l, sources.layouts_final)).collect();
                loads.extend(base.iter().cloned());
                loads.extend(
                    fresh
                        .iter()
                        .filter(|(key, _)| !existing.contains(key))
                        .map(|(_, load)| load.clone()),
                );
            }
            ConflictPolicy::Replace => {
                let incoming: HashSet<LoadKey> = fresh.iter().map(|(key, _)| *key).collect();
                loads.extend(
                    base.iter()
                        .filter(|l| !existing_key(l, sources.layouts_final).is_some_and(|key| incoming.contains(&key)))
                        .cloned(),
                );
                loads.extend(fresh.iter().map(|(_, load)| load.clone()));
            }
        }
    } else {
        loads.extend(fresh.into_iter().map(|(_, load)| load));
    }

    for (position, load) in loads.iter_mut().enumerate() {
        load.set_index(position as u32 + 1);
    }
    debug!(%policy, total = loads.len(), skipped = outcome.warnings.len(), "placed beam loads");
    let store = EntityStore::from_items(loads)?;
    Ok(outcome.map(|_| store))
}

pub fn replicate_beam_loads(
    base: &EntityStore<BeamLoad>,
    to_copy: &EntityStore<BeamLoad>,
    sources: &BeamLoadSources<'_>,
    grid: &Grid,
    include_original: bool,
    policy: ConflictPolicy,
    geometry: &GeometryConfig,
) -> ModelResult<Outcome<EntityStore<BeamLoad>>> {
    place_loads(base, to_copy, sources, grid, include_original, policy, geometry)
}

/// Mirror the loads of `base` onto the mirrored layouts.
pub fn mirror_beam_loads(
    base: &EntityStore<BeamLoad>,
    sources: &BeamLoadSources<'_>,
    line: &MirrorLine,
    include_original: bool,
    policy: ConflictPolicy,
    geometry: &GeometryConfig,
) -> ModelResult<Outcome<EntityStore<BeamLoad>>> {
    place_loads(base, base, sources, line, include_original, policy, geometry)
}
