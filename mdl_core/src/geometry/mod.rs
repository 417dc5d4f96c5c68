//! # Geometry Engine
//!
//! Replicate (grid translation) and mirror (line reflection) passes over
//! nodes, frame layouts, slab regions and beam loads.
//!
//! Every pass borrows its inputs and returns new collections. Nodes must be
//! placed first; the other passes never create nodes and only resolve placed
//! points through a [`SpatialIndex`](crate::spatial::SpatialIndex) of the
//! target node store. A point that does not resolve skips its item and is
//! reported as a `GeometryMismatch` warning on the returned [`Outcome`].
//!
//! ## Example
//!
//! ```rust
//! use glam::{DVec2, DVec3};
//! use mdl_core::config::GeometryConfig;
//! use mdl_core::entities::Node;
//! use mdl_core::geometry::{replicate_nodes, Grid, MirrorLine, Placement};
//! use mdl_core::store::EntityStore;
//!
//! let base = EntityStore::from_items(vec![Node::new(1, 0.0, 0.0, 0.0)]).unwrap();
//! let grid = Grid::new([1, 0, 0], DVec3::new(10.0, 0.0, 0.0));
//! let nodes = replicate_nodes(&base, &base, &grid, &GeometryConfig::default());
//! assert_eq!(nodes.len(), 2);
//!
//! let line = MirrorLine::new(DVec2::new(5.0, 0.0), DVec2::new(5.0, 1.0), 1e-6).unwrap();
//! let image = line.place(0, DVec3::new(2.0, 3.0, 0.0));
//! assert!((image - DVec3::new(8.0, 3.0, 0.0)).length() < 1e-9);
//! ```

pub mod frames;
pub mod loads;
pub mod nodes;
pub mod regions;

use std::fmt;
use std::hash::Hash;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entities::{Beam, Column, Node};
use crate::entities::frame::unordered_pair;
use crate::errors::{ModelError, ModelResult};
use crate::ids::NodeRef;
use crate::spatial::{same_location, SpatialIndex};
use crate::store::{EntityStore, Indexed};

pub use frames::{mirror_beams, mirror_columns, replicate_beams, replicate_columns};
pub use loads::{mirror_beam_loads, replicate_beam_loads, BeamLoadSources};
pub use nodes::{mirror_nodes, replicate_nodes};
pub use regions::{canonicalize_edges, mirror_regions, replicate_regions};

// ============================================================================
// Conflict Policy
// ============================================================================

/// How generated beam loads interact with loads already on the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Keep existing loads, add generated loads only for new keys
    #[default]
    Skip,
    /// Keep everything
    Add,
    /// Generated loads win over existing loads with the same key
    Replace,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictPolicy::Skip => "skip",
            ConflictPolicy::Add => "add",
            ConflictPolicy::Replace => "replace",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ConflictPolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(ConflictPolicy::Skip),
            "add" => Ok(ConflictPolicy::Add),
            "replace" => Ok(ConflictPolicy::Replace),
            _ => Err(ModelError::invalid_input("policy", s, "expected skip, add or replace")),
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Result of a geometry pass plus the candidates it had to skip.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<ModelError>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Outcome {
            value,
            warnings: Vec::new(),
        }
    }

    /// Record a skipped candidate.
    pub(crate) fn skip(&mut self, warning: ModelError) {
        warn!(%warning, "skipping candidate");
        self.warnings.push(warning);
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

// ============================================================================
// Placements
// ============================================================================

/// A point transform applied to template items. Each template item yields
/// one candidate per copy.
pub trait Placement {
    fn copies(&self) -> usize;
    fn place(&self, copy: usize, p: DVec3) -> DVec3;
}

/// Translation grid. Cells span `[0, n]` on every axis, minus the origin
/// cell which is the template itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    offsets: Vec<DVec3>,
}

impl Grid {
    pub fn new(counts: [u32; 3], step: DVec3) -> Self {
        let [nx, ny, nz] = counts;
        let mut offsets = Vec::new();
        for ix in 0..=nx {
            for iy in 0..=ny {
                for iz in 0..=nz {
                    if ix == 0 && iy == 0 && iz == 0 {
                        continue;
                    }
                    offsets.push(DVec3::new(ix as f64, iy as f64, iz as f64) * step);
                }
            }
        }
        Grid { offsets }
    }

    pub fn offsets(&self) -> &[DVec3] {
        &self.offsets
    }
}

impl Placement for Grid {
    fn copies(&self) -> usize {
        self.offsets.len()
    }

    fn place(&self, copy: usize, p: DVec3) -> DVec3 {
        p + self.offsets[copy]
    }
}

/// Reflection across the plan line through two points; z is unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorLine {
    origin: DVec2,
    /// Unit direction as (cos, sin)
    direction: DVec2,
}

impl MirrorLine {
    pub fn new(p1: DVec2, p2: DVec2, tolerance: f64) -> ModelResult<Self> {
        if same_location(p1.extend(0.0), p2.extend(0.0), tolerance) {
            return Err(ModelError::invalid_input(
                "mirror_line",
                format!("({}, {}) - ({}, {})", p1.x, p1.y, p2.x, p2.y),
                "line points coincide",
            ));
        }
        Ok(MirrorLine {
            origin: p1,
            direction: (p2 - p1).normalize(),
        })
    }

    pub fn reflect(&self, p: DVec3) -> DVec3 {
        let (cos, sin) = (self.direction.x, self.direction.y);
        let local = DVec2::new(cos, -sin).rotate(p.truncate() - self.origin);
        let flipped = DVec2::new(local.x, -local.y);
        (self.direction.rotate(flipped) + self.origin).extend(p.z)
    }
}

impl Placement for MirrorLine {
    fn copies(&self) -> usize {
        1
    }

    fn place(&self, _copy: usize, p: DVec3) -> DVec3 {
        self.reflect(p)
    }
}

// ============================================================================
// Point-bound items
// ============================================================================

/// Items defined by references to nodes.
pub trait PointBound: Indexed + Clone {
    type Key: Eq + Hash + Clone;

    fn points(&self) -> Vec<NodeRef>;
    /// Copy of `self` sitting on `points` (same length as [`points`](Self::points)).
    fn with_points(&self, points: &[NodeRef]) -> Self;
    /// Identity used to detect duplicates.
    fn location_key(&self) -> Self::Key;
}

impl PointBound for Beam {
    type Key = (NodeRef, NodeRef);

    fn points(&self) -> Vec<NodeRef> {
        vec![self.start, self.end]
    }

    fn with_points(&self, points: &[NodeRef]) -> Self {
        Beam {
            start: points[0],
            end: points[1],
            ..self.clone()
        }
    }

    fn location_key(&self) -> Self::Key {
        unordered_pair(self.start, self.end)
    }
}

impl PointBound for Column {
    type Key = NodeRef;

    fn points(&self) -> Vec<NodeRef> {
        vec![self.location]
    }

    fn with_points(&self, points: &[NodeRef]) -> Self {
        Column {
            location: points[0],
            ..self.clone()
        }
    }

    fn location_key(&self) -> Self::Key {
        self.location
    }
}

/// Everything a point-resolving pass needs: where template points are now,
/// where they go, and which target node sits there.
pub(crate) struct Resolver<'a, P: Placement> {
    pub source_nodes: &'a EntityStore<Node>,
    pub placement: &'a P,
    pub target_index: SpatialIndex,
}

impl<'a, P: Placement> Resolver<'a, P> {
    pub fn new(
        source_nodes: &'a EntityStore<Node>,
        target_nodes: &EntityStore<Node>,
        placement: &'a P,
        rounding_digits: u32,
    ) -> Self {
        Resolver {
            source_nodes,
            placement,
            target_index: SpatialIndex::build(target_nodes, rounding_digits),
        }
    }

    /// Target node for the `copy`-th image of source node `node`, or a
    /// `GeometryMismatch` naming what failed.
    pub fn resolve(&self, kind: &str, index: u32, copy: usize, node: NodeRef) -> Result<NodeRef, ModelError> {
        let source = self.source_nodes.get(node.get()).ok_or_else(|| {
            ModelError::geometry_mismatch(kind, index, format!("template node {node} does not exist"))
        })?;
        let placed = self.placement.place(copy, source.position());
        self.target_index.lookup(placed).ok_or_else(|| {
            ModelError::geometry_mismatch(
                kind,
                index,
                format!("no node at ({}, {}, {}) for template node {node}", placed.x, placed.y, placed.z),
            )
        })
    }

    pub fn resolve_all(&self, kind: &str, index: u32, copy: usize, nodes: &[NodeRef]) -> Result<Vec<NodeRef>, ModelError> {
        nodes.iter().map(|&n| self.resolve(kind, index, copy, n)).collect()
    }
}
