//! # Designs
//!
//! `DESIGN` entries carry the code-check settings of a member family:
//! capacity reduction factors, length factors, and either a reinforced
//! concrete sub-record or a steel frame sub-record. Designs drive the
//! ordering of the property catalog when two models are merged.
//!
//! Integer codes (`function_index`, `structure_type`, `design_code`) are kept
//! as raw values. Known values:
//!
//! | field | values |
//! |---|---|
//! | function_index | 0 general, 1 truss, 2 beam, 3 column, 4 shear wall, 5 slab, 6 cable |
//! | structure_type | 1 ductile, 2 non-ductile, 3 braced frame, 4 walled frame |
//! | design_code | 5 ACI-89, 6 ACI-95, 7 ACI-91, 9 AASHTO-98, 10 ACI-2002, 12 PBI-2003, 14 SNI-2013, 16 ACI-2014 |

use serde::{Deserialize, Serialize};

use crate::store::{HasName, Indexed};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub index: u32,
    pub type_index: u32,
    pub name: String,
    pub function_index: u32,
    pub structure_type: u32,
    pub design_code: u32,
    pub compute_k: bool,
    pub show_detail: bool,
    pub show_diagram: bool,
    pub use_global_load_factor: bool,
    pub factors: DesignFactors,
    pub kind: DesignKind,
}

/// Second record line: phi factors, length factors, moment multipliers and
/// live load reductions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignFactors {
    pub phi_flexure: f64,
    pub phi_flex_tension: f64,
    pub phi_flex_compression: f64,
    pub phi_flex_compression_spiral: f64,
    pub phi_shear: f64,
    pub phi_torsion: f64,
    pub phi_bearing: f64,
    pub phi_connection: f64,
    pub k_x: f64,
    pub k_y: f64,
    /// Lu/L
    pub l_u: f64,
    pub l_ux: f64,
    pub l_uy: f64,
    pub c_mx: f64,
    pub c_my: f64,
    pub cb: f64,
    pub gravity_load_reduction: f64,
    pub earthquake_load_reduction: f64,
}

impl DesignFactors {
    pub const COUNT: usize = 18;

    pub fn to_array(&self) -> [f64; Self::COUNT] {
        [
            self.phi_flexure,
            self.phi_flex_tension,
            self.phi_flex_compression,
            self.phi_flex_compression_spiral,
            self.phi_shear,
            self.phi_torsion,
            self.phi_bearing,
            self.phi_connection,
            self.k_x,
            self.k_y,
            self.l_u,
            self.l_ux,
            self.l_uy,
            self.c_mx,
            self.c_my,
            self.cb,
            self.gravity_load_reduction,
            self.earthquake_load_reduction,
        ]
    }

    pub fn from_array(v: [f64; Self::COUNT]) -> Self {
        DesignFactors {
            phi_flexure: v[0],
            phi_flex_tension: v[1],
            phi_flex_compression: v[2],
            phi_flex_compression_spiral: v[3],
            phi_shear: v[4],
            phi_torsion: v[5],
            phi_bearing: v[6],
            phi_connection: v[7],
            k_x: v[8],
            k_y: v[9],
            l_u: v[10],
            l_ux: v[11],
            l_uy: v[12],
            c_mx: v[13],
            c_my: v[14],
            cb: v[15],
            gravity_load_reduction: v[16],
            earthquake_load_reduction: v[17],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DesignKind {
    Concrete {
        shape: ConcreteShape,
        /// Concrete cover
        cv: f64,
        reinforcement: ReinforcedConcrete,
    },
    SteelFrame(SteelFrame),
}

/// Member geometry of a concrete design, in record column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum ConcreteShape {
    Slab { tp: f64 },
    Wall { tp: f64 },
    Girder { bw: f64, ht: f64, bf: f64, tf: f64 },
    BiaxialColumn { b: f64, h: f64, bf: f64, tf: f64 },
    TeeColumn { b: f64, h: f64, tw: f64, tf: f64 },
    CircularColumn { d: f64 },
}

impl ConcreteShape {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConcreteShape::Slab { .. } => "CONCRETE_SLAB",
            ConcreteShape::Wall { .. } => "CONCRETE_WALL",
            ConcreteShape::Girder { .. } => "CONCRETE_GIRDER",
            ConcreteShape::BiaxialColumn { .. } => "CONCRETE_BCOL",
            ConcreteShape::TeeColumn { .. } => "CONCRETE_TCOL",
            ConcreteShape::CircularColumn { .. } => "CONCRETE_CCOL",
        }
    }

    /// The four dimension columns of the `CONCRETE =` line (unused ones are 0).
    pub fn dimensions(&self) -> [f64; 4] {
        match *self {
            ConcreteShape::Slab { tp } | ConcreteShape::Wall { tp } => [tp, 0.0, 0.0, 0.0],
            ConcreteShape::Girder { bw, ht, bf, tf } => [bw, ht, bf, tf],
            ConcreteShape::BiaxialColumn { b, h, bf, tf } => [b, h, bf, tf],
            ConcreteShape::TeeColumn { b, h, tw, tf } => [b, h, tw, tf],
            ConcreteShape::CircularColumn { d } => [d, 0.0, 0.0, 0.0],
        }
    }

    /// Rebuild a shape from its type keyword and dimension columns.
    pub fn from_dimensions(type_name: &str, d: [f64; 4]) -> Option<Self> {
        let shape = match type_name {
            "CONCRETE_SLAB" => ConcreteShape::Slab { tp: d[0] },
            "CONCRETE_WALL" => ConcreteShape::Wall { tp: d[0] },
            "CONCRETE_GIRDER" => ConcreteShape::Girder { bw: d[0], ht: d[1], bf: d[2], tf: d[3] },
            "CONCRETE_BCOL" => ConcreteShape::BiaxialColumn { b: d[0], h: d[1], bf: d[2], tf: d[3] },
            "CONCRETE_TCOL" => ConcreteShape::TeeColumn { b: d[0], h: d[1], tw: d[2], tf: d[3] },
            "CONCRETE_CCOL" => ConcreteShape::CircularColumn { d: d[0] },
            _ => return None,
        };
        Some(shape)
    }
}

/// Reinforcement settings shared by every concrete design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReinforcedConcrete {
    pub ec: f64,
    pub fc1: f64,
    pub fci: f64,
    pub fcr: f64,
    pub fy: f64,
    pub db: f64,
    pub delta: f64,
    /// 2 or 4 faces
    pub rebar_faces: i64,
    pub fys: f64,
    pub dbs: f64,
    pub nside: f64,
    pub sidebar_space: f64,
    /// 1 rectangle, 2 spiral
    pub stirrup_type: i64,
    pub fyv: f64,
    pub dbv: f64,
    pub stirrup_space_max: f64,
    pub hollow: bool,
    pub tcc: f64,
    pub tcf: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteelFrame {
    pub section_option: i64,
    pub composite_option: i64,
    pub connection_design: bool,
    pub section: String,
    pub wf2: String,
    pub strong_axis: bool,
    pub h1_ho: i64,
    pub space: i64,
    pub es: f64,
    pub fu: f64,
    pub fy: f64,
    pub ag: f64,
    pub r_min: f64,
    pub wx: f64,
    pub wy: f64,
    pub an_ag: f64,
    pub material_name: String,
    pub left_haunch_length: f64,
    pub left_haunch_height: f64,
    pub right_haunch_length: f64,
    pub right_haunch_height: f64,
    pub tu: f64,
    pub ty: f64,
    pub tension_only: bool,
    pub ry: f64,
    pub rt: f64,
}

impl DesignKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            DesignKind::Concrete { shape, .. } => shape.type_name(),
            DesignKind::SteelFrame(_) => "STEEL_FRAME",
        }
    }
}

impl Design {
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

impl Indexed for Design {
    const KIND: &'static str = "Design";

    fn index(&self) -> u32 {
        self.index
    }

    fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}

impl HasName for Design {
    fn name(&self) -> &str {
        &self.name
    }
}
