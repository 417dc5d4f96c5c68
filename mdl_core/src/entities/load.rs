//! Frame load definitions (`FLOADTAB`) and their assignment to beams (`BLOAD`).

use serde::{Deserialize, Serialize};

use crate::ids::LoadTableRef;
use crate::store::Indexed;

/// Direction code of a distributed frame load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadDirection {
    Qx,
    Qy,
    Qz,
    QyGlobal,
}

impl LoadDirection {
    pub fn code(self) -> u32 {
        match self {
            LoadDirection::Qx => 4,
            LoadDirection::Qy => 5,
            LoadDirection::Qz => 6,
            LoadDirection::QyGlobal => 15,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            4 => Some(LoadDirection::Qx),
            5 => Some(LoadDirection::Qy),
            6 => Some(LoadDirection::Qz),
            15 => Some(LoadDirection::QyGlobal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameLoadTable {
    pub index: u32,
    pub direction: LoadDirection,
    pub q: f64,
    pub s1: f64,
    pub s2: f64,
    pub misc: [i64; 2],
    pub note: String,
}

/// A frame load applied to one beam of one floor for one load case.
///
/// `beam_id` is the beam's floor-local index, so a load only has meaning
/// together with the beam layouts it was written against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamLoad {
    pub index: u32,
    pub load_case: u32,
    pub floor: u32,
    pub beam_id: u32,
    pub table: LoadTableRef,
}

impl Indexed for FrameLoadTable {
    const KIND: &'static str = "FrameLoadTable";

    fn index(&self) -> u32 {
        self.index
    }

    fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}

impl Indexed for BeamLoad {
    const KIND: &'static str = "BeamLoad";

    fn index(&self) -> u32 {
        self.index
    }

    fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}
