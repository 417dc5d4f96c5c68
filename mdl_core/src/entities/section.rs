//! # Sections
//!
//! `SECTION` entries: cross-section geometry referenced by elsets. Sections
//! are named after the design they belong to, so the merge follows design
//! order and looks sections up by name.

use serde::{Deserialize, Serialize};

use crate::store::{HasName, Indexed};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub index: u32,
    pub type_index: u32,
    pub misc: SectionMisc,
    pub name: String,
    pub shape: SectionShape,
}

/// Header columns between the type keyword and the name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionMisc {
    pub flags: [i64; 4],
    pub values: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SectionShape {
    Thickness {
        thickness: f64,
    },
    /// Rectangle; the record repeats the width as the flange width
    Rect {
        width: f64,
        height: f64,
        slab_thick: f64,
    },
    Tee {
        width: f64,
        height: f64,
        thick_web: f64,
        thick_flange: f64,
    },
    Circle {
        diameter: f64,
    },
    /// Rolled steel shape from the program's library
    User {
        steel_section: String,
        strong_axis: bool,
    },
}

impl SectionShape {
    pub fn type_name(&self) -> &'static str {
        match self {
            SectionShape::Thickness { .. } => "THICKNESS",
            SectionShape::Rect { .. } => "RECT",
            SectionShape::Tee { .. } => "TEE",
            SectionShape::Circle { .. } => "CIRCLE",
            SectionShape::User { .. } => "USER",
        }
    }
}

impl Section {
    pub fn type_name(&self) -> &'static str {
        self.shape.type_name()
    }
}

impl Indexed for Section {
    const KIND: &'static str = "Section";

    fn index(&self) -> u32 {
        self.index
    }

    fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}

impl HasName for Section {
    fn name(&self) -> &str {
        &self.name
    }
}
