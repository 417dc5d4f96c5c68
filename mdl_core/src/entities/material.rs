//! # Materials
//!
//! `MATERIAL` entries. Two variants are modeled: isotropic (concrete, steel)
//! and spring supports. The material name is the merge key between models.

use serde::{Deserialize, Serialize};

use crate::store::{HasName, Indexed};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub index: u32,
    pub type_index: u32,
    pub name: String,
    /// Four integer flags written after the name; meaning unknown, kept as-is
    pub misc1: [i64; 4],
    /// Leading integer of the second record line
    pub misc2: i64,
    pub kind: MaterialKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MaterialKind {
    Isotropic(IsotropicMaterial),
    Spring(SpringMaterial),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotropicMaterial {
    /// Compressive strength (kg/cm2)
    pub fc1: f64,
    pub time_dependent: bool,
    pub alpha: f64,
    pub beta: f64,
    pub thermal_coefficient: f64,
    pub unit_weight: f64,
    pub elastic_modulus: f64,
    pub shear_modulus: f64,
    pub poisson_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringMaterial {
    pub stiffness: f64,
    pub min: f64,
    pub max: f64,
}

impl MaterialKind {
    /// Record keyword for the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            MaterialKind::Isotropic(_) => "ISOTROPIC",
            MaterialKind::Spring(_) => "SPRING",
        }
    }
}

impl Material {
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn fc1(&self) -> Option<f64> {
        match &self.kind {
            MaterialKind::Isotropic(iso) => Some(iso.fc1),
            MaterialKind::Spring(_) => None,
        }
    }
}

impl Indexed for Material {
    const KIND: &'static str = "Material";

    fn index(&self) -> u32 {
        self.index
    }

    fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}

impl HasName for Material {
    fn name(&self) -> &str {
        &self.name
    }
}
