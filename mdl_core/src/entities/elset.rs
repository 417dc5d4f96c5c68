//! Elsets: element sets binding a material, a section and a design.

use serde::{Deserialize, Serialize};

use crate::ids::{DesignRef, ElsetRef, MaterialRef, SectionRef};
use crate::store::Indexed;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Elset {
    pub index: u32,
    pub material: MaterialRef,
    pub section: SectionRef,
    pub design: DesignRef,
    /// Display texture id
    pub texture: i64,
}

impl Elset {
    pub fn handle(&self) -> ElsetRef {
        ElsetRef(self.index)
    }
}

impl Indexed for Elset {
    const KIND: &'static str = "Elset";

    fn index(&self) -> u32 {
        self.index
    }

    fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}
