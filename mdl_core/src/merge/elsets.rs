//! # Elset Merge
//!
//! Merges two elset tables together with the catalogs they point into.
//! Designs are the master ordering: materials merge independently by name,
//! sections follow the merged design order (looked up by the design name),
//! and one elset is rebuilt per merged design so elset, section and design
//! indices line up.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entities::{Design, Elset, Material, Section};
use crate::errors::{ModelError, ModelResult};
use crate::ids::{DesignRef, ElsetRef, MaterialRef, SectionRef};
use crate::store::{EntityStore, HasName, Indexed};

use super::reorder::{merge_and_reorder, MergeOptions};

/// An elset table plus the stores its references resolve in.
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    pub elsets: &'a EntityStore<Elset>,
    pub materials: &'a EntityStore<Material>,
    pub sections: &'a EntityStore<Section>,
    pub designs: &'a EntityStore<Design>,
}

impl<'a> Catalog<'a> {
    fn design_of(&self, elset: &Elset) -> ModelResult<&'a Design> {
        self.designs.get(elset.design.get()).ok_or_else(|| {
            ModelError::missing_reference(Elset::KIND, elset.index, "design", Design::KIND, elset.design.get())
        })
    }

    fn material_of(&self, elset: &Elset) -> ModelResult<&'a Material> {
        self.materials.get(elset.material.get()).ok_or_else(|| {
            ModelError::missing_reference(Elset::KIND, elset.index, "material", Material::KIND, elset.material.get())
        })
    }

    /// Designs referenced by the elset table, first reference first.
    fn referenced_designs(&self) -> ModelResult<EntityStore<Design>> {
        let mut designs = EntityStore::new();
        for elset in self.elsets {
            let design = self.design_of(elset)?;
            if !designs.contains(design.index) {
                designs.add(design.clone())?;
            }
        }
        Ok(designs)
    }

    /// `design name -> elset`, first elset per design wins.
    fn elsets_by_design_name(&self) -> ModelResult<HashMap<&'a str, &'a Elset>> {
        let mut by_name = HashMap::new();
        for elset in self.elsets {
            by_name.entry(self.design_of(elset)?.name()).or_insert(elset);
        }
        Ok(by_name)
    }
}

/// Merged catalog stores and the elset index maps for rebinding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElsetMerge {
    pub elsets: EntityStore<Elset>,
    pub materials: EntityStore<Material>,
    pub sections: EntityStore<Section>,
    pub designs: EntityStore<Design>,
    /// Old existing elset index -> new elset index
    pub reorder_map: BTreeMap<u32, u32>,
    /// Old imported elset index -> new elset index
    pub imported_map: BTreeMap<u32, u32>,
    pub removed_any: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ElsetMerger {
    remove_missing: bool,
}

impl ElsetMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop existing designs (and their elsets) that the import does not
    /// carry, unless an item in the model still uses them.
    pub fn remove_missing(mut self, remove_missing: bool) -> Self {
        self.remove_missing = remove_missing;
        self
    }

    pub fn merge(
        &self,
        existing: &Catalog<'_>,
        imported: &Catalog<'_>,
        used_elsets: &BTreeSet<ElsetRef>,
    ) -> ModelResult<ElsetMerge> {
        // Used elsets protect their design and material from removal.
        let used: Vec<&Elset> = used_elsets
            .iter()
            .filter_map(|e| existing.elsets.get(e.get()))
            .collect();
        let protected_designs: BTreeSet<u32> = used.iter().map(|e| e.design.get()).collect();
        let protected_materials: BTreeSet<u32> = used.iter().map(|e| e.material.get()).collect();

        let materials = merge_and_reorder(
            existing.materials,
            imported.materials,
            &MergeOptions {
                remove_missing: self.remove_missing,
                protected: protected_materials,
            },
        )?;

        let designs = merge_and_reorder(
            &existing.referenced_designs()?,
            &imported.referenced_designs()?,
            &MergeOptions {
                remove_missing: self.remove_missing,
                protected: protected_designs,
            },
        )?;

        let sections = sections_in_design_order(&designs.merged, existing, imported)?;
        let elsets = rebuild_elsets(&designs.merged, &materials.merged, existing, imported)?;

        let reorder_map = elset_map(existing, &designs.reorder_map);
        let imported_map = elset_map(imported, &designs.imported_map);

        debug!(
            elsets = elsets.len(),
            materials = materials.merged.len(),
            removed = designs.removed_any || materials.removed_any,
            "merged elset catalogs"
        );
        Ok(ElsetMerge {
            elsets,
            materials: materials.merged,
            sections,
            designs: designs.merged,
            reorder_map,
            imported_map,
            removed_any: designs.removed_any || materials.removed_any,
        })
    }
}

/// One section per merged design, renumbered to the design's new index.
fn sections_in_design_order(
    designs: &EntityStore<Design>,
    existing: &Catalog<'_>,
    imported: &Catalog<'_>,
) -> ModelResult<EntityStore<Section>> {
    let by_name = |sections: &EntityStore<Section>, name: &str| sections.iter().find(|s| s.name == name).cloned();

    let mut sections = EntityStore::new();
    for design in designs {
        let mut section = by_name(imported.sections, &design.name)
            .or_else(|| by_name(existing.sections, &design.name))
            .ok_or_else(|| {
                ModelError::missing_reference(Design::KIND, design.index, "name", Section::KIND, design.index)
            })?;
        section.set_index(design.index);
        sections.add(section)?;
    }
    Ok(sections)
}

fn rebuild_elsets(
    designs: &EntityStore<Design>,
    materials: &EntityStore<Material>,
    existing: &Catalog<'_>,
    imported: &Catalog<'_>,
) -> ModelResult<EntityStore<Elset>> {
    let imported_by_design = imported.elsets_by_design_name()?;
    let existing_by_design = existing.elsets_by_design_name()?;
    let material_index: HashMap<&str, u32> = materials.iter().map(|m| (m.name(), m.index)).collect();

    let mut elsets = EntityStore::new();
    for design in designs {
        let (catalog, chosen) = match imported_by_design.get(design.name()) {
            Some(&elset) => (imported, elset),
            None => match existing_by_design.get(design.name()) {
                Some(&elset) => (existing, elset),
                None => {
                    return Err(ModelError::missing_reference(
                        Design::KIND,
                        design.index,
                        "elset",
                        Elset::KIND,
                        design.index,
                    ))
                }
            },
        };

        let material = catalog.material_of(chosen)?;
        let &material = material_index.get(material.name()).ok_or_else(|| {
            ModelError::missing_reference(Elset::KIND, chosen.index, "material", Material::KIND, material.index)
        })?;

        elsets.add(Elset {
            index: design.index,
            material: MaterialRef(material),
            section: SectionRef(design.index),
            design: DesignRef(design.index),
            texture: chosen.texture,
        })?;
    }
    Ok(elsets)
}

/// Translate a design index map into an elset index map.
fn elset_map(catalog: &Catalog<'_>, design_map: &BTreeMap<u32, u32>) -> BTreeMap<u32, u32> {
    catalog
        .elsets
        .iter()
        .filter_map(|elset| design_map.get(&elset.design.get()).map(|&new_index| (elset.index, new_index)))
        .collect()
}

/// Designs take the name of the section at the same index; the section name
/// is the one the merge keys on. Returns the corrected designs and how many
/// were renamed.
pub fn reconcile_design_names(
    designs: &EntityStore<Design>,
    sections: &EntityStore<Section>,
) -> ModelResult<(EntityStore<Design>, usize)> {
    let mut renamed = 0;
    let mut result = EntityStore::new();
    for design in designs {
        let mut design = design.clone();
        match sections.get(design.index) {
            Some(section) if section.name != design.name => {
                info!(index = design.index, from = %design.name, to = %section.name, "design renamed after its section");
                design.name = section.name.clone();
                renamed += 1;
            }
            Some(_) => {}
            None => debug!(index = design.index, name = %design.name, "no section at design index"),
        }
        result.add(design)?;
    }
    Ok((result, renamed))
}
