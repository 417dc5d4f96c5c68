//! # Model Graph
//!
//! [`ModelGraph`] is the typed view of one `.MDL` file: every modeled block
//! parsed into its store, with cross-references held as integer handles.
//!
//! The high-level passes ([`mirror`](ModelGraph::mirror),
//! [`replicate_from`](ModelGraph::replicate_from) and
//! [`merge_references`](ModelGraph::merge_references)) borrow the graph and
//! return a new one together with a [`TransformReport`]. They run the
//! geometry, merge and rebind steps in dependency order: nodes first, then
//! frames, regions and loads; catalogs before the items that point into them.
//!
//! ```rust
//! use glam::DVec2;
//! use mdl_core::config::EngineConfig;
//! use mdl_core::geometry::MirrorLine;
//! use mdl_core::graph::ModelGraph;
//! use mdl_core::model_file::ModelFile;
//!
//! let mut model = ModelFile::parse("*NODEXY*\n   1  2 3  0\n");
//! let graph = ModelGraph::from_model_file(&model).unwrap();
//!
//! let config = EngineConfig::default();
//! let line = MirrorLine::new(DVec2::new(5.0, 0.0), DVec2::new(5.0, 1.0), config.geometry.tolerance).unwrap();
//! let (mirrored, report) = graph.mirror(&line, true, config.loads.default_policy, &config.geometry).unwrap();
//! assert_eq!(report.counts["nodes"].after, 2);
//!
//! mirrored.write_into(&mut model).unwrap();
//! assert!(model.to_text().contains("   2  8 3  0"));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GeometryConfig;
use crate::entities::{
    used_elsets, BeamLayouts, BeamLoad, ColumnLayouts, Design, Elset, FrameLoadTable, Layout, LayoutItem, Layouts,
    Material, Node, Region, Section, Slab,
};
use crate::errors::{ModelError, ModelResult};
use crate::geometry::{
    mirror_beam_loads, mirror_beams, mirror_columns, mirror_nodes, mirror_regions, replicate_beam_loads,
    replicate_beams, replicate_columns, replicate_nodes, replicate_regions, BeamLoadSources, ConflictPolicy, Grid,
    MirrorLine, Outcome, PointBound,
};
use crate::ids::{ElsetRef, LoadTableRef, SlabRef};
use crate::merge::{reconcile_design_names, Catalog, ElsetMerger};
use crate::model_file::ModelFile;
use crate::rebind::LayoutRebinder;
use crate::records::{format_block, format_layouts, parse_block, parse_layouts, LayoutRecord, Record};
use crate::report::TransformReport;
use crate::spatial::{bounds, nearest_origin, Bounds};
use crate::store::{EntityStore, HasElsetRef, HasName, Indexed};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelGraph {
    pub nodes: EntityStore<Node>,
    pub materials: EntityStore<Material>,
    pub sections: EntityStore<Section>,
    pub designs: EntityStore<Design>,
    pub elsets: EntityStore<Elset>,
    pub slabs: EntityStore<Slab>,
    pub regions: EntityStore<Region>,
    pub beam_layouts: BeamLayouts,
    pub column_layouts: ColumnLayouts,
    pub load_tables: EntityStore<FrameLoadTable>,
    pub beam_loads: EntityStore<BeamLoad>,
}

/// Overview printed by `mdl summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub counts: BTreeMap<String, usize>,
    pub floors: Vec<u32>,
    pub bounds: Option<Bounds>,
    /// Lexicographically smallest node, the usual replication origin
    pub origin: Option<u32>,
}

// ============================================================================
// Parsing and writing
// ============================================================================

fn parse_present<T: Record + Indexed>(model: &ModelFile) -> ModelResult<EntityStore<T>> {
    match model.body(T::BLOCK) {
        Some(body) => parse_block(body),
        None => Ok(EntityStore::new()),
    }
}

fn parse_present_layouts<T: LayoutRecord>(model: &ModelFile) -> ModelResult<Layouts<T>> {
    match model.body(T::BLOCK) {
        Some(body) => parse_layouts(body),
        None => Ok(Layouts::new()),
    }
}

/// Blocks the file never had stay absent while their store is empty.
fn write_block<T: Record + Indexed>(model: &mut ModelFile, store: &EntityStore<T>) {
    if model.has_block(T::BLOCK) || !store.is_empty() {
        model.set_body(T::BLOCK, format_block(store));
    }
}

fn write_layouts<T: LayoutRecord>(model: &mut ModelFile, layouts: &Layouts<T>) {
    if model.has_block(T::BLOCK) || !layouts.is_empty() {
        model.set_body(T::BLOCK, format_layouts(layouts));
    }
}

fn check_ref<T: Indexed>(store: &EntityStore<T>, kind: &str, index: u32, field: &str, target: u32) -> ModelResult<()> {
    if store.contains(target) {
        Ok(())
    } else {
        Err(ModelError::missing_reference(kind, index, field, T::KIND, target))
    }
}

/// Move an outcome's warnings into `warnings` and keep the value.
fn collect<T>(outcome: Outcome<T>, warnings: &mut Vec<ModelError>) -> T {
    warnings.extend(outcome.warnings);
    outcome.value
}

impl ModelGraph {
    /// Parse every modeled block present in `model`. Missing blocks give
    /// empty stores. Design names are reconciled with their sections.
    pub fn from_model_file(model: &ModelFile) -> ModelResult<Self> {
        let sections: EntityStore<Section> = parse_present(model)?;
        let (designs, renamed) = reconcile_design_names(&parse_present(model)?, &sections)?;
        if renamed > 0 {
            info!(renamed, "design names reconciled with sections");
        }

        let graph = ModelGraph {
            nodes: parse_present(model)?,
            materials: parse_present(model)?,
            sections,
            designs,
            elsets: parse_present(model)?,
            slabs: parse_present(model)?,
            regions: parse_present(model)?,
            beam_layouts: parse_present_layouts(model)?,
            column_layouts: parse_present_layouts(model)?,
            load_tables: parse_present(model)?,
            beam_loads: parse_present(model)?,
        };
        debug!(counts = ?graph.counts(), "parsed model graph");
        Ok(graph)
    }

    /// Replace every modeled block in `model`. Other blocks are untouched.
    ///
    /// The graph is validated first; on a dangling reference `model` is left
    /// as it was.
    pub fn write_into(&self, model: &mut ModelFile) -> ModelResult<()> {
        self.validate()?;
        write_block(model, &self.nodes);
        write_block(model, &self.materials);
        write_block(model, &self.sections);
        write_block(model, &self.designs);
        write_block(model, &self.elsets);
        write_block(model, &self.slabs);
        write_block(model, &self.regions);
        write_layouts(model, &self.beam_layouts);
        write_layouts(model, &self.column_layouts);
        write_block(model, &self.load_tables);
        write_block(model, &self.beam_loads);
        Ok(())
    }

    /// Check every cross-reference; the first dangling one is returned.
    pub fn validate(&self) -> ModelResult<()> {
        for elset in &self.elsets {
            check_ref(&self.materials, Elset::KIND, elset.index, "material", elset.material.get())?;
            check_ref(&self.sections, Elset::KIND, elset.index, "section", elset.section.get())?;
            check_ref(&self.designs, Elset::KIND, elset.index, "design", elset.design.get())?;
        }
        self.validate_layouts(&self.beam_layouts)?;
        self.validate_layouts(&self.column_layouts)?;
        for slab in &self.slabs {
            check_ref(&self.elsets, Slab::KIND, slab.index, "elset", slab.elset.get())?;
        }
        for region in &self.regions {
            check_ref(&self.slabs, Region::KIND, region.index, "slab", region.slab.get())?;
            for edge in region.edges {
                check_ref(&self.nodes, Region::KIND, region.index, "edges", edge.get())?;
            }
        }
        for load in &self.beam_loads {
            check_ref(&self.load_tables, BeamLoad::KIND, load.index, "load_table", load.table.get())?;
            let floor = self.beam_layouts.get(load.floor).ok_or_else(|| {
                ModelError::missing_reference(BeamLoad::KIND, load.index, "floor", "BeamLayout", load.floor)
            })?;
            check_ref(&floor.items, BeamLoad::KIND, load.index, "beam_id", load.beam_id)?;
        }
        Ok(())
    }

    fn validate_layouts<T: LayoutItem + PointBound>(&self, layouts: &Layouts<T>) -> ModelResult<()> {
        for layout in layouts {
            for item in &layout.items {
                for node in item.points() {
                    check_ref(&self.nodes, T::KIND, item.index(), "node", node.get())?;
                }
                check_ref(&self.elsets, T::KIND, item.index(), "elset", item.elset().get())?;
            }
        }
        Ok(())
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog {
            elsets: &self.elsets,
            materials: &self.materials,
            sections: &self.sections,
            designs: &self.designs,
        }
    }

    pub fn used_elsets(&self) -> BTreeSet<ElsetRef> {
        used_elsets(&self.beam_layouts, &self.column_layouts, &self.slabs)
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        let beams: usize = self.beam_layouts.iter().map(Layout::len).sum();
        let columns: usize = self.column_layouts.iter().map(Layout::len).sum();
        [
            ("nodes", self.nodes.len()),
            ("materials", self.materials.len()),
            ("sections", self.sections.len()),
            ("designs", self.designs.len()),
            ("elsets", self.elsets.len()),
            ("slabs", self.slabs.len()),
            ("regions", self.regions.len()),
            ("beams", beams),
            ("columns", columns),
            ("load_tables", self.load_tables.len()),
            ("beam_loads", self.beam_loads.len()),
        ]
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect()
    }

    pub fn summary(&self) -> GraphSummary {
        let mut floors: Vec<u32> = self
            .beam_layouts
            .index_list()
            .into_iter()
            .chain(self.column_layouts.index_list())
            .chain(self.regions.iter().map(|r| r.floor))
            .collect();
        floors.sort_unstable();
        floors.dedup();
        GraphSummary {
            counts: self.counts(),
            floors,
            bounds: bounds(&self.nodes),
            origin: nearest_origin(&self.nodes).map(|n| n.index),
        }
    }

    /// The part of the graph standing entirely on `selection`.
    ///
    /// Beams, columns and regions are kept when every node they touch is
    /// selected; loads follow their beams. Catalogs, slabs and load tables
    /// are kept whole. Layout items, regions and loads are renumbered so the
    /// result can be written as-is.
    pub fn restricted_to(&self, selection: &EntityStore<Node>) -> ModelResult<ModelGraph> {
        let (beam_layouts, beam_map) = restrict_layouts(&self.beam_layouts, selection)?;
        let (column_layouts, _) = restrict_layouts(&self.column_layouts, selection)?;

        let regions = self
            .regions
            .iter()
            .filter(|r| r.edges.iter().all(|e| selection.contains(e.get())))
            .cloned();
        let beam_loads = self.beam_loads.iter().filter_map(|load| {
            beam_map.get(&(load.floor, load.beam_id)).map(|&beam_id| BeamLoad {
                beam_id,
                ..load.clone()
            })
        });

        Ok(ModelGraph {
            nodes: selection.clone(),
            regions: renumbered(regions)?,
            beam_layouts,
            column_layouts,
            beam_loads: renumbered(beam_loads)?,
            ..self.clone()
        })
    }

    // ========================================================================
    // High-level passes
    // ========================================================================

    /// Reflect the frame, regions and loads about `line`.
    ///
    /// With `include_original` the images are added next to the originals;
    /// otherwise the geometry is replaced by its mirror image and node
    /// indices are kept. Catalogs are carried over unchanged.
    pub fn mirror(
        &self,
        line: &MirrorLine,
        include_original: bool,
        policy: ConflictPolicy,
        geometry: &GeometryConfig,
    ) -> ModelResult<(ModelGraph, TransformReport)> {
        let mut warnings = Vec::new();
        let nodes = mirror_nodes(&self.nodes, line, include_original, geometry);

        let beams = mirror_beams(
            &self.beam_layouts,
            &self.beam_layouts,
            &self.nodes,
            &nodes,
            line,
            include_original,
            geometry,
        )?;
        let beam_layouts = collect(beams, &mut warnings);
        let columns = mirror_columns(
            &self.column_layouts,
            &self.column_layouts,
            &self.nodes,
            &nodes,
            line,
            include_original,
            geometry,
        )?;
        let column_layouts = collect(columns, &mut warnings);
        let regions = mirror_regions(&self.regions, &self.nodes, &nodes, line, include_original, geometry)?;
        let regions = collect(regions, &mut warnings);

        let sources = BeamLoadSources {
            layouts_original: &self.beam_layouts,
            layouts_final: &beam_layouts,
            source_nodes: &self.nodes,
            target_nodes: &nodes,
        };
        let loads = mirror_beam_loads(&self.beam_loads, &sources, line, include_original, policy, geometry)?;
        let beam_loads = collect(loads, &mut warnings);

        let mirrored = ModelGraph {
            nodes,
            materials: self.materials.clone(),
            sections: self.sections.clone(),
            designs: self.designs.clone(),
            elsets: self.elsets.clone(),
            slabs: self.slabs.clone(),
            regions,
            beam_layouts,
            column_layouts,
            load_tables: self.load_tables.clone(),
            beam_loads,
        };
        let mut report = TransformReport::new("mirror", &self.counts(), &mirrored.counts(), warnings)
            .with_note(format!("load policy: {policy}"));
        if !include_original {
            report = report.with_note("original geometry replaced by its image");
        }
        info!(warnings = report.warnings.len(), "mirror finished");
        Ok((mirrored, report))
    }

    /// Copy `template` over `grid` into this graph.
    ///
    /// The template's catalog is merged into ours first (nothing is
    /// removed) and both sides are rebound to the merged elsets. Template
    /// slabs are matched to ours by name and template load tables by
    /// content; unmatched ones are appended. A template without an elset
    /// table is taken to share our catalog numbering.
    pub fn replicate_from(
        &self,
        template: &ModelGraph,
        grid: &Grid,
        policy: ConflictPolicy,
        geometry: &GeometryConfig,
    ) -> ModelResult<(ModelGraph, TransformReport)> {
        let mut report_notes = Vec::new();
        let (catalog, base, copy) = if template.elsets.is_empty() {
            report_notes.push("template has no elset table; catalog numbering shared".to_string());
            (self.catalog_stores(), self.frame(), template.frame())
        } else {
            let merge = ElsetMerger::new().merge(&self.catalog(), &template.catalog(), &self.used_elsets())?;
            let base = LayoutRebinder::new(&merge.reorder_map, &merge.elsets).rebind_frame(self)?;
            let copy = LayoutRebinder::new(&merge.imported_map, &merge.elsets).rebind_frame(template)?;
            let stores = CatalogStores {
                materials: merge.materials,
                sections: merge.sections,
                designs: merge.designs,
                elsets: merge.elsets,
            };
            (stores, base, copy)
        };

        let (slabs, template_regions) = if template.slabs.is_empty() {
            (base.slabs, template.regions.clone())
        } else {
            let (slabs, slab_map) = adopt_slabs(&base.slabs, &copy.slabs)?;
            (slabs, remap_regions(&template.regions, &slab_map)?)
        };
        let (load_tables, template_loads) = if template.load_tables.is_empty() {
            (self.load_tables.clone(), template.beam_loads.clone())
        } else {
            let (tables, table_map) = adopt_load_tables(&self.load_tables, &template.load_tables)?;
            (tables, remap_loads(&template.beam_loads, &table_map)?)
        };

        let mut warnings = Vec::new();
        let nodes = replicate_nodes(&self.nodes, &template.nodes, grid, geometry);

        let beams = replicate_beams(
            &base.beam_layouts,
            &copy.beam_layouts,
            &template.nodes,
            &nodes,
            grid,
            true,
            geometry,
        )?;
        let beam_layouts = collect(beams, &mut warnings);
        let columns = replicate_columns(
            &base.column_layouts,
            &copy.column_layouts,
            &template.nodes,
            &nodes,
            grid,
            true,
            geometry,
        )?;
        let column_layouts = collect(columns, &mut warnings);
        let regions = replicate_regions(&self.regions, &template_regions, &template.nodes, &nodes, grid, true, geometry)?;
        let regions = collect(regions, &mut warnings);

        let sources = BeamLoadSources {
            layouts_original: &copy.beam_layouts,
            layouts_final: &beam_layouts,
            source_nodes: &template.nodes,
            target_nodes: &nodes,
        };
        let loads = replicate_beam_loads(&self.beam_loads, &template_loads, &sources, grid, true, policy, geometry)?;
        let beam_loads = collect(loads, &mut warnings);

        let replicated = ModelGraph {
            nodes,
            materials: catalog.materials,
            sections: catalog.sections,
            designs: catalog.designs,
            elsets: catalog.elsets,
            slabs,
            regions,
            beam_layouts,
            column_layouts,
            load_tables,
            beam_loads,
        };
        let mut report = TransformReport::new("replicate", &self.counts(), &replicated.counts(), warnings)
            .with_note(format!("load policy: {policy}"));
        for note in report_notes {
            report = report.with_note(note);
        }
        info!(warnings = report.warnings.len(), "replicate finished");
        Ok((replicated, report))
    }

    /// Merge the catalog of `imported` into ours and rebind our items.
    ///
    /// With `remove_missing`, entries the import lacks are dropped unless an
    /// item of this graph still uses them.
    pub fn merge_references(
        &self,
        imported: &ModelGraph,
        remove_missing: bool,
    ) -> ModelResult<(ModelGraph, TransformReport)> {
        let merge = ElsetMerger::new()
            .remove_missing(remove_missing)
            .merge(&self.catalog(), &imported.catalog(), &self.used_elsets())?;
        let frame = LayoutRebinder::new(&merge.reorder_map, &merge.elsets).rebind_frame(self)?;

        let merged = ModelGraph {
            nodes: self.nodes.clone(),
            materials: merge.materials,
            sections: merge.sections,
            designs: merge.designs,
            elsets: merge.elsets,
            slabs: frame.slabs,
            regions: self.regions.clone(),
            beam_layouts: frame.beam_layouts,
            column_layouts: frame.column_layouts,
            load_tables: self.load_tables.clone(),
            beam_loads: self.beam_loads.clone(),
        };
        let mut report = TransformReport::new("merge", &self.counts(), &merged.counts(), Vec::new());
        if merge.removed_any {
            report = report.with_note("entries missing from the import were removed");
        }
        info!(removed_any = merge.removed_any, "merge finished");
        Ok((merged, report))
    }

    fn catalog_stores(&self) -> CatalogStores {
        CatalogStores {
            materials: self.materials.clone(),
            sections: self.sections.clone(),
            designs: self.designs.clone(),
            elsets: self.elsets.clone(),
        }
    }

    fn frame(&self) -> Frame {
        Frame {
            beam_layouts: self.beam_layouts.clone(),
            column_layouts: self.column_layouts.clone(),
            slabs: self.slabs.clone(),
        }
    }
}

// ============================================================================
// Pass helpers
// ============================================================================

struct CatalogStores {
    materials: EntityStore<Material>,
    sections: EntityStore<Section>,
    designs: EntityStore<Design>,
    elsets: EntityStore<Elset>,
}

/// Everything that carries an elset reference.
struct Frame {
    beam_layouts: BeamLayouts,
    column_layouts: ColumnLayouts,
    slabs: EntityStore<Slab>,
}

impl LayoutRebinder<'_> {
    fn rebind_frame(&self, graph: &ModelGraph) -> ModelResult<Frame> {
        Ok(Frame {
            beam_layouts: self.rebind_layouts(&graph.beam_layouts)?,
            column_layouts: self.rebind_layouts(&graph.column_layouts)?,
            slabs: self.rebind_slabs(&graph.slabs)?,
        })
    }
}

fn renumbered<T: Indexed>(items: impl IntoIterator<Item = T>) -> ModelResult<EntityStore<T>> {
    EntityStore::from_items(items.into_iter().enumerate().map(|(i, mut item)| {
        item.set_index(i as u32 + 1);
        item
    }))
}

/// Keep fully selected items, renumbered per floor. Also returns
/// `(floor, old index) -> new index`.
fn restrict_layouts<T: LayoutItem + PointBound>(
    layouts: &Layouts<T>,
    selection: &EntityStore<Node>,
) -> ModelResult<(Layouts<T>, BTreeMap<(u32, u32), u32>)> {
    let mut result = Layouts::new();
    let mut map = BTreeMap::new();
    for layout in layouts {
        let mut kept = Layout::new(layout.floor);
        for item in &layout.items {
            if !item.points().iter().all(|n| selection.contains(n.get())) {
                continue;
            }
            let new_index = kept.next_index();
            map.insert((layout.floor, item.index()), new_index);
            let mut item = item.clone();
            item.set_index(new_index);
            kept.items.add(item)?;
        }
        if !kept.is_empty() {
            result.add(kept)?;
        }
    }
    Ok((result, map))
}

/// Template slabs matched to base slabs by name; unmatched ones are appended
/// under fresh indices.
fn adopt_slabs(
    base: &EntityStore<Slab>,
    template: &EntityStore<Slab>,
) -> ModelResult<(EntityStore<Slab>, BTreeMap<u32, u32>)> {
    let mut slabs = base.clone();
    let mut map = BTreeMap::new();
    for slab in template {
        let existing = slabs.iter().find(|s| s.name() == slab.name()).map(|s| s.index);
        let index = match existing {
            Some(index) => index,
            None => {
                let index = slabs.max_index() + 1;
                slabs.add(Slab {
                    index,
                    ..slab.clone()
                })?;
                debug!(name = %slab.name, index, "adopted template slab");
                index
            }
        };
        map.insert(slab.index, index);
    }
    Ok((slabs, map))
}

fn same_table(a: &FrameLoadTable, b: &FrameLoadTable) -> bool {
    a.direction == b.direction && a.q == b.q && a.s1 == b.s1 && a.s2 == b.s2 && a.misc == b.misc && a.note == b.note
}

/// Template load tables matched to base tables by content.
fn adopt_load_tables(
    base: &EntityStore<FrameLoadTable>,
    template: &EntityStore<FrameLoadTable>,
) -> ModelResult<(EntityStore<FrameLoadTable>, BTreeMap<u32, u32>)> {
    let mut tables = base.clone();
    let mut map = BTreeMap::new();
    for table in template {
        let existing = tables.iter().find(|t| same_table(t, table)).map(|t| t.index);
        let index = match existing {
            Some(index) => index,
            None => {
                let index = tables.max_index() + 1;
                tables.add(FrameLoadTable {
                    index,
                    ..table.clone()
                })?;
                index
            }
        };
        map.insert(table.index, index);
    }
    Ok((tables, map))
}

fn remap_regions(regions: &EntityStore<Region>, slab_map: &BTreeMap<u32, u32>) -> ModelResult<EntityStore<Region>> {
    let remapped = regions
        .iter()
        .map(|region| {
            let old = region.slab.get();
            let &new = slab_map
                .get(&old)
                .ok_or_else(|| ModelError::missing_reference(Region::KIND, region.index, "slab", Slab::KIND, old))?;
            Ok(Region {
                slab: SlabRef(new),
                ..region.clone()
            })
        })
        .collect::<ModelResult<Vec<_>>>()?;
    EntityStore::from_items(remapped)
}

fn remap_loads(loads: &EntityStore<BeamLoad>, table_map: &BTreeMap<u32, u32>) -> ModelResult<EntityStore<BeamLoad>> {
    let remapped = loads
        .iter()
        .map(|load| {
            let old = load.table.get();
            let &new = table_map.get(&old).ok_or_else(|| {
                ModelError::missing_reference(BeamLoad::KIND, load.index, "load_table", FrameLoadTable::KIND, old)
            })?;
            Ok(BeamLoad {
                table: LoadTableRef(new),
                ..load.clone()
            })
        })
        .collect::<ModelResult<Vec<_>>>()?;
    EntityStore::from_items(remapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{NodeRef, SectionRef};
    use crate::spatial::select_by_polygon;
    use glam::{DVec2, DVec3};

    /// One 5 x 4 bay: two girders, a column, a slab region and a beam load.
    const BAY: &str = "\
*NODEXY*
   1  0 0  0
   2  5 0  0
   3  5 4  0
   4  0 4  0
*MATERIAL*
   1  1 ISOTROPIC FC30 0 0 0 0   30 0  0.000  0.000
      0 1E-005 0.0024 239761.6 99900.7 0.2
*SECTION*
   1   2 RECT         0 0 0 0    0.00    0.00 G30X60
      30 60 30 12
   2   1 THICKNESS    0 0 0 0    0.00    0.00 S12
      12
*DESIGN*
   1   2 CONCRETE_GIRDER G30X60 2 1 14 1 0 0 1
      0.9 0.9 0.65 0.7 0.75 0.75 0.65 0.75   1 1 1 1 1   1 1 1 1 1
      CONCRETE = 30 60 30 12 4  235000 250 250 30  4000 16 0.5 4  2400 13 2 200  1 4000 10 150  0 0 0
   2   1 CONCRETE_SLAB S12 5 1 14 1 0 0 1
      0.9 0.9 0.65 0.7 0.75 0.75 0.65 0.75   1 1 1 1 1   1 1 1 1 1
      CONCRETE = 12 0 0 0 2  235000 250 250 30  4000 10 0.5 2  2400 10 0 0  1 2400 10 200  0 0 0
*ELSET*
   1   1   1  1  0
   2   1   2  2  0
*FLOORSLAB*
   1  S12        1  2 12 0.1 0.25 0 0
*REGION*
   1  1 0 0   1,  2,  3,  4 0 0
*LAYBEAM*
  FLOOR BEAM LAYOUT #1, Total Beam = 2
    1   2  1  0 1
    2   3  1  0 1
*LAYCOL*
  COLUMN LAYOUT #1, Total Column = 1
     1  1   0 0
*FLOADTAB*
    1   6  -0.5,0,1,0,0  DL
*BLOAD*
   1   1   1   1
*PARAMETER*
  12 3
";

    fn bay() -> ModelGraph {
        ModelGraph::from_model_file(&ModelFile::parse(BAY)).unwrap()
    }

    fn count(report: &TransformReport, name: &str) -> usize {
        report.counts[name].after
    }

    #[test]
    fn test_parse_and_validate() {
        let graph = bay();
        graph.validate().unwrap();
        let counts = graph.counts();
        assert_eq!(counts["nodes"], 4);
        assert_eq!(counts["beams"], 2);
        assert_eq!(counts["designs"], 2);
        assert_eq!(graph.beam_layouts.get(1).unwrap().get_item(2).unwrap().end, NodeRef(3));
    }

    #[test]
    fn test_validate_reports_dangling_reference() {
        let mut graph = bay();
        graph.elsets.get_mut(2).unwrap().section = SectionRef(9);
        let err = graph.validate().unwrap_err();
        assert_eq!(err, ModelError::missing_reference("Elset", 2, "section", "Section", 9));

        let mut graph = bay();
        graph.beam_loads.get_mut(1).unwrap().beam_id = 7;
        let err = graph.validate().unwrap_err();
        assert_eq!(err, ModelError::missing_reference("BeamLoad", 1, "beam_id", "Beam", 7));
    }

    #[test]
    fn test_write_into_keeps_unmodeled_blocks() {
        let mut model = ModelFile::parse(BAY);
        bay().write_into(&mut model).unwrap();
        assert_eq!(model.body("PARAMETER").unwrap(), &["  12 3".to_string()]);
        let reread = ModelGraph::from_model_file(&model).unwrap();
        assert_eq!(reread, bay());
    }

    #[test]
    fn test_write_into_rejects_dangling_elset() {
        let mut graph = bay();
        let layout = graph.beam_layouts.get_mut(1).unwrap();
        layout.items.get_mut(1).unwrap().elset = ElsetRef(99);

        let mut model = ModelFile::parse(BAY);
        let untouched = model.clone();
        let err = graph.write_into(&mut model).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_REFERENCE");
        assert_eq!(err, ModelError::missing_reference("Beam", 1, "elset", "Elset", 99));
        assert_eq!(model, untouched);
    }

    #[test]
    fn test_write_into_skips_absent_empty_blocks() {
        let mut model = ModelFile::parse("*NODEXY*\n   1  0 0  0\n");
        let graph = ModelGraph::from_model_file(&model).unwrap();
        graph.write_into(&mut model).unwrap();
        let headers: Vec<&str> = model.headers().collect();
        assert_eq!(headers, vec!["NODEXY"]);
    }

    #[test]
    fn test_mirror_about_right_edge() {
        let graph = bay();
        let line = MirrorLine::new(DVec2::new(5.0, 0.0), DVec2::new(5.0, 1.0), 1e-6).unwrap();
        let (mirrored, report) = graph.mirror(&line, true, ConflictPolicy::Skip, &GeometryConfig::default()).unwrap();

        assert!(!report.has_warnings());
        assert_eq!(count(&report, "nodes"), 6);
        // 2-3 lies on the line and maps onto itself
        assert_eq!(count(&report, "beams"), 3);
        assert_eq!(count(&report, "columns"), 2);
        assert_eq!(count(&report, "regions"), 2);
        assert_eq!(count(&report, "beam_loads"), 2);
        mirrored.validate().unwrap();

        let image = mirrored.nodes.get(5).unwrap();
        assert_eq!(image.position(), DVec3::new(10.0, 0.0, 0.0));
        let load = mirrored.beam_loads.get(2).unwrap();
        assert_eq!((load.floor, load.beam_id), (1, 3));
    }

    #[test]
    fn test_replicate_merges_catalog_and_rebinds() {
        let graph = bay();
        let grid = Grid::new([1, 0, 0], DVec3::new(5.0, 0.0, 0.0));
        let (replicated, report) = graph
            .replicate_from(&graph, &grid, ConflictPolicy::Skip, &GeometryConfig::default())
            .unwrap();

        assert!(!report.has_warnings());
        assert_eq!(count(&report, "nodes"), 6);
        assert_eq!(count(&report, "beams"), 4);
        assert_eq!(count(&report, "columns"), 2);
        assert_eq!(count(&report, "regions"), 2);
        assert_eq!(count(&report, "beam_loads"), 2);
        assert_eq!(count(&report, "slabs"), 1);
        assert_eq!(count(&report, "load_tables"), 1);
        replicated.validate().unwrap();

        // slab designs sort ahead of girders
        assert_eq!(replicated.designs.get(1).unwrap().name, "S12");
        assert_eq!(replicated.sections.get(2).unwrap().name, "G30X60");
        for layout in &replicated.beam_layouts {
            assert!(layout.items.iter().all(|b| b.elset == ElsetRef(2)));
        }
        assert_eq!(replicated.slabs.get(1).unwrap().elset, ElsetRef(1));
    }

    #[test]
    fn test_merge_keeps_used_entries() {
        let graph = bay();
        let (merged, report) = graph.merge_references(&ModelGraph::default(), true).unwrap();
        assert_eq!(count(&report, "designs"), 2);
        assert!(report.notes.is_empty());
        merged.validate().unwrap();
        assert_eq!(merged.beam_layouts.get(1).unwrap().get_item(1).unwrap().elset, ElsetRef(2));
    }

    #[test]
    fn test_restricted_to_polygon() {
        let graph = bay();
        let selection = select_by_polygon(&graph.nodes, &[NodeRef(1), NodeRef(2), NodeRef(3)]);
        let part = graph.restricted_to(&selection).unwrap();

        let counts = part.counts();
        assert_eq!(counts["nodes"], 3);
        assert_eq!(counts["beams"], 2);
        assert_eq!(counts["columns"], 1);
        assert_eq!(counts["regions"], 0);
        assert_eq!(counts["beam_loads"], 1);
        assert_eq!(counts["designs"], 2);
    }

    #[test]
    fn test_summary() {
        let summary = bay().summary();
        assert_eq!(summary.floors, vec![1]);
        assert_eq!(summary.origin, Some(1));
        let b = summary.bounds.unwrap();
        assert_eq!((b.max_x, b.max_y), (5.0, 4.0));
    }
}
