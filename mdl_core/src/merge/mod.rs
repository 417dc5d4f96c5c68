//! # Reference Merger
//!
//! Merges catalog stores (materials, designs, sections, elsets) from an
//! imported model into an existing one, keyed by name, and reports how
//! every surviving index moved so dependent items can be rebound.
//!
//! ```rust
//! use mdl_core::merge::{merge_and_reorder, MergeOptions};
//! # use mdl_core::entities::Material;
//! # use mdl_core::store::EntityStore;
//! # fn run(existing: EntityStore<Material>, imported: EntityStore<Material>) -> mdl_core::errors::ModelResult<()> {
//! let outcome = merge_and_reorder(&existing, &imported, &MergeOptions::default())?;
//! for (old, new) in &outcome.reorder_map {
//!     println!("material {old} -> {new}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod elsets;
pub mod reorder;
pub mod sort_key;

pub use elsets::{reconcile_design_names, Catalog, ElsetMerge, ElsetMerger};
pub use reorder::{merge_and_reorder, MergeOptions, MergeOutcome};
pub use sort_key::{MergeOrder, NameKey, SortKey};
