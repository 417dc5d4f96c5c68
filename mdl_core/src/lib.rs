//! # mdl_core - Structural Model Graph Engine
//!
//! `mdl_core` reads a structural analysis model (`.MDL` text blocks) into a
//! typed entity graph and performs structural edits on it: replicating a
//! template over a translation grid, mirroring about a plan line, and merging
//! reference catalogs (materials, designs, sections, elsets) from another
//! model. Every entity and report is JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Borrow in, return new**: engine passes never mutate their inputs
//! - **Handles, not pointers**: references are typed integer indices
//! - **Tolerant geometry**: points match by rounded coordinates
//! - **Rich Errors**: structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use mdl_core::graph::ModelGraph;
//! use mdl_core::model_file::ModelFile;
//!
//! let model = ModelFile::parse("*NODEXY*\n   1  0 0  0\n   2  5 0  0\n");
//! let graph = ModelGraph::from_model_file(&model).unwrap();
//! graph.validate().unwrap();
//!
//! let json = serde_json::to_string_pretty(&graph.summary()).unwrap();
//! assert!(json.contains("\"nodes\": 2"));
//! ```
//!
//! ## Modules
//!
//! - [`model_file`] - Block framing of `.MDL` text
//! - [`records`] - Per-kind text codecs
//! - [`entities`] - Typed records and floor layouts
//! - [`store`] - Indexed entity store and capability traits
//! - [`spatial`] - Tolerance-based node lookup and plan queries
//! - [`geometry`] - Replicate and mirror passes
//! - [`merge`] - Name-keyed catalog merge and elset rebuild
//! - [`rebind`] - Moving layout items onto merged elsets
//! - [`graph`] - The model aggregate and its high-level passes
//! - [`errors`] - Structured error types
//! - [`config`] - Engine configuration
//! - [`file_io`] - File operations with atomic saves and locking

pub mod config;
pub mod entities;
pub mod errors;
pub mod file_io;
pub mod geometry;
pub mod graph;
pub mod ids;
pub mod merge;
pub mod model_file;
pub mod rebind;
pub mod records;
pub mod report;
pub mod spatial;
pub mod store;

// Re-export commonly used types at crate root for convenience
pub use config::EngineConfig;
pub use errors::{ModelError, ModelResult};
pub use file_io::{load_model, save_model, FileLock};
pub use geometry::{ConflictPolicy, Grid, MirrorLine};
pub use graph::{GraphSummary, ModelGraph};
pub use model_file::ModelFile;
pub use report::TransformReport;
pub use store::EntityStore;
