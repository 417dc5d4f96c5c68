//! # mdl - Model Transformation CLI
//!
//! Drives the `mdl_core` passes on `.MDL` files:
//!
//! ```text
//! mdl summary tower.mdl
//! mdl mirror tower.mdl --line 12 0 12 1 --include-original -o tower_full.mdl
//! mdl replicate tower.mdl --template bay.mdl --grid 3 0 0 --step 6 0 0 -o tower.mdl
//! mdl merge tower.mdl --import catalog.mdl --remove-missing -o tower.mdl
//! ```
//!
//! Every transform prints its JSON report to stdout. Without `-o` nothing is
//! written.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use glam::{DVec2, DVec3};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use mdl_core::config::{ConfigError, EngineConfig};
use mdl_core::file_io::{load_model_with_lock_check, save_json, save_model};
use mdl_core::ids::NodeRef;
use mdl_core::spatial::select_by_polygon;
use mdl_core::{ConflictPolicy, FileLock, Grid, MirrorLine, ModelFile, ModelGraph, TransformReport};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replicate, mirror and merge structural .MDL models", long_about = None)]
struct Cli {
    /// Config file (overrides MDL_CONFIG and ./config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print entity counts, floors and plan extents
    Summary {
        model: PathBuf,
    },
    /// Reflect the model about a plan line
    Mirror {
        model: PathBuf,
        /// Two points on the line: x1 y1 x2 y2
        #[arg(long, num_args = 4, value_names = ["X1", "Y1", "X2", "Y2"], allow_negative_numbers = true)]
        line: Vec<f64>,
        /// Keep the original geometry next to its image
        #[arg(long)]
        include_original: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Copy a template model over a translation grid
    Replicate {
        base: PathBuf,
        #[arg(long)]
        template: PathBuf,
        /// Copies along x, y and z
        #[arg(long, num_args = 3, value_names = ["NX", "NY", "NZ"])]
        grid: Vec<u32>,
        /// Grid spacing along x, y and z
        #[arg(long, num_args = 3, value_names = ["DX", "DY", "DZ"], allow_negative_numbers = true)]
        step: Vec<f64>,
        /// Restrict the template to the polygon through these node indices
        #[arg(long, num_args = 3.., value_name = "NODE")]
        boundary: Option<Vec<u32>>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Merge materials, designs, sections and elsets from another model
    Merge {
        model: PathBuf,
        #[arg(long = "import")]
        imported: PathBuf,
        /// Drop catalog entries the import lacks, unless still used
        #[arg(long)]
        remove_missing: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Where to write the transformed model
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Also save the JSON report to this path
    #[arg(long)]
    report: Option<PathBuf>,
    /// Beam load conflict policy: skip, add or replace
    #[arg(long)]
    policy: Option<ConflictPolicy>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.as_deref());
    init_logging(&config);

    match cli.command {
        Command::Summary { model } => {
            let (_, graph) = read_graph(&model)?;
            println!("{}", serde_json::to_string_pretty(&graph.summary())?);
        }
        Command::Mirror {
            model,
            line,
            include_original,
            output,
        } => {
            let (file, graph) = read_graph(&model)?;
            let line = MirrorLine::new(
                DVec2::new(line[0], line[1]),
                DVec2::new(line[2], line[3]),
                config.geometry.tolerance,
            )?;
            let policy = output.policy.unwrap_or(config.loads.default_policy);
            let (result, report) = graph.mirror(&line, include_original, policy, &config.geometry)?;
            finish(file, &result, &report, &output, &config)?;
        }
        Command::Replicate {
            base,
            template,
            grid,
            step,
            boundary,
            output,
        } => {
            let (file, graph) = read_graph(&base)?;
            let (_, mut template_graph) = read_graph(&template)?;
            if let Some(boundary) = boundary {
                let corners: Vec<NodeRef> = boundary.into_iter().map(NodeRef).collect();
                let selection = select_by_polygon(&template_graph.nodes, &corners);
                if selection.is_empty() {
                    bail!("boundary {corners:?} selects no template nodes");
                }
                info!(nodes = selection.len(), "template restricted to boundary");
                template_graph = template_graph.restricted_to(&selection)?;
            }

            let grid = Grid::new([grid[0], grid[1], grid[2]], DVec3::new(step[0], step[1], step[2]));
            let policy = output.policy.unwrap_or(config.loads.default_policy);
            let (result, report) = graph.replicate_from(&template_graph, &grid, policy, &config.geometry)?;
            finish(file, &result, &report, &output, &config)?;
        }
        Command::Merge {
            model,
            imported,
            remove_missing,
            output,
        } => {
            let (file, graph) = read_graph(&model)?;
            let (_, imported_graph) = read_graph(&imported)?;
            let (result, report) = graph.merge_references(&imported_graph, remove_missing)?;
            finish(file, &result, &report, &output, &config)?;
        }
    }
    Ok(())
}

fn read_graph(path: &Path) -> Result<(ModelFile, ModelGraph)> {
    let (file, lock) = load_model_with_lock_check(path).with_context(|| format!("reading {}", path.display()))?;
    if let Some(lock) = lock {
        warn!(path = %path.display(), holder = %lock.holder(), "model is open elsewhere");
    }
    let graph = ModelGraph::from_model_file(&file).with_context(|| format!("parsing {}", path.display()))?;
    graph.validate().with_context(|| format!("validating {}", path.display()))?;
    Ok((file, graph))
}

/// Print the report, then write the model and report files if asked to.
fn finish(
    mut file: ModelFile,
    graph: &ModelGraph,
    report: &TransformReport,
    output: &OutputArgs,
    config: &EngineConfig,
) -> Result<()> {
    println!("{}", report.to_json()?);

    if let Some(path) = &output.output {
        graph
            .write_into(&mut file)
            .context("transformed model has dangling references")?;
        let _lock = FileLock::acquire(path, config.io.lock_user())?;
        save_model(&file, path).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "model written");
    } else {
        info!("no output path given; model not written");
    }

    if let Some(path) = &output.report {
        save_json(report, path).with_context(|| format!("writing report {}", path.display()))?;
    }
    Ok(())
}

fn load_configuration(override_path: Option<&Path>) -> EngineConfig {
    let loaded = match override_path {
        Some(path) => EngineConfig::from_file(path),
        None => EngineConfig::discover(),
    };
    loaded.unwrap_or_else(|err| {
        // logging is not up yet
        match &err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } | ConfigError::Invalid { path, .. } => {
                eprintln!("config {} ignored: {err}", path.display());
            }
            ConfigError::Context { .. } => eprintln!("config ignored: {err}"),
        }
        EngineConfig::default()
    })
}

fn init_logging(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // reports go to stdout, logs to stderr
    let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}
