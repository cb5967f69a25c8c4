//! The CLI driver (`spec.md` §6): argument parsing, GraphML loading by the
//! fixed filename convention decided in `DESIGN.md`, orchestration of
//! `setup`/`reset`/`run` with a bounded retry loop, and exit-code mapping.
//!
//! This module is the one piece of the crate that is allowed to know about
//! `std::fs`, `std::process`, and `tracing-subscriber`'s global state; the
//! solver core never touches any of them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

use crate::error::{RunOutcome, SetupError};
use crate::graph::Graph;
use crate::io::graphml::{self, GraphmlDocument, GraphmlError};
use crate::solver::SolverState;
use crate::template::Template;

#[derive(Parser, Debug)]
#[command(name = "graph-wfc", version, about = "Wave Function Collapse over arbitrary directed or undirected graphs")]
pub struct Args {
    /// Working directory containing `gi.graphml`, one or more `gl*.graphml`,
    /// and `go.graphml`; `out.graphml` is written here on success.
    #[arg(help = "Working directory holding the input GraphML files")]
    pub working_dir: PathBuf,

    /// Node attribute used as color.
    #[arg(short = 'v', long = "value", default_value = "value")]
    pub node_attr: String,

    /// Edge attribute required to match during isomorphism enumeration.
    #[arg(short = 'e', long = "edge", default_value = "type")]
    pub edge_attr: String,

    /// RNG seed; omitted draws fresh entropy, so two invocations without
    /// `--seed` need not agree (determinism is only promised for a fixed
    /// seed, per `spec.md` §5).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of `reset` + `run` retries to attempt after a contradiction
    /// before giving up (`spec.md` §7, "the driver may cap retries").
    #[arg(long, default_value_t = 10)]
    pub retries: usize,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read working directory `{path}`: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no `gi.graphml` found in `{0}`")]
    MissingExample(String),

    #[error("no `gl*.graphml` template found in `{0}`")]
    MissingTemplates(String),

    #[error("no `go.graphml` found in `{0}`")]
    MissingOutput(String),

    #[error(transparent)]
    Graphml(#[from] GraphmlError),

    #[error(transparent)]
    Setup(#[from] SetupError),
}

/// Exit codes per `spec.md` §6 / `SPEC_FULL.md` §6 "Error/exit-code mapping".
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CONTRADICTION: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

struct Inputs {
    example: PathBuf,
    templates: Vec<PathBuf>,
    output: PathBuf,
}

fn discover_inputs(dir: &Path) -> Result<Inputs, CliError> {
    let dir_str = dir.display().to_string();
    let mut example = None;
    let mut templates = Vec::new();
    let mut output = None;

    let entries = std::fs::read_dir(dir).map_err(|source| CliError::ReadDir {
        path: dir_str.clone(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| CliError::ReadDir {
            path: dir_str.clone(),
            source,
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name == "gi.graphml" {
            example = Some(path);
        } else if name == "go.graphml" {
            output = Some(path);
        } else if name.starts_with("gl") && name.ends_with(".graphml") {
            templates.push(path);
        }
    }

    // Lexicographic order fixes the GL index order used throughout the
    // solver (DESIGN.md "Input file naming").
    templates.sort();

    Ok(Inputs {
        example: example.ok_or_else(|| CliError::MissingExample(dir_str.clone()))?,
        templates: if templates.is_empty() {
            return Err(CliError::MissingTemplates(dir_str));
        } else {
            templates
        },
        output: output.ok_or_else(|| CliError::MissingOutput(dir_str))?,
    })
}

/// Build a `Template<String>` from a parsed GraphML document, fixing the
/// template's node order to the order nodes appeared in the file (`spec.md`
/// §3 "Its node ordering is fixed and used as the index space").
fn build_template(doc: &GraphmlDocument) -> Template<String> {
    let mut index_of: HashMap<&String, usize> = HashMap::new();
    for (i, id) in doc.node_order.iter().enumerate() {
        index_of.insert(id, i);
    }

    let mut graph: Graph<usize, String> = Graph::new(doc.directed);
    for id in &doc.node_order {
        graph.add_node(index_of[id]);
    }
    for (source, target, attr) in &doc.raw_edges {
        graph.add_edge(index_of[source], index_of[target], attr.clone());
    }

    Template::new(graph)
}

/// Run the CLI end to end: load inputs, retry `setup`'s solve loop up to
/// `args.retries` times, write `out.graphml` on success. Returns the process
/// exit code; never panics on a malformed input (everything becomes a typed
/// `CliError`, logged before returning).
pub fn run(args: &Args) -> i32 {
    match run_inner(args) {
        Ok(true) => EXIT_SUCCESS,
        Ok(false) => {
            tracing::error!("exhausted {} retries without a successful coloring", args.retries);
            EXIT_CONTRADICTION
        }
        Err(err) => {
            tracing::error!(error = %err, "graph-wfc failed");
            EXIT_ERROR
        }
    }
}

fn run_inner(args: &Args) -> Result<bool, CliError> {
    let inputs = discover_inputs(&args.working_dir)?;

    tracing::info!(example = ?inputs.example, templates = ?inputs.templates, output = ?inputs.output, "loaded input paths");

    let example_doc = graphml::read_graph(&inputs.example, &args.node_attr, &args.edge_attr)?;
    let output_doc = graphml::read_graph(&inputs.output, &args.node_attr, &args.edge_attr)?;
    let template_docs: Vec<GraphmlDocument> = inputs
        .templates
        .iter()
        .map(|path| graphml::read_graph(path, &args.node_attr, &args.edge_attr))
        .collect::<Result<_, _>>()?;

    let templates: Vec<Template<String>> = template_docs.iter().map(build_template).collect();

    let edge_attr_enforced = example_doc
        .raw_edges
        .iter()
        .chain(output_doc.raw_edges.iter())
        .any(|(_, _, attr)| attr.is_some());

    let (mut solver, palette) = SolverState::setup(
        &example_doc.graph,
        &example_doc.node_colors,
        templates,
        &output_doc.graph,
        edge_attr_enforced,
    )?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for attempt in 0..=args.retries {
        if attempt > 0 {
            tracing::warn!(attempt, "retrying after contradiction");
            solver.reset();
        }

        match solver.run(&mut rng) {
            RunOutcome::Success => {
                let colors: HashMap<String, String> = solver
                    .domains()
                    .nodes()
                    .filter_map(|node| {
                        solver
                            .domains()
                            .single_color(node)
                            .map(|id| (node.clone(), palette.color(id).clone()))
                    })
                    .collect();

                let out_path = args.working_dir.join("out.graphml");
                graphml::write_graph(&out_path, &output_doc, &args.node_attr, &args.edge_attr, &colors)?;
                tracing::info!(path = ?out_path, "wrote solved graph");
                return Ok(true);
            }
            RunOutcome::Contradiction { at_node, step } => {
                tracing::warn!(at_node = ?at_node, step, attempt, "contradiction during propagation");
            }
        }
    }

    Ok(false)
}
