//! CLI command definitions for robustness-forge.
//!
//! Lists the registered OOD detection datasets and computes ensemble
//! diversity over prediction files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use ndarray::{s, Array3, Axis};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::EvalConfig;
use crate::datasets::OodPair;
use crate::metrics::{softmax, DiversityResult};

/// OOD detection datasets and ensemble diversity metrics for classifier evaluation.
#[derive(Parser)]
#[command(name = "robustness-forge")]
#[command(about = "Compose OOD detection datasets and measure ensemble diversity")]
#[command(version)]
#[command(
    long_about = "robustness-forge composes out-of-distribution detection datasets from pairs of corpora and computes ensemble diversity metrics over model predictions.\n\nExample usage:\n  robustness-forge diversity --input predictions.json --num-models 3"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// YAML configuration file.
    #[arg(short, long, global = true, env = "ROBUSTNESS_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// List the registered OOD detection datasets.
    #[command(alias = "ls")]
    Datasets(DatasetsArgs),

    /// Compute ensemble diversity over a predictions file.
    ///
    /// The file holds a JSON array shaped [member][example][class]. Examples
    /// are fed to the accumulator in batches, so the result does not depend
    /// on the batch size.
    #[command(alias = "div")]
    Diversity(DiversityArgs),
}

/// Arguments for `robustness-forge datasets`.
#[derive(Parser, Debug)]
pub struct DatasetsArgs {
    /// Output JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `robustness-forge diversity`.
#[derive(Parser, Debug)]
pub struct DiversityArgs {
    /// JSON predictions file shaped [member][example][class].
    #[arg(short, long)]
    pub input: PathBuf,

    /// Number of ensemble members (default: length of the leading axis).
    #[arg(short = 'n', long)]
    pub num_models: Option<usize>,

    /// Examples per batch (default: from configuration).
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Treat the input as logits and apply softmax first.
    #[arg(long)]
    pub logits: bool,

    /// Output JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

#[derive(Serialize)]
struct DatasetEntry {
    name: &'static str,
    in_distribution: &'static str,
    out_of_distribution: &'static str,
}

#[derive(Serialize)]
struct DiversityReport {
    examples: u64,
    num_models: usize,
    batches: usize,
    #[serde(flatten)]
    result: DiversityResult,
}

/// Parse command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli())
}

/// Run the CLI with the parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    debug!(?config, "loaded configuration");

    match cli.command {
        Commands::Datasets(args) => run_datasets_command(args),
        Commands::Diversity(args) => run_diversity_command(args, &config),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EvalConfig> {
    let config = match path {
        Some(path) => EvalConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EvalConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid configuration environment override")
}

fn run_datasets_command(args: DatasetsArgs) -> anyhow::Result<()> {
    let entries: Vec<DatasetEntry> = OodPair::all()
        .into_iter()
        .map(|pair| DatasetEntry {
            name: pair.name(),
            in_distribution: pair.in_corpus().name(),
            out_of_distribution: pair.out_corpus().name(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!(
                "{:<24} in={:<10} out={}",
                entry.name, entry.in_distribution, entry.out_of_distribution
            );
        }
    }
    Ok(())
}

fn run_diversity_command(args: DiversityArgs, config: &EvalConfig) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let nested: Vec<Vec<Vec<f64>>> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a [member][example][class] array", args.input.display()))?;

    let mut predictions = to_array3(nested)?;
    if args.logits {
        predictions = softmax(predictions.view());
    }

    let num_models = args.num_models.unwrap_or(predictions.len_of(Axis(0)));
    let batch_size = args.batch_size.unwrap_or(config.batch_size).max(1);
    let num_examples = predictions.len_of(Axis(1));
    if num_models < 2 {
        anyhow::bail!("diversity needs at least 2 models, got {}", num_models);
    }

    info!(
        input = %args.input.display(),
        num_models,
        num_examples,
        batch_size,
        "Computing ensemble diversity"
    );

    let mut diversity = config.diversity_accumulator();
    let mut batches = 0;
    for start in (0..num_examples).step_by(batch_size) {
        let end = (start + batch_size).min(num_examples);
        diversity
            .add_batch(predictions.slice(s![.., start..end, ..]), num_models)
            .with_context(|| format!("Rejected examples {}..{}", start, end))?;
        batches += 1;
    }

    let report = DiversityReport {
        examples: diversity.example_count(),
        num_models,
        batches,
        result: diversity.result(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Examples: {} ({} batches)", report.examples, report.batches);
        println!("{}", report.result.summary());
    }
    Ok(())
}

/// Converts a rectangular nested vector into `[member, example, class]`.
fn to_array3(nested: Vec<Vec<Vec<f64>>>) -> anyhow::Result<Array3<f64>> {
    let members = nested.len();
    let examples = nested.first().map_or(0, Vec::len);
    let classes = nested
        .first()
        .and_then(|member| member.first())
        .map_or(0, Vec::len);

    let mut flat = Vec::with_capacity(members * examples * classes);
    for (m, member) in nested.into_iter().enumerate() {
        if member.len() != examples {
            anyhow::bail!("member {} has {} examples, expected {}", m, member.len(), examples);
        }
        for (e, row) in member.into_iter().enumerate() {
            if row.len() != classes {
                anyhow::bail!(
                    "member {} example {} has {} classes, expected {}",
                    m,
                    e,
                    row.len(),
                    classes
                );
            }
            flat.extend(row);
        }
    }

    Ok(Array3::from_shape_vec((members, examples, classes), flat)?)
}
