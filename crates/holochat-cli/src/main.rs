//! Holochat - CLI Tool
//!
//! Command-line shell around the holographic associative memory model.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use holochat_core::{
	default_dataset, normalize_activations, top_neurons, train, AssociativeMemoryModel,
	ChatSession, FileStore, ModelConfig, TrainingItem, TrainingObserver, TrainingStep,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "warn,holochat=info,holochat_core=info";

#[derive(Parser)]
#[command(name = "holochat")]
#[command(about = "Holographic associative memory chat")]
struct Cli {
	/// Knowledge base file (default: ~/.holochat/knowledge_base.json)
	#[arg(long, env = "HOLOCHAT_STORE")]
	store: Option<PathBuf>,

	/// Seed for the neuron cloud. Keep it fixed so separate runs share one cloud.
	#[arg(long, env = "HOLOCHAT_SEED", default_value_t = 1)]
	seed: u64,

	/// Number of neurons
	#[arg(long, env = "HOLOCHAT_NEURONS", default_value_t = ModelConfig::default().neuron_count)]
	neurons: usize,

	/// Side of the cube neurons are placed in
	#[arg(long, env = "HOLOCHAT_SPACE_SIZE", default_value_t = ModelConfig::default().space_size)]
	space_size: f64,

	/// Activation of the reference neuron
	#[arg(long, env = "HOLOCHAT_INTENSITY", default_value_t = ModelConfig::default().intensity)]
	intensity: f64,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Associate a response with an input
	Learn {
		/// Input text
		input: String,

		/// Response to return for it
		response: String,
	},

	/// Ask the model
	Ask {
		/// Input text
		input: String,

		/// Print an activation summary
		#[arg(long)]
		activations: bool,
	},

	/// Learn a dataset, one item at a time
	Train {
		/// JSON array of {"question", "answer"} objects (default: built-in dataset)
		#[arg(short, long)]
		dataset: Option<PathBuf>,
	},

	/// Write the knowledge base as JSON
	Export {
		/// Output file (default: stdout)
		#[arg(short, long)]
		output: Option<PathBuf>,
	},

	/// Replace the knowledge base with a JSON document
	Import {
		/// Document to load
		file: PathBuf,
	},

	/// Forget everything learned and overwrite the stored knowledge base
	Reset,

	/// Print neuron positions as JSON
	Positions,

	/// Interactive chat on stdin
	Chat,
}

/// Activation summary printed by `ask --activations`
#[derive(Serialize)]
struct ActivationSummary {
	reference_neuron: usize,
	peak: f64,
	top_neurons: Vec<usize>,
	mean_normalized: f64,
}

impl ActivationSummary {
	#[allow(clippy::cast_precision_loss)]
	fn new(reference_neuron: usize, activations: &[f64]) -> Self {
		let normalized = normalize_activations(activations);
		let mean_normalized = if normalized.is_empty() {
			0.0
		} else {
			normalized.iter().sum::<f64>() / normalized.len() as f64
		};

		Self {
			reference_neuron,
			peak: activations.iter().copied().fold(0.0, f64::max),
			top_neurons: top_neurons(activations, 5),
			mean_normalized,
		}
	}
}

/// Prints one line per learned item
struct ProgressLine;

impl TrainingObserver for ProgressLine {
	fn on_step(&mut self, step: &TrainingStep<'_>) {
		println!("[{:>3}%] {}/{}", step.percent, step.index + 1, step.total);
	}
}

fn main() -> Result<()> {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
		.init();

	let cli = Cli::parse();

	let config = ModelConfig {
		neuron_count: cli.neurons,
		space_size: cli.space_size,
		intensity: cli.intensity,
	};
	let store = match cli.store {
		Some(path) => FileStore::new(path),
		None => FileStore::at_default_location().context("No default knowledge store; pass --store")?,
	};
	info!(path = %store.path().display(), "using knowledge store");

	let mut model = AssociativeMemoryModel::with_seed(config, store, cli.seed)
		.context("Failed to initialize model")?;

	match cli.command {
		Commands::Learn { input, response } => {
			let _ = model.learn(&input, response)?;
			println!("Learned. {} associations stored.", model.len());
		}

		Commands::Ask { input, activations } => {
			let answer = model.respond(&input);
			println!("{}", answer.response);

			if activations {
				let summary = ActivationSummary::new(model.reference_index(&input), &answer.activations);
				println!("{}", serde_json::to_string_pretty(&summary)?);
			}
		}

		Commands::Train { dataset } => {
			let items = match dataset {
				Some(path) => {
					let text = std::fs::read_to_string(&path)
						.with_context(|| format!("Failed to read {}", path.display()))?;
					serde_json::from_str::<Vec<TrainingItem>>(&text)
						.with_context(|| format!("Invalid dataset {}", path.display()))?
				}
				None => default_dataset(),
			};

			let report = train(&mut model, &items, &mut ProgressLine)?;
			println!("Training completed: {}/{} items", report.completed, report.total);
		}

		Commands::Export { output } => {
			let document = model.export_knowledge()?;
			match output {
				Some(path) => {
					std::fs::write(&path, document)
						.with_context(|| format!("Failed to write {}", path.display()))?;
					println!("Exported {} associations to {}", model.len(), path.display());
				}
				None => println!("{document}"),
			}
		}

		Commands::Import { file } => {
			let text = std::fs::read_to_string(&file)
				.with_context(|| format!("Failed to read {}", file.display()))?;
			if !model.import_knowledge(&text) {
				bail!("Error loading knowledge from {}", file.display());
			}
			println!("Knowledge loaded successfully ({} associations)", model.len());
		}

		Commands::Reset => {
			model.reset()?;
			println!("Knowledge base cleared.");
		}

		Commands::Positions => {
			println!("{}", serde_json::to_string(&model.neuron_positions())?);
		}

		Commands::Chat => {
			let mut session = ChatSession::new();
			let stdin = io::stdin();
			let mut stdout = io::stdout();

			write!(stdout, "> ")?;
			stdout.flush()?;
			for line in stdin.lock().lines() {
				let line = line?;
				if let Some(reply) = session.submit(&mut model, &line)? {
					println!("{}", reply.response);
				}
				write!(stdout, "> ")?;
				stdout.flush()?;
			}
			println!();
		}
	}

	Ok(())
}
