//! Associative Memory Model
//!
//! The whole learn/respond cycle in one place:
//!
//! 1. Hash the input to a reference neuron
//! 2. Propagate distance-decayed activation through the cloud
//! 3. **Learn**: record the 10 most activated neurons with the response
//! 4. **Respond**: take the 5 most activated neurons and pick, at random,
//!    any learned response whose neurons overlap them
//!
//! The knowledge base is the only state that outlives a model. It is
//! restored from the injected store at construction and written back after
//! every change. A stored document the model cannot load is set aside by
//! the store before anything is written over it; if the store cannot do
//! that, saving stays blocked until an import or a [`reset`] replaces the
//! knowledge base.
//!
//! [`reset`]: AssociativeMemoryModel::reset

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::activation::{propagate, reference_index, top_neurons};
use crate::error::{ModelError, Result, StorageError};
use crate::knowledge::{Association, KnowledgeBase, LEARN_NEURONS};
use crate::neuron::{generate_neurons, Neuron};
use crate::storage::KnowledgeStore;

/// Number of neurons compared against stored associations on respond.
pub const QUERY_NEURONS: usize = 5;

/// Response returned when no association overlaps the input.
pub const NO_RESPONSE: &str = "No suitable response found.";

/// Model configuration. Fixed for the lifetime of a model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
	/// Number of neurons (N)
	pub neuron_count: usize,
	/// Side of the cube neuron positions are drawn from
	pub space_size: f64,
	/// Activation of the reference neuron; scales every activation
	pub intensity: f64,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self {
			neuron_count: 1000,
			space_size: 100.0,
			intensity: 0.005,
		}
	}
}

impl ModelConfig {
	/// Check that the configuration describes a usable model.
	///
	/// # Errors
	///
	/// Returns [`ModelError::InvalidConfig`] if there are no neurons or the
	/// space size or intensity is not a positive finite number.
	pub fn validate(&self) -> Result<()> {
		if self.neuron_count == 0 {
			return Err(ModelError::InvalidConfig(
				"neuron_count must be at least 1".into(),
			));
		}
		if !self.space_size.is_finite() || self.space_size <= 0.0 {
			return Err(ModelError::InvalidConfig(format!(
				"space_size must be positive and finite, got {}",
				self.space_size
			)));
		}
		if !self.intensity.is_finite() || self.intensity <= 0.0 {
			return Err(ModelError::InvalidConfig(format!(
				"intensity must be positive and finite, got {}",
				self.intensity
			)));
		}
		Ok(())
	}
}

/// Result of [`AssociativeMemoryModel::respond`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
	/// Selected response, or [`NO_RESPONSE`]
	pub response: String,
	/// Activation of every neuron for the input, in neuron order
	pub activations: Vec<f64>,
}

/// Neuron cloud plus learned associations.
#[derive(Debug)]
pub struct AssociativeMemoryModel<S> {
	config: ModelConfig,
	neurons: Vec<Neuron>,
	knowledge: KnowledgeBase,
	store: S,
	rng: StdRng,
	/// The store still holds a rejected document that was not set aside.
	save_blocked: bool,
}

impl<S: KnowledgeStore> AssociativeMemoryModel<S> {
	/// Build a model with an OS-seeded random source.
	///
	/// # Errors
	///
	/// Returns an error if the configuration is invalid or the store cannot
	/// be read.
	pub fn new(config: ModelConfig, store: S) -> Result<Self> {
		Self::with_rng(config, store, &mut StdRng::from_entropy())
	}

	/// Build a model whose neuron cloud and response choices are fully
	/// determined by `seed`.
	///
	/// # Errors
	///
	/// Returns an error if the configuration is invalid or the store cannot
	/// be read.
	pub fn with_seed(config: ModelConfig, store: S, seed: u64) -> Result<Self> {
		Self::with_rng(config, store, &mut StdRng::seed_from_u64(seed))
	}

	/// Build a model drawing neuron positions from `rng`.
	///
	/// The generator used for response selection is seeded from `rng` as
	/// well.
	///
	/// # Errors
	///
	/// Returns an error if the configuration is invalid or the store cannot
	/// be read. A stored document that does not decode is not an error: it
	/// is logged, set aside, and the model starts empty.
	pub fn with_rng<R: RngCore + ?Sized>(config: ModelConfig, mut store: S, rng: &mut R) -> Result<Self> {
		config.validate()?;

		let neurons = generate_neurons(config.neuron_count, config.space_size, rng);
		let selection_rng = StdRng::seed_from_u64(rng.gen());
		let (knowledge, save_blocked) = restore(&mut store, config.neuron_count)?;

		debug!(
			neurons = config.neuron_count,
			associations = knowledge.len(),
			save_blocked,
			"model initialized"
		);

		Ok(Self {
			config,
			neurons,
			knowledge,
			store,
			rng: selection_rng,
			save_blocked,
		})
	}

	// ========================================================================
	// Activation
	// ========================================================================

	/// Reference neuron for `text`.
	#[must_use]
	pub fn reference_index(&self, text: &str) -> usize {
		reference_index(text, self.config.neuron_count)
	}

	/// Activation of every neuron for `text`, without touching the neurons.
	#[must_use]
	pub fn activations_for(&self, text: &str) -> Vec<f64> {
		propagate(
			&self.neurons,
			self.reference_index(text),
			self.config.space_size,
			self.config.intensity,
		)
	}

	/// Activation of every neuron for `text`.
	///
	/// Each neuron's `activation` is overwritten with its new value. The
	/// result depends only on `text` and the neuron positions.
	pub fn compute_activations(&mut self, text: &str) -> Vec<f64> {
		let activations = self.activations_for(text);
		for (neuron, &activation) in self.neurons.iter_mut().zip(&activations) {
			neuron.activation = activation;
		}
		activations
	}

	// ========================================================================
	// Learn / Respond
	// ========================================================================

	/// Associate `response` with `input` and persist.
	///
	/// An existing association for the same input is replaced. Returns the
	/// activation vector for `input`.
	///
	/// # Errors
	///
	/// Returns [`ModelError::Storage`] if the knowledge base could not be
	/// saved. The association is kept in memory regardless.
	pub fn learn(&mut self, input: &str, response: impl Into<String>) -> Result<Vec<f64>> {
		let activations = self.compute_activations(input);
		let top = top_neurons(&activations, LEARN_NEURONS);

		let replaced = self
			.knowledge
			.insert(input, Association::new(response, top))
			.is_some();
		debug!(input, replaced, associations = self.knowledge.len(), "learned");

		self.persist()?;
		Ok(activations)
	}

	/// Answer `input` from the knowledge base using the model's own random
	/// source.
	pub fn respond(&mut self, input: &str) -> Response {
		let activations = self.compute_activations(input);
		let response = select_response(&self.knowledge, &activations, &mut self.rng);
		Response {
			response,
			activations,
		}
	}

	/// Answer `input`, choosing among matching responses with `rng`.
	pub fn respond_with<R: Rng + ?Sized>(&mut self, input: &str, rng: &mut R) -> Response {
		let activations = self.compute_activations(input);
		let response = select_response(&self.knowledge, &activations, rng);
		Response {
			response,
			activations,
		}
	}

	// ========================================================================
	// Import / Export
	// ========================================================================

	/// Encode the knowledge base as a JSON document.
	///
	/// # Errors
	///
	/// Returns an error only if serialization fails.
	pub fn export_knowledge(&self) -> Result<String> {
		Ok(self.knowledge.to_json()?)
	}

	/// Replace the knowledge base with a decoded document.
	///
	/// The document is validated against this model's neuron count and
	/// saved before it takes effect, so on any error the current knowledge
	/// base is left untouched.
	///
	/// # Errors
	///
	/// Returns [`ModelError::Knowledge`] for malformed or invalid documents
	/// and [`ModelError::Storage`] if it could not be saved.
	pub fn try_import_knowledge(&mut self, text: &str) -> Result<()> {
		let knowledge = KnowledgeBase::from_json(text, self.config.neuron_count)?;
		let document = knowledge.to_json()?;
		self.store.save(&document)?;

		debug!(associations = knowledge.len(), "imported knowledge");
		self.knowledge = knowledge;
		self.save_blocked = false;
		Ok(())
	}

	/// Replace the knowledge base with a decoded document, reporting only
	/// whether it worked. Failures are logged.
	pub fn import_knowledge(&mut self, text: &str) -> bool {
		match self.try_import_knowledge(text) {
			Ok(()) => true,
			Err(e) => {
				warn!(error = %e, "knowledge import rejected");
				false
			}
		}
	}

	/// Write the current knowledge base to the store.
	///
	/// # Errors
	///
	/// Returns an error if encoding or saving fails, or
	/// [`StorageError::Unavailable`] while the store still holds a rejected
	/// document that could not be set aside.
	pub fn persist(&mut self) -> Result<()> {
		if self.save_blocked {
			return Err(StorageError::Unavailable(
				"stored knowledge was rejected and not set aside; import or reset first".into(),
			)
			.into());
		}
		let document = self.knowledge.to_json()?;
		self.store.save(&document)?;
		Ok(())
	}

	/// Forget everything learned and save the empty knowledge base,
	/// overwriting whatever the store holds.
	///
	/// # Errors
	///
	/// Returns an error if the empty knowledge base could not be saved.
	pub fn reset(&mut self) -> Result<()> {
		let document = KnowledgeBase::new().to_json()?;
		self.store.save(&document)?;

		debug!(dropped = self.knowledge.len(), "knowledge reset");
		self.knowledge = KnowledgeBase::new();
		self.save_blocked = false;
		Ok(())
	}

	/// Check if saving is blocked by a rejected stored document.
	#[must_use]
	pub const fn save_blocked(&self) -> bool {
		self.save_blocked
	}

	// ========================================================================
	// Inspection
	// ========================================================================

	/// Configuration this model was built with.
	#[must_use]
	pub const fn config(&self) -> &ModelConfig {
		&self.config
	}

	/// All neurons, in index order.
	#[must_use]
	pub fn neurons(&self) -> &[Neuron] {
		&self.neurons
	}

	/// Neuron positions as `[x, y, z]`, in index order.
	#[must_use]
	pub fn neuron_positions(&self) -> Vec<[f64; 3]> {
		self.neurons.iter().map(Neuron::coordinates).collect()
	}

	/// Learned associations.
	#[must_use]
	pub const fn knowledge(&self) -> &KnowledgeBase {
		&self.knowledge
	}

	/// Number of learned associations.
	#[must_use]
	pub fn len(&self) -> usize {
		self.knowledge.len()
	}

	/// Check if nothing has been learned.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.knowledge.is_empty()
	}

	/// The injected store.
	#[must_use]
	pub const fn store(&self) -> &S {
		&self.store
	}
}

/// Load the stored knowledge base, falling back to empty if the document
/// does not decode for a model of `neuron_count` neurons.
///
/// A rejected document is handed to [`KnowledgeStore::set_aside`]. The
/// returned flag is set when that failed and saves must stay blocked.
fn restore<S: KnowledgeStore>(store: &mut S, neuron_count: usize) -> Result<(KnowledgeBase, bool)> {
	let Some(document) = store.load()? else {
		return Ok((KnowledgeBase::new(), false));
	};

	let error = match KnowledgeBase::from_json(&document, neuron_count) {
		Ok(knowledge) => return Ok((knowledge, false)),
		Err(e) => e,
	};
	warn!(error = %error, "stored knowledge ignored");

	match store.set_aside(&document) {
		Ok(()) => Ok((KnowledgeBase::new(), false)),
		Err(e) => {
			warn!(error = %e, "rejected knowledge kept in place; saving blocked");
			Ok((KnowledgeBase::new(), true))
		}
	}
}

/// Pick a response whose association overlaps the top query neurons.
fn select_response<R: Rng + ?Sized>(knowledge: &KnowledgeBase, activations: &[f64], rng: &mut R) -> String {
	let query = top_neurons(activations, QUERY_NEURONS);
	let candidates = knowledge.matching_responses(&query);

	debug!(candidates = candidates.len(), "respond");

	candidates
		.choose(rng)
		.map_or_else(|| NO_RESPONSE.to_owned(), |&response| response.to_owned())
}
