//! # Holochat Core
//!
//! A toy "holographic" associative memory: a fixed cloud of neurons in 3D
//! space, lit up by input text, that remembers which neurons each learned
//! input excited.
//!
//! ## Core Concepts
//!
//! ### Activation
//!
//! Input text selects a **reference neuron** by summing its character codes
//! modulo the neuron count. Activation then spreads outward like light,
//! decaying with distance:
//!
//! ```text
//! a_i = exp(-‖p_i − p_r‖ / S) · I
//! ```
//!
//! ### Learning
//!
//! `learn(input, response)` stores the response together with the 10 most
//! activated neurons for `input`. Learning the same input again replaces the
//! old association.
//!
//! ### Responding
//!
//! `respond(input)` takes the 5 most activated neurons for `input` and picks,
//! uniformly at random, a response from every association that shares at
//! least one of them. With no overlap it answers
//! [`NO_RESPONSE`](model::NO_RESPONSE).
//!
//! ### Persistence
//!
//! The knowledge base is the only lasting state. It is read from an injected
//! [`KnowledgeStore`](storage::KnowledgeStore) at construction and written
//! back after every change, as a JSON document that can also be exported and
//! imported by hand.
//!
//! ## Example
//!
//! ```rust
//! use holochat_core::{AssociativeMemoryModel, MemoryStore, ModelConfig};
//!
//! let mut model = AssociativeMemoryModel::with_seed(ModelConfig::default(), MemoryStore::new(), 7)?;
//!
//! let activations = model.learn("What is the capital of France?", "The capital of France is Paris.")?;
//! assert_eq!(activations.len(), 1000);
//!
//! let answer = model.respond("What is the capital of France?");
//! assert_eq!(answer.response, "The capital of France is Paris.");
//!
//! // Colours for the point cloud
//! let colors = holochat_core::activation_colors(&answer.activations);
//! assert_eq!(colors.len(), 1000);
//! # Ok::<(), holochat_core::ModelError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activation;
pub mod chat;
pub mod error;
pub mod knowledge;
pub mod model;
pub mod neuron;
pub mod storage;
pub mod training;

pub use activation::{
	activation_color, activation_colors, decayed_activation, normalize_activations, propagate,
	reference_index, top_neurons, NeuronColor,
};
pub use chat::{
	ChatMessage, ChatReply, ChatSession, GenerationParams, OracleError, Role, TextOracle,
	ORACLE_FALLBACK,
};
pub use error::{KnowledgeError, ModelError, Result, StorageError};
pub use knowledge::{Association, KnowledgeBase, NeuronIndices, LEARN_NEURONS};
pub use model::{AssociativeMemoryModel, ModelConfig, Response, NO_RESPONSE, QUERY_NEURONS};
pub use neuron::{generate_neurons, Neuron};
pub use storage::{FileStore, KnowledgeStore, MemoryStore};
pub use training::{
	default_dataset, train, CancelFlag, TrainingItem, TrainingObserver, TrainingReport,
	TrainingStep,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
	use super::*;

	#[test]
	fn test_learn_then_respond() {
		let mut model =
			AssociativeMemoryModel::with_seed(ModelConfig::default(), MemoryStore::new(), 1).unwrap();

		let activations = model.learn("Q1", "A1").unwrap();
		let answer = model.respond("Q1");

		assert_eq!(answer.response, "A1");
		assert_eq!(answer.activations, activations);
		assert!(!VERSION.is_empty());
	}
}
