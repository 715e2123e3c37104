//! Error types for model operations.

/// Errors raised by a [`KnowledgeStore`](crate::storage::KnowledgeStore).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
	/// I/O error while reading or writing the backing file.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// The store cannot be used (no home directory, a rejected document in the
	/// way, ...).
	#[error("Storage unavailable: {0}")]
	Unavailable(String),
}

/// Errors raised while decoding or validating a knowledge document.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
	/// The document is not valid JSON or does not have the association shape.
	#[error("Malformed knowledge document: {0}")]
	Parse(#[from] serde_json::Error),

	/// An association references a neuron the model does not have.
	#[error("Association for {input:?} references neuron {index}, but the model has {neuron_count}")]
	NeuronOutOfRange {
		/// Input text of the offending association
		input: String,
		/// The out-of-range index
		index: usize,
		/// Neuron count of the model
		neuron_count: usize,
	},

	/// An association carries more neuron indices than `learn` ever stores.
	#[error("Association for {input:?} lists {count} neurons (max {max})")]
	TooManyNeurons {
		/// Input text of the offending association
		input: String,
		/// Number of indices found
		count: usize,
		/// Maximum allowed
		max: usize,
	},
}

/// Errors raised by [`AssociativeMemoryModel`](crate::model::AssociativeMemoryModel).
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
	/// Rejected model configuration.
	#[error("Invalid model configuration: {0}")]
	InvalidConfig(String),

	/// Knowledge document could not be decoded or validated.
	#[error(transparent)]
	Knowledge(#[from] KnowledgeError),

	/// Persisting or restoring the knowledge base failed.
	#[error("Knowledge store failed: {0}")]
	Storage(#[from] StorageError),
}

impl ModelError {
	/// Check if the in-memory state is still intact and the call can be retried.
	///
	/// Storage failures leave the model usable; the next successful save
	/// writes the full knowledge base again.
	#[must_use]
	pub fn is_recoverable(&self) -> bool {
		matches!(self, Self::Storage(_))
	}
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
