//! Knowledge Base
//!
//! Learned associations, keyed by the exact input text that produced them.
//!
//! The document form is a single JSON object:
//!
//! ```json
//! {
//!   "What is the capital of France?": {
//!     "response": "The capital of France is Paris.",
//!     "neurons": [412, 87, 903, 15, 640, 221, 778, 35, 502, 160]
//!   }
//! }
//! ```
//!
//! Decoding is strict: unknown fields are rejected and every neuron index is
//! checked against the model that will own the knowledge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::KnowledgeError;

/// Number of neurons recorded per association.
pub const LEARN_NEURONS: usize = 10;

/// Neuron index list small enough to live inline.
pub type NeuronIndices = SmallVec<[usize; LEARN_NEURONS]>;

/// A learned response and the neurons its input activated most strongly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Association {
	/// Response text returned when this association is selected
	pub response: String,
	/// Most activated neurons at learn time, strongest first
	#[serde(rename = "neurons")]
	pub top_neurons: NeuronIndices,
}

impl Association {
	/// Create an association.
	#[must_use]
	pub fn new(response: impl Into<String>, top_neurons: impl IntoIterator<Item = usize>) -> Self {
		Self {
			response: response.into(),
			top_neurons: top_neurons.into_iter().collect(),
		}
	}

	/// Check whether any of `query` appears in this association's neurons.
	#[inline]
	#[must_use]
	pub fn overlaps(&self, query: &[usize]) -> bool {
		self.top_neurons.iter().any(|n| query.contains(n))
	}
}

/// Every association held by one model.
///
/// Keys are unique; inserting an existing key replaces its association.
/// Iteration order is the sorted key order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeBase {
	associations: BTreeMap<String, Association>,
}

impl KnowledgeBase {
	/// Create an empty knowledge base.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Store `association` under `input`, returning the one it replaced.
	pub fn insert(&mut self, input: impl Into<String>, association: Association) -> Option<Association> {
		self.associations.insert(input.into(), association)
	}

	/// Association stored for `input`.
	#[must_use]
	pub fn get(&self, input: &str) -> Option<&Association> {
		self.associations.get(input)
	}

	/// Number of associations.
	#[must_use]
	pub fn len(&self) -> usize {
		self.associations.len()
	}

	/// Check if nothing has been learned.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.associations.is_empty()
	}

	/// Iterate `(input, association)` pairs in key order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Association)> {
		self.associations.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Responses of every association whose neurons intersect `query`.
	#[must_use]
	pub fn matching_responses(&self, query: &[usize]) -> Vec<&str> {
		self.associations
			.values()
			.filter(|association| association.overlaps(query))
			.map(|association| association.response.as_str())
			.collect()
	}

	/// Encode as a JSON document.
	///
	/// # Errors
	///
	/// Returns an error only if serialization itself fails, which cannot
	/// happen for string keys and plain records.
	pub fn to_json(&self) -> Result<String, KnowledgeError> {
		Ok(serde_json::to_string(self)?)
	}

	/// Decode a JSON document and validate it against a model of
	/// `neuron_count` neurons.
	///
	/// # Errors
	///
	/// Returns [`KnowledgeError::Parse`] for malformed or unknown shapes,
	/// [`KnowledgeError::NeuronOutOfRange`] and
	/// [`KnowledgeError::TooManyNeurons`] for records `learn` could never
	/// have produced.
	pub fn from_json(text: &str, neuron_count: usize) -> Result<Self, KnowledgeError> {
		let knowledge: Self = serde_json::from_str(text)?;
		knowledge.validate(neuron_count)?;
		Ok(knowledge)
	}

	/// Check every association against a model of `neuron_count` neurons.
	///
	/// # Errors
	///
	/// Returns the first invalid association found, in key order.
	pub fn validate(&self, neuron_count: usize) -> Result<(), KnowledgeError> {
		for (input, association) in &self.associations {
			let count = association.top_neurons.len();
			if count > LEARN_NEURONS {
				return Err(KnowledgeError::TooManyNeurons {
					input: input.clone(),
					count,
					max: LEARN_NEURONS,
				});
			}

			if let Some(&index) = association.top_neurons.iter().find(|&&i| i >= neuron_count) {
				return Err(KnowledgeError::NeuronOutOfRange {
					input: input.clone(),
					index,
					neuron_count,
				});
			}
		}
		Ok(())
	}
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
	use super::*;

	fn sample() -> KnowledgeBase {
		let mut kb = KnowledgeBase::new();
		let _ = kb.insert("hello", Association::new("hi there", [3, 1, 4]));
		let _ = kb.insert("bye", Association::new("see you", [9, 2]));
		kb
	}

	#[test]
	fn insert_replaces_existing_key() {
		let mut kb = sample();
		let previous = kb.insert("hello", Association::new("hey", [5]));

		assert_eq!(previous.unwrap().response, "hi there");
		assert_eq!(kb.len(), 2);
		assert_eq!(kb.get("hello").unwrap().response, "hey");
	}

	#[test]
	fn document_uses_neurons_field() {
		let json = sample().to_json().unwrap();
		assert!(json.contains("\"neurons\":[3,1,4]"));
		assert!(json.contains("\"response\":\"hi there\""));
	}

	#[test]
	fn document_round_trips() {
		let kb = sample();
		let decoded = KnowledgeBase::from_json(&kb.to_json().unwrap(), 10).unwrap();
		assert_eq!(decoded, kb);
		assert_eq!(decoded.get("hello").unwrap().top_neurons.as_slice(), &[3, 1, 4]);
	}

	#[test]
	fn decodes_document_written_by_hand() {
		let text = r#"{"Q1": {"response": "A1", "neurons": [0, 7]}}"#;
		let kb = KnowledgeBase::from_json(text, 8).unwrap();
		assert_eq!(kb.get("Q1"), Some(&Association::new("A1", [0, 7])));
	}

	#[test]
	fn rejects_malformed_text() {
		assert!(matches!(
			KnowledgeBase::from_json("not valid", 10),
			Err(KnowledgeError::Parse(_))
		));
		assert!(matches!(
			KnowledgeBase::from_json("[1, 2, 3]", 10),
			Err(KnowledgeError::Parse(_))
		));
	}

	#[test]
	fn rejects_unknown_fields_and_missing_fields() {
		let extra = r#"{"Q": {"response": "A", "neurons": [1], "weight": 2}}"#;
		assert!(KnowledgeBase::from_json(extra, 10).is_err());

		let missing = r#"{"Q": {"response": "A"}}"#;
		assert!(KnowledgeBase::from_json(missing, 10).is_err());

		let negative = r#"{"Q": {"response": "A", "neurons": [-1]}}"#;
		assert!(KnowledgeBase::from_json(negative, 10).is_err());
	}

	#[test]
	fn rejects_out_of_range_neurons() {
		let text = r#"{"Q": {"response": "A", "neurons": [1, 10]}}"#;
		match KnowledgeBase::from_json(text, 10) {
			Err(KnowledgeError::NeuronOutOfRange { index, neuron_count, .. }) => {
				assert_eq!(index, 10);
				assert_eq!(neuron_count, 10);
			}
			other => panic!("expected out-of-range error, got {other:?}"),
		}
	}

	#[test]
	fn rejects_oversized_neuron_lists() {
		let text = r#"{"Q": {"response": "A", "neurons": [0,1,2,3,4,5,6,7,8,9,10]}}"#;
		assert!(matches!(
			KnowledgeBase::from_json(text, 100),
			Err(KnowledgeError::TooManyNeurons { count: 11, .. })
		));
	}

	#[test]
	fn matching_responses_requires_overlap() {
		let kb = sample();
		assert_eq!(kb.matching_responses(&[4]), vec!["hi there"]);
		let mut both = kb.matching_responses(&[1, 2]);
		both.sort_unstable();
		assert_eq!(both, vec!["hi there", "see you"]);
		assert!(kb.matching_responses(&[0, 5]).is_empty());
		assert!(kb.matching_responses(&[]).is_empty());
	}
}
