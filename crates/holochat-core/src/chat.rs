//! Chat session with an optional text oracle.
//!
//! The model can answer on its own, or a hosted text generator can be asked
//! first. Oracle answers are fed back through `learn` so the association is
//! kept; an oracle failure is replaced with a fixed apology and learned the
//! same way. Either path returns the model's activation vector.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::AssociativeMemoryModel;
use crate::storage::KnowledgeStore;

/// Substituted when the oracle fails.
pub const ORACLE_FALLBACK: &str = "Sorry, I couldn't generate a response.";

/// Error reported by a [`TextOracle`]. The model never sees the reason.
#[derive(Debug, thiserror::Error)]
#[error("Text generation failed: {0}")]
pub struct OracleError(pub String);

/// Sampling parameters passed to the oracle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
	/// Model identifier at the provider
	pub model: String,
	/// Maximum tokens to generate
	pub max_new_tokens: u32,
	/// Sampling temperature
	pub temperature: f64,
	/// Nucleus sampling mass
	pub top_p: f64,
	/// Penalty for repeated tokens
	pub repetition_penalty: f64,
}

impl Default for GenerationParams {
	fn default() -> Self {
		Self {
			model: "facebook/opt-350m".into(),
			max_new_tokens: 50,
			temperature: 0.7,
			top_p: 0.95,
			repetition_penalty: 1.1,
		}
	}
}

/// External text generator.
pub trait TextOracle {
	/// Generate a reply to `prompt`.
	///
	/// # Errors
	///
	/// Returns an error if generation fails for any reason.
	fn generate(&mut self, prompt: &str, params: &GenerationParams) -> std::result::Result<String, OracleError>;
}

impl<F> TextOracle for F
where
	F: FnMut(&str, &GenerationParams) -> std::result::Result<String, OracleError>,
{
	fn generate(&mut self, prompt: &str, params: &GenerationParams) -> std::result::Result<String, OracleError> {
		self(prompt, params)
	}
}

/// Who wrote a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Typed by the user
	User,
	/// Produced by the model or the oracle
	Bot,
}

/// One transcript entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
	/// Author
	pub role: Role,
	/// Text
	pub text: String,
}

/// Reply to one submitted message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
	/// Text shown to the user
	pub response: String,
	/// Activation vector for the input
	pub activations: Vec<f64>,
	/// Whether the response came from the oracle path
	pub from_oracle: bool,
}

/// Transcript plus oracle wiring for one conversation.
pub struct ChatSession {
	oracle: Option<Box<dyn TextOracle>>,
	oracle_enabled: bool,
	params: GenerationParams,
	history: Vec<ChatMessage>,
}

impl std::fmt::Debug for ChatSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChatSession")
			.field("has_oracle", &self.oracle.is_some())
			.field("oracle_enabled", &self.oracle_enabled)
			.field("params", &self.params)
			.field("history", &self.history.len())
			.finish()
	}
}

impl Default for ChatSession {
	fn default() -> Self {
		Self::new()
	}
}

impl ChatSession {
	/// Session without an oracle; every reply comes from the model.
	#[must_use]
	pub fn new() -> Self {
		Self {
			oracle: None,
			oracle_enabled: false,
			params: GenerationParams::default(),
			history: Vec::new(),
		}
	}

	/// Session that asks `oracle` first. The oracle starts enabled.
	#[must_use]
	pub fn with_oracle(oracle: impl TextOracle + 'static) -> Self {
		Self {
			oracle: Some(Box::new(oracle)),
			oracle_enabled: true,
			..Self::new()
		}
	}

	/// Replace the generation parameters.
	#[must_use]
	pub fn with_params(mut self, params: GenerationParams) -> Self {
		self.params = params;
		self
	}

	/// Check if submissions currently go to the oracle.
	#[must_use]
	pub fn oracle_active(&self) -> bool {
		self.oracle_enabled && self.oracle.is_some()
	}

	/// Flip the oracle switch, returning the new state.
	pub fn toggle_oracle(&mut self) -> bool {
		self.oracle_enabled = !self.oracle_enabled;
		self.oracle_enabled
	}

	/// Transcript so far.
	#[must_use]
	pub fn history(&self) -> &[ChatMessage] {
		&self.history
	}

	/// Submit a user message.
	///
	/// Blank input is ignored and yields `Ok(None)`.
	///
	/// # Errors
	///
	/// Returns an error if learning an oracle reply could not be persisted.
	/// The exchange is still recorded in the transcript.
	pub fn submit<S: KnowledgeStore>(
		&mut self,
		model: &mut AssociativeMemoryModel<S>,
		input: &str,
	) -> Result<Option<ChatReply>> {
		if input.trim().is_empty() {
			return Ok(None);
		}

		let enabled = self.oracle_enabled;
		let reply = match self.oracle.as_mut().filter(|_| enabled) {
			Some(oracle) => {
				let response = match oracle.generate(input, &self.params) {
					Ok(text) => text,
					Err(e) => {
						warn!(error = %e, "oracle failed, using fallback");
						ORACLE_FALLBACK.to_owned()
					}
				};
				self.record(input, &response);
				let activations = model.learn(input, response.as_str())?;
				ChatReply {
					response,
					activations,
					from_oracle: true,
				}
			}
			None => {
				let answer = model.respond(input);
				self.record(input, &answer.response);
				ChatReply {
					response: answer.response,
					activations: answer.activations,
					from_oracle: false,
				}
			}
		};

		debug!(from_oracle = reply.from_oracle, "chat reply");
		Ok(Some(reply))
	}

	fn record(&mut self, input: &str, response: &str) {
		self.history.push(ChatMessage {
			role: Role::User,
			text: input.to_owned(),
		});
		self.history.push(ChatMessage {
			role: Role::Bot,
			text: response.to_owned(),
		});
	}
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
	use super::*;
	use crate::model::{ModelConfig, NO_RESPONSE};
	use crate::storage::MemoryStore;

	fn model() -> AssociativeMemoryModel<MemoryStore> {
		AssociativeMemoryModel::with_seed(ModelConfig::default(), MemoryStore::new(), 11).unwrap()
	}

	fn echo(prompt: &str, params: &GenerationParams) -> std::result::Result<String, OracleError> {
		Ok(format!("{prompt} ({})", params.max_new_tokens))
	}

	fn broken(_prompt: &str, _params: &GenerationParams) -> std::result::Result<String, OracleError> {
		Err(OracleError("503".into()))
	}

	#[test]
	fn blank_input_is_ignored() {
		let mut m = model();
		let mut chat = ChatSession::new();
		assert!(chat.submit(&mut m, "   ").unwrap().is_none());
		assert!(chat.history().is_empty());
	}

	#[test]
	fn without_oracle_the_model_answers() {
		let mut m = model();
		let _ = m.learn("hi", "hello!").unwrap();
		let mut chat = ChatSession::new();

		let reply = chat.submit(&mut m, "hi").unwrap().unwrap();
		assert_eq!(reply.response, "hello!");
		assert!(!reply.from_oracle);
		assert_eq!(reply.activations.len(), 1000);
		assert_eq!(
			chat.history(),
			&[
				ChatMessage {
					role: Role::User,
					text: "hi".into()
				},
				ChatMessage {
					role: Role::Bot,
					text: "hello!".into()
				},
			]
		);
	}

	#[test]
	fn oracle_reply_is_learned() {
		let mut m = model();
		let mut chat = ChatSession::with_oracle(echo);
		assert!(chat.oracle_active());

		let reply = chat.submit(&mut m, "ping").unwrap().unwrap();
		assert_eq!(reply.response, "ping (50)");
		assert!(reply.from_oracle);
		assert_eq!(m.knowledge().get("ping").unwrap().response, "ping (50)");

		assert!(!chat.toggle_oracle());
		let reply = chat.submit(&mut m, "ping").unwrap().unwrap();
		assert_eq!(reply.response, "ping (50)");
		assert!(!reply.from_oracle);
	}

	#[test]
	fn oracle_failure_falls_back() {
		let mut m = model();
		let mut chat = ChatSession::with_oracle(broken);

		let reply = chat.submit(&mut m, "hello").unwrap().unwrap();
		assert_eq!(reply.response, ORACLE_FALLBACK);
		assert_eq!(reply.activations, m.activations_for("hello"));
		assert_eq!(m.knowledge().get("hello").unwrap().response, ORACLE_FALLBACK);
	}

	#[test]
	fn params_reach_the_oracle() {
		let mut m = model();
		let params = GenerationParams {
			max_new_tokens: 7,
			..GenerationParams::default()
		};
		let mut chat = ChatSession::with_oracle(echo).with_params(params);
		let reply = chat.submit(&mut m, "q").unwrap().unwrap();
		assert_eq!(reply.response, "q (7)");
	}

	#[test]
	fn disabled_session_on_empty_model_returns_sentinel() {
		let mut m = model();
		let mut chat = ChatSession::default();
		assert!(!chat.oracle_active());
		let reply = chat.submit(&mut m, "unknown").unwrap().unwrap();
		assert_eq!(reply.response, NO_RESPONSE);
	}
}
