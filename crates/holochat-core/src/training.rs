//! Batch training.
//!
//! Feeds a dataset through [`AssociativeMemoryModel::learn`] one item at a
//! time, in order. Each item is persisted before the next one starts, so a
//! failure or cancellation part-way through keeps everything learned so far.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::model::AssociativeMemoryModel;
use crate::storage::KnowledgeStore;

/// One question/answer pair to learn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingItem {
	/// Input text
	pub question: String,
	/// Response to associate with it
	pub answer: String,
}

impl TrainingItem {
	/// Create an item.
	#[must_use]
	pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
		Self {
			question: question.into(),
			answer: answer.into(),
		}
	}
}

/// Small general-knowledge dataset.
#[must_use]
pub fn default_dataset() -> Vec<TrainingItem> {
	vec![
		TrainingItem::new(
			"What is the capital of France?",
			"The capital of France is Paris.",
		),
		TrainingItem::new(
			"Who painted the Mona Lisa?",
			"Leonardo da Vinci painted the Mona Lisa.",
		),
		TrainingItem::new(
			"What is the largest planet in the solar system?",
			"Jupiter is the largest planet in the solar system.",
		),
		TrainingItem::new(
			"In which year did World War II begin?",
			"World War II began in 1939.",
		),
		TrainingItem::new(
			"What is the most abundant chemical element in the universe?",
			"Hydrogen is the most abundant chemical element in the universe.",
		),
	]
}

// ============================================================================
// Progress & Cancellation
// ============================================================================

/// Progress after one learned item.
#[derive(Clone, Copy, Debug)]
pub struct TrainingStep<'a> {
	/// Zero-based position of the item just learned
	pub index: usize,
	/// Dataset size
	pub total: usize,
	/// Rounded completion percentage (0-100)
	pub percent: u8,
	/// Activation vector returned by `learn` for this item
	pub activations: &'a [f64],
}

/// Hooks called between training steps.
pub trait TrainingObserver {
	/// Checked before every item. Returning `false` stops training.
	fn should_continue(&mut self) -> bool {
		true
	}

	/// Called after every item has been learned and persisted.
	fn on_step(&mut self, _step: &TrainingStep<'_>) {}
}

impl TrainingObserver for () {}

/// Shared cancellation switch.
///
/// Clone it, hand one copy to [`train`] as the observer and call
/// [`cancel`](Self::cancel) on another to stop before the next item.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	/// Create an unset flag.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Request cancellation.
	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	/// Check if cancellation was requested.
	#[must_use]
	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}

impl TrainingObserver for CancelFlag {
	fn should_continue(&mut self) -> bool {
		!self.is_cancelled()
	}
}

/// Outcome of a training run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingReport {
	/// Items learned and persisted
	pub completed: usize,
	/// Dataset size
	pub total: usize,
	/// Whether the observer stopped the run early
	pub cancelled: bool,
}

fn percent(done: usize, total: usize) -> u8 {
	if total == 0 {
		return 100;
	}
	let rounded = (done * 100 + total / 2) / total;
	u8::try_from(rounded).unwrap_or(100)
}

// ============================================================================
// Training
// ============================================================================

/// Learn every item in order.
///
/// # Errors
///
/// Returns the first storage error. Items before the failing one stay
/// learned and persisted; the failing item is learned in memory only.
#[instrument(skip_all, fields(items = items.len()))]
pub fn train<S, O>(
	model: &mut AssociativeMemoryModel<S>,
	items: &[TrainingItem],
	observer: &mut O,
) -> Result<TrainingReport>
where
	S: KnowledgeStore,
	O: TrainingObserver + ?Sized,
{
	let total = items.len();
	let mut report = TrainingReport {
		completed: 0,
		total,
		cancelled: false,
	};

	for (index, item) in items.iter().enumerate() {
		if !observer.should_continue() {
			debug!(completed = report.completed, "training cancelled");
			report.cancelled = true;
			return Ok(report);
		}

		let activations = model.learn(&item.question, item.answer.as_str())?;
		report.completed += 1;

		observer.on_step(&TrainingStep {
			index,
			total,
			percent: percent(index + 1, total),
			activations: &activations,
		});
	}

	debug!(completed = report.completed, "training finished");
	Ok(report)
}
