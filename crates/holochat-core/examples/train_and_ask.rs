//! Train and Ask Example
//!
//! This example walks through the whole model lifecycle:
//! 1. Build a model over a seeded neuron cloud
//! 2. Train it on the built-in dataset
//! 3. Ask questions, known and unknown
//! 4. Export the knowledge and load it into a fresh model
//!
//! Run with: `cargo run --example train_and_ask`

use holochat_core::{
	default_dataset, normalize_activations, train, AssociativeMemoryModel, MemoryStore,
	ModelConfig, ModelError, TrainingObserver, TrainingStep,
};

/// Prints a progress line after every learned item
struct Progress;

impl TrainingObserver for Progress {
	fn on_step(&mut self, step: &TrainingStep<'_>) {
		println!("  learned {}/{} ({}%)", step.index + 1, step.total, step.percent);
	}
}

fn main() -> Result<(), ModelError> {
	println!("=== Holographic Associative Memory ===\n");

	let config = ModelConfig::default();
	let mut model = AssociativeMemoryModel::with_seed(config.clone(), MemoryStore::new(), 2024)?;

	println!(
		"{} neurons in a {}³ cube, intensity {}\n",
		config.neuron_count, config.space_size, config.intensity
	);

	println!("Training:");
	let report = train(&mut model, &default_dataset(), &mut Progress)?;
	println!("  {} associations stored\n", report.completed);

	let questions = [
		"What is the capital of France?",
		"Who painted the Mona Lisa?",
		"What is the airspeed velocity of an unladen swallow?",
	];

	for question in questions {
		let answer = model.respond(question);
		let hot = normalize_activations(&answer.activations)
			.iter()
			.filter(|&&a| a > 0.9)
			.count();

		println!("Q: {question}");
		println!("   reference neuron: {}", model.reference_index(question));
		println!("   neurons above 90% of peak: {hot}");
		println!("A: {}\n", answer.response);
	}

	// Knowledge is portable: a model over a different cloud accepts it as
	// long as it has the same number of neurons.
	let document = model.export_knowledge()?;
	let mut fresh = AssociativeMemoryModel::with_seed(config, MemoryStore::new(), 7)?;
	let imported = fresh.import_knowledge(&document);

	println!("Exported {} bytes, imported: {imported}", document.len());
	println!("Fresh model knows {} inputs", fresh.len());

	Ok(())
}
