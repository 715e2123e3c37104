//! Activation Calculation
//!
//! Light propagating through the neuron cloud.
//!
//! Input text picks a **reference neuron** by hashing its character codes:
//!
//! ```text
//! r = (Σ code_units(text)) mod N
//! ```
//!
//! Every neuron then receives activation that decays with its distance from
//! the reference neuron:
//!
//! ```text
//! a_i = exp(-‖p_i − p_r‖ / S) · I
//! ```
//!
//! Where `S` is the side of the cube the neurons live in and `I` the
//! intensity. The reference neuron itself always receives exactly `I`.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::neuron::Neuron;

// ============================================================================
// Reference Neuron
// ============================================================================

/// Select the reference neuron for `text`.
///
/// Sums the UTF-16 code units of `text` and reduces modulo `neuron_count`.
/// The reduction is applied at every step so arbitrarily long input cannot
/// overflow; the result equals the reduction of the full sum.
///
/// Returns 0 when `neuron_count` is 0.
#[must_use]
pub fn reference_index(text: &str, neuron_count: usize) -> usize {
	if neuron_count == 0 {
		return 0;
	}

	text.encode_utf16()
		.fold(0usize, |acc, unit| (acc + usize::from(unit)) % neuron_count)
}

// ============================================================================
// Distance Decay
// ============================================================================

/// Activation received at `distance` from the reference neuron.
///
/// `exp(-distance / space_size) · intensity`
#[inline]
#[must_use]
pub fn decayed_activation(distance: f64, space_size: f64, intensity: f64) -> f64 {
	(-distance / space_size).exp() * intensity
}

/// Compute the activation of every neuron relative to `reference`.
///
/// One value per neuron, in neuron order. Returns an empty vector if
/// `reference` is out of range.
#[must_use]
pub fn propagate(neurons: &[Neuron], reference: usize, space_size: f64, intensity: f64) -> Vec<f64> {
	let Some(origin) = neurons.get(reference) else {
		return Vec::new();
	};

	neurons
		.iter()
		.map(|neuron| decayed_activation(neuron.distance_to(origin), space_size, intensity))
		.collect()
}

// ============================================================================
// Ranking
// ============================================================================

/// Indices of the `k` most activated neurons, strongest first.
///
/// The sort is stable: equal activations keep ascending index order.
#[must_use]
pub fn top_neurons(activations: &[f64], k: usize) -> Vec<usize> {
	let mut indexed: Vec<usize> = (0..activations.len()).collect();
	indexed.sort_by(|&a, &b| descending(activations[a], activations[b]));
	indexed.truncate(k);
	indexed
}

#[inline]
fn descending(a: f64, b: f64) -> Ordering {
	b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

// ============================================================================
// Visualization
// ============================================================================

/// Scale activations into `[0, 1]` by dividing by the maximum.
///
/// An empty vector, or one whose maximum is zero, negative or not finite,
/// carries no activation and maps to all zeros.
#[must_use]
pub fn normalize_activations(activations: &[f64]) -> Vec<f64> {
	let max = activations.iter().copied().fold(f64::NEG_INFINITY, f64::max);

	if !max.is_finite() || max <= 0.0 {
		return vec![0.0; activations.len()];
	}

	activations.iter().map(|&a| a / max).collect()
}

/// Emissive colour for a neuron point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuronColor {
	/// Red channel (0-1)
	pub r: f64,
	/// Green channel (0-1)
	pub g: f64,
	/// Blue channel (0-1)
	pub b: f64,
	/// Emissive intensity (0-1)
	pub emissive_intensity: f64,
}

/// Map a normalized activation onto a blue → red ramp.
///
/// NaN is treated as unactivated and everything else is clamped to `[0, 1]`.
#[must_use]
pub fn activation_color(normalized: f64) -> NeuronColor {
	let n = if normalized.is_nan() {
		0.0
	} else {
		normalized.clamp(0.0, 1.0)
	};

	NeuronColor {
		r: n,
		g: 0.0,
		b: 1.0 - n,
		emissive_intensity: n,
	}
}

/// Normalize a full activation vector and map every entry to a colour.
#[must_use]
pub fn activation_colors(activations: &[f64]) -> Vec<NeuronColor> {
	normalize_activations(activations)
		.into_iter()
		.map(activation_color)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use nalgebra::Point3;

	fn line_of_neurons(count: u8) -> Vec<Neuron> {
		(0..count)
			.map(|x| Neuron::new(Point3::new(f64::from(x), 0.0, 0.0)))
			.collect()
	}

	#[test]
	fn reference_index_is_code_unit_sum_mod_n() {
		// 'a' = 97, 'b' = 98
		assert_eq!(reference_index("ab", 1000), 195);
		assert_eq!(reference_index("ab", 100), 95);
		assert_eq!(reference_index("", 10), 0);
		assert_eq!(reference_index("anything", 0), 0);
	}

	#[test]
	fn reference_index_uses_utf16_units() {
		// U+1F600 is the surrogate pair D83D DE00
		let expected = (0xD83D + 0xDE00) % 1000;
		assert_eq!(reference_index("\u{1F600}", 1000), expected);
	}

	#[test]
	fn reference_index_long_text_matches_plain_sum() {
		let text = "z".repeat(10_000);
		assert_eq!(reference_index(&text, 997), (122 * 10_000) % 997);
	}

	#[test]
	fn reference_neuron_receives_full_intensity() {
		let neurons = line_of_neurons(5);
		let activations = propagate(&neurons, 2, 100.0, 0.005);

		assert_eq!(activations.len(), 5);
		assert_eq!(activations[2], 0.005);
		assert!(activations[1] < 0.005);
		assert_eq!(activations[1], activations[3]);
	}

	#[test]
	fn propagate_out_of_range_reference_is_empty() {
		let neurons = line_of_neurons(3);
		assert!(propagate(&neurons, 3, 1.0, 1.0).is_empty());
	}

	#[test]
	fn decay_follows_exponential() {
		let a = decayed_activation(100.0, 100.0, 2.0);
		assert!((a - 2.0 * (-1.0f64).exp()).abs() < 1e-12);
	}

	#[test]
	fn top_neurons_orders_strongest_first() {
		let activations = [0.1, 0.5, 0.3, 0.9];
		assert_eq!(top_neurons(&activations, 2), vec![3, 1]);
		assert_eq!(top_neurons(&activations, 10), vec![3, 1, 2, 0]);
	}

	#[test]
	fn top_neurons_ties_keep_index_order() {
		let activations = [0.2, 0.7, 0.2, 0.7, 0.2];
		assert_eq!(top_neurons(&activations, 5), vec![1, 3, 0, 2, 4]);
	}

	#[test]
	fn normalize_divides_by_max() {
		let normalized = normalize_activations(&[1.0, 2.0, 4.0]);
		assert_eq!(normalized, vec![0.25, 0.5, 1.0]);
	}

	#[test]
	fn normalize_guards_degenerate_vectors() {
		assert!(normalize_activations(&[]).is_empty());
		assert_eq!(normalize_activations(&[0.0, 0.0]), vec![0.0, 0.0]);
		assert_eq!(normalize_activations(&[f64::NAN, f64::NAN]), vec![0.0, 0.0]);
	}

	#[test]
	fn colors_run_blue_to_red() {
		let cold = activation_color(0.0);
		assert_eq!((cold.r, cold.g, cold.b), (0.0, 0.0, 1.0));

		let hot = activation_color(1.0);
		assert_eq!((hot.r, hot.b, hot.emissive_intensity), (1.0, 0.0, 1.0));

		assert_eq!(activation_color(f64::NAN), cold);
		assert_eq!(activation_color(3.0), hot);
	}

	#[test]
	fn all_zero_vector_is_neutral() {
		let colors = activation_colors(&[0.0; 4]);
		assert!(colors.iter().all(|c| c.emissive_intensity == 0.0));
	}
}
