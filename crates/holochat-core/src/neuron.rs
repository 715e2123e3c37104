//! Neurons
//!
//! A neuron is a point in a cubic 3D space. Its position is drawn once and
//! never moves; its activation is overwritten by every query.

use nalgebra::Point3;
use rand::Rng;

/// A point-like neuron.
#[derive(Clone, Debug, PartialEq)]
pub struct Neuron {
	position: Point3<f64>,
	/// Activation from the most recent query
	pub activation: f64,
}

impl Neuron {
	/// Create a neuron at `position` with zero activation.
	#[must_use]
	pub const fn new(position: Point3<f64>) -> Self {
		Self {
			position,
			activation: 0.0,
		}
	}

	/// Fixed position of this neuron.
	#[inline]
	#[must_use]
	pub const fn position(&self) -> &Point3<f64> {
		&self.position
	}

	/// Euclidean distance to another neuron.
	#[inline]
	#[must_use]
	pub fn distance_to(&self, other: &Self) -> f64 {
		nalgebra::distance(&self.position, &other.position)
	}

	/// Position as a plain `[x, y, z]` triple for scene setup.
	#[must_use]
	pub fn coordinates(&self) -> [f64; 3] {
		[self.position.x, self.position.y, self.position.z]
	}
}

/// Place `count` neurons uniformly at random in `[0, space_size)³`.
///
/// Each axis is drawn independently from `rng`; a seeded generator gives a
/// reproducible cloud.
pub fn generate_neurons<R: Rng + ?Sized>(count: usize, space_size: f64, rng: &mut R) -> Vec<Neuron> {
	(0..count)
		.map(|_| {
			Neuron::new(Point3::new(
				rng.gen_range(0.0..space_size),
				rng.gen_range(0.0..space_size),
				rng.gen_range(0.0..space_size),
			))
		})
		.collect()
}
