//! Benchmarks for activation computation
//!
//! Tests performance of:
//! - Reference neuron hashing
//! - Distance-decayed propagation across the cloud
//! - Top-k ranking
//! - Normalization and colour mapping

#![allow(clippy::expect_used)] // Fine in benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use holochat_core::{
	activation_colors, generate_neurons, propagate, reference_index, top_neurons,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate random activations in `(0, 0.005]`
fn generate_activations(count: usize) -> Vec<f64> {
	let mut rng = rand::thread_rng();
	(0..count).map(|_| rng.gen::<f64>().mul_add(-0.005, 0.005)).collect()
}

fn bench_reference_index(c: &mut Criterion) {
	let mut group = c.benchmark_group("reference_index");

	for len in &[16_usize, 256, 4096] {
		let text = "q".repeat(*len);

		let _ = group.throughput(Throughput::Bytes(*len as u64));
		let _ = group.bench_with_input(BenchmarkId::new("chars", len), len, |bench, _| {
			bench.iter(|| reference_index(black_box(&text), 1000));
		});
	}

	group.finish();
}

fn bench_propagate(c: &mut Criterion) {
	let mut group = c.benchmark_group("propagate");

	for count in &[100_usize, 1000, 10_000] {
		let neurons = generate_neurons(*count, 100.0, &mut StdRng::seed_from_u64(1));

		let _ = group.throughput(Throughput::Elements(*count as u64));
		let _ = group.bench_with_input(BenchmarkId::new("neurons", count), count, |bench, _| {
			bench.iter(|| propagate(black_box(&neurons), count / 2, 100.0, 0.005));
		});
	}

	group.finish();
}

fn bench_top_neurons(c: &mut Criterion) {
	let mut group = c.benchmark_group("top_neurons");

	for count in &[100_usize, 1000, 10_000] {
		let activations = generate_activations(*count);

		for k in &[5_usize, 10] {
			let _ = group.bench_with_input(
				BenchmarkId::new(format!("k{k}"), count),
				count,
				|bench, _| {
					bench.iter(|| top_neurons(black_box(&activations), *k));
				},
			);
		}
	}

	group.finish();
}

fn bench_activation_colors(c: &mut Criterion) {
	let mut group = c.benchmark_group("activation_colors");

	for count in &[1000_usize, 10_000] {
		let activations = generate_activations(*count);

		let _ = group.throughput(Throughput::Elements(*count as u64));
		let _ = group.bench_with_input(BenchmarkId::new("neurons", count), count, |bench, _| {
			bench.iter(|| activation_colors(black_box(&activations)));
		});
	}

	group.finish();
}

criterion_group!(
	benches,
	bench_reference_index,
	bench_propagate,
	bench_top_neurons,
	bench_activation_colors,
);

criterion_main!(benches);
