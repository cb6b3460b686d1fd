//! https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance#Parallel_algorithm

use super::StreamingMetric;
use num_traits::ToPrimitive;

/// Combine two separate means and m2s into a single mean and m2.
pub fn merge_mean_m2(
	n_a: u64,
	mean_a: f64,
	m2_a: f64,
	n_b: u64,
	mean_b: f64,
	m2_b: f64,
) -> (f64, f64) {
	let n_a = n_a.to_f64().unwrap();
	let n_b = n_b.to_f64().unwrap();
	if n_a + n_b == 0.0 {
		return (0.0, 0.0);
	}
	(
		(((n_a * mean_a) + (n_b * mean_b)) / (n_a + n_b)),
		m2_a + m2_b + (mean_b - mean_a) * (mean_b - mean_a) * (n_a * n_b / (n_a + n_b)),
	)
}

/// The sample variance, dividing by `n - 1`. It is `NaN` for fewer than two values.
pub fn m2_to_sample_variance(m2: f64, n: u64) -> f64 {
	if n < 2 {
		return f64::NAN;
	}
	m2 / (n - 1).to_f64().unwrap()
}

/// A streaming mean and variance. Non-finite inputs are skipped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeanVariance {
	pub n: u64,
	pub mean: f64,
	pub m2: f64,
}

impl MeanVariance {
	pub fn compute(values: impl IntoIterator<Item = f64>) -> Self {
		let mut mean_variance = Self::default();
		for value in values {
			mean_variance.update(value);
		}
		mean_variance
	}

	pub fn sample_variance(&self) -> f64 {
		m2_to_sample_variance(self.m2, self.n)
	}
}

impl StreamingMetric<'_> for MeanVariance {
	type Input = f64;
	type Output = (f64, f64);

	fn update(&mut self, input: f64) {
		if !input.is_finite() {
			return;
		}
		let (mean, m2) = merge_mean_m2(self.n, self.mean, self.m2, 1, input, 0.0);
		self.n += 1;
		self.mean = mean;
		self.m2 = m2;
	}

	fn merge(&mut self, other: Self) {
		let (mean, m2) = merge_mean_m2(self.n, self.mean, self.m2, other.n, other.mean, other.m2);
		self.n += other.n;
		self.mean = mean;
		self.m2 = m2;
	}

	/// Return the mean and the sample variance.
	fn finalize(self) -> (f64, f64) {
		if self.n == 0 {
			return (f64::NAN, f64::NAN);
		}
		(self.mean, self.sample_variance())
	}
}

#[test]
fn test_mean_variance() {
	let (mean, variance) = MeanVariance::compute(vec![1.0, 2.0, 3.0, 4.0, 5.0]).finalize();
	assert!((mean - 3.0).abs() < 1e-12);
	assert!((variance - 2.5).abs() < 1e-12);
}

#[test]
fn test_mean_variance_merge() {
	let mut a = MeanVariance::compute(vec![1.0, 2.0]);
	let b = MeanVariance::compute(vec![3.0, 4.0, 5.0]);
	a.merge(b);
	assert_eq!(a.n, 5);
	assert!((a.mean - 3.0).abs() < 1e-12);
	assert!((a.m2 - 10.0).abs() < 1e-12);
	assert!((a.sample_variance() - 2.5).abs() < 1e-12);
}

#[test]
fn test_mean_variance_skips_missing() {
	let mean_variance = MeanVariance::compute(vec![f64::NAN, 2.0, f64::INFINITY, 4.0]);
	assert_eq!(mean_variance.n, 2);
	assert_eq!(mean_variance.mean, 3.0);
	let (mean, variance) = MeanVariance::default().finalize();
	assert!(mean.is_nan());
	assert!(variance.is_nan());
}
