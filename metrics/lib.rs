/*!
This crate defines the [`Metric`](trait.Metric.html) and [`StreamingMetric`](trait.StreamingMetric.html) traits and the statistics computed on top of them: streaming means and variances, [`LinearRegression`](struct.LinearRegression.html) and [`WelchTTest`](struct.WelchTTest.html).
*/

#![allow(clippy::tabs_in_doc_comments)]

use thiserror::Error;

mod linear_regression;
mod mean_variance;

pub use self::linear_regression::{LinearRegression, LinearRegressionOutput};
pub use self::mean_variance::{m2_to_sample_variance, merge_mean_m2, MeanVariance};
pub use self::welch_t_test::{WelchTTest, WelchTTestInput, WelchTTestOutput};

/**
The `Metric` trait defines a common interface to metrics that can be computed when the entire input is available at once.

The seemingly unused generic lifetime `'a` exists here to allow `Input`s and `Output`s to borrow from their enclosing scope.
*/
pub trait Metric<'a> {
	type Input;
	type Output;
	fn compute(input: Self::Input) -> Self::Output;
}

/**
The `StreamingMetric` trait defines a common interface to metrics that can be computed in a streaming manner, where the input is available in chunks, such as a mean or a least squares fit.

After being initialized, a value of type `T` implementing the `StreamingMetric` trait can have `update()` called on it with values of the associated type `Input`. Multiple values of `T` can be merged together by calling `merge()`. When finished aggregating, you can call `finalize()` on the metric to produce the associated type `Output`.

# Examples

Here is a basic example implementation of a `Min` metric, which takes `f64`s as input and produces an `f64` as output that is the minimum of all the inputs.

```
use sheetlens_metrics::StreamingMetric;

struct Min(f64);

impl StreamingMetric<'_> for Min {
	type Input = f64;
	type Output = f64;
	fn update(&mut self, input: Self::Input) {
		self.0 = self.0.min(input)
	}
	fn merge(&mut self, other: Self) { self.0 = self.0.min(other.0) }
	fn finalize(self) -> Self::Output { self.0 }
}
```
*/
pub trait StreamingMetric<'a> {
	/// `Input` is the type to aggregate in calls to `update()`.
	type Input;
	/// `Output` is the return type of `finalize()`.
	type Output;
	/// Update this streaming metric with the `Input` `input`.
	fn update(&mut self, input: Self::Input);
	/// Merge multiple independently computed streaming metrics.
	fn merge(&mut self, other: Self);
	/// When you are done aggregating `Input`s, call `finalize()` to produce an `Output`.
	fn finalize(self) -> Self::Output;
}

/// The ways a statistic can be impossible to compute from its input.
#[derive(Debug, Error, PartialEq)]
pub enum StatisticsError {
	#[error("at least {needed} observations are required but only {found} were provided")]
	TooFewObservations { needed: usize, found: usize },
	#[error("the {0} has zero variance")]
	ZeroVariance(&'static str),
	#[error("the statistic is not finite")]
	NotFinite,
}
