use num_traits::ToPrimitive;
use sheetlens_dataframe::prelude::*;
use sheetlens_metrics as metrics;
use sheetlens_util::finite::Finite;
use std::{cmp::Ordering, collections::BTreeMap};

/// The number of equal-width bins in the histogram charted for a numeric column.
pub const NUMBER_HISTOGRAM_BIN_COUNT: usize = 10;

/// This struct contains the summary statistics of a number column.
#[derive(Clone, Debug)]
pub struct NumberStats {
	/// This is the name of the column.
	pub column_name: String,
	/// This is the number of non-missing values the stats were computed on.
	pub count: usize,
	pub missing_count: usize,
	pub unique_count: usize,
	/// Equal-width bins spanning `min` to `max`.
	pub binned_histogram: Vec<((f64, f64), usize)>,
	pub mean: f64,
	pub min: f64,
	pub max: f64,
	/// The sample variance.
	pub variance: f64,
	/// The sample standard deviation.
	pub std: f64,
	pub p25: f64,
	/// The median.
	pub p50: f64,
	pub p75: f64,
}

impl NumberStats {
	/// Compute the stats of a number column. Missing values are skipped. If every value is missing, every statistic is `NaN` and `count` is zero.
	pub fn compute(column: &NumberDataFrameColumnView) -> Self {
		let mut histogram: BTreeMap<Finite<f64>, usize> = BTreeMap::new();
		let mut missing_count = 0;
		for value in column.data {
			// Values that are not finite are missing.
			if let Ok(value) = Finite::new(*value) {
				*histogram.entry(value).or_insert(0) += 1;
			} else {
				missing_count += 1;
			}
		}
		let count = column.data.len() - missing_count;
		if count == 0 {
			return Self {
				column_name: column.name.to_owned(),
				count,
				missing_count,
				unique_count: 0,
				binned_histogram: Vec::new(),
				mean: f64::NAN,
				min: f64::NAN,
				max: f64::NAN,
				variance: f64::NAN,
				std: f64::NAN,
				p25: f64::NAN,
				p50: f64::NAN,
				p75: f64::NAN,
			};
		}
		let min = histogram.keys().next().map(|value| value.get()).unwrap_or(f64::NAN);
		let max = histogram
			.keys()
			.next_back()
			.map(|value| value.get())
			.unwrap_or(f64::NAN);
		let quantiles = quantiles(&histogram, count, &[0.25, 0.50, 0.75]);
		let mut current_count = 0;
		let mut mean = 0.0;
		let mut m2 = 0.0;
		for (value, count) in histogram.iter() {
			let count = count.to_u64().unwrap();
			let (new_mean, new_m2) =
				metrics::merge_mean_m2(current_count, mean, m2, count, value.get(), 0.0);
			mean = new_mean;
			m2 = new_m2;
			current_count += count;
		}
		let variance = metrics::m2_to_sample_variance(m2, count.to_u64().unwrap());
		let binned_histogram = binned_histogram(&histogram, min, max, NUMBER_HISTOGRAM_BIN_COUNT);
		let unique_count = histogram.len();
		Self {
			column_name: column.name.to_owned(),
			count,
			missing_count,
			unique_count,
			binned_histogram,
			mean,
			min,
			max,
			variance,
			std: variance.sqrt(),
			p25: quantiles[0],
			p50: quantiles[1],
			p75: quantiles[2],
		}
	}

	pub fn median(&self) -> f64 {
		self.p50
	}
}

/// Compute quantiles from a histogram of `count` values, interpolating linearly between neighboring values when a quantile falls between them.
fn quantiles(histogram: &BTreeMap<Finite<f64>, usize>, count: usize, quantiles: &[f64]) -> Vec<f64> {
	let total_values_count = count.to_f64().unwrap();
	// Find the index of each quantile given the total number of values.
	let quantile_indexes: Vec<usize> = quantiles
		.iter()
		.map(|q| ((total_values_count - 1.0) * q).trunc().to_usize().unwrap())
		.collect();
	let quantile_fracts: Vec<f64> = quantiles
		.iter()
		.map(|q| ((total_values_count - 1.0) * q).fract())
		.collect();
	let mut result: Vec<Option<f64>> = vec![None; quantiles.len()];
	let mut current_count: usize = 0;
	let mut iter = histogram.iter().peekable();
	while let Some((value, count)) = iter.next() {
		let value = value.get();
		current_count += count;
		let quantiles_iter = result
			.iter_mut()
			.zip(quantile_indexes.iter().zip(quantile_fracts.iter()))
			.filter(|(q, (_, _))| q.is_none());
		for (quantile, (index, fract)) in quantiles_iter {
			match (current_count - 1).cmp(index) {
				Ordering::Equal => {
					if *fract > 0.0 {
						// Interpolate between this value and the next.
						let next_value = iter.peek().map(|(value, _)| value.get()).unwrap_or(value);
						*quantile = Some(value * (1.0 - fract) + next_value * fract);
					} else {
						*quantile = Some(value);
					}
				}
				Ordering::Greater => *quantile = Some(value),
				Ordering::Less => {}
			}
		}
	}
	result.into_iter().map(|q| q.unwrap_or(f64::NAN)).collect()
}

fn binned_histogram(
	histogram: &BTreeMap<Finite<f64>, usize>,
	min: f64,
	max: f64,
	bin_count: usize,
) -> Vec<((f64, f64), usize)> {
	if histogram.is_empty() {
		return Vec::new();
	}
	if min == max {
		return vec![((min, max), histogram.values().sum())];
	}
	let bin_width = (max - min) / bin_count.to_f64().unwrap();
	let mut bins: Vec<((f64, f64), usize)> = (0..bin_count)
		.map(|index| {
			let start = min + index.to_f64().unwrap() * bin_width;
			let end = if index == bin_count - 1 {
				max
			} else {
				start + bin_width
			};
			((start, end), 0)
		})
		.collect();
	for (value, count) in histogram.iter() {
		let index = ((value.get() - min) / bin_width)
			.floor()
			.to_usize()
			.unwrap_or(0)
			.min(bin_count - 1);
		bins[index].1 += count;
	}
	bins
}

#[cfg(test)]
mod test {
	use super::*;

	fn compute(data: &[f64]) -> NumberStats {
		let column = NumberDataFrameColumnView {
			name: "value",
			data,
		};
		NumberStats::compute(&column)
	}

	#[test]
	fn test_number_stats() {
		let stats = compute(&[1.0, 2.0, 3.0, 4.0, 5.0]);
		assert_eq!(stats.count, 5);
		assert_eq!(stats.mean, 3.0);
		assert_eq!(stats.median(), 3.0);
		assert_eq!(stats.min, 1.0);
		assert_eq!(stats.max, 5.0);
		assert_eq!(stats.p25, 2.0);
		assert_eq!(stats.p75, 4.0);
		assert!((stats.variance - 2.5).abs() < 1e-12);
		assert!((stats.std - 1.5811388300841898).abs() < 1e-12);
	}

	#[test]
	fn test_median_interpolates() {
		let stats = compute(&[4.0, 1.0, f64::NAN, 2.0, 2.0]);
		assert_eq!(stats.count, 4);
		assert_eq!(stats.missing_count, 1);
		assert_eq!(stats.median(), 2.0);
		let stats = compute(&[1.0, 2.0, 3.0, 10.0]);
		assert_eq!(stats.median(), 2.5);
		assert_eq!(stats.p25, 1.75);
		assert_eq!(stats.unique_count, 4);
	}

	#[test]
	fn test_all_missing() {
		let stats = compute(&[f64::NAN, f64::INFINITY]);
		assert_eq!(stats.count, 0);
		assert_eq!(stats.missing_count, 2);
		assert!(stats.mean.is_nan());
		assert!(stats.median().is_nan());
		assert!(stats.std.is_nan());
		assert!(stats.binned_histogram.is_empty());
	}

	#[test]
	fn test_single_value() {
		let stats = compute(&[7.0, 7.0]);
		assert_eq!(stats.mean, 7.0);
		assert_eq!(stats.median(), 7.0);
		assert_eq!(stats.std, 0.0);
		assert_eq!(stats.binned_histogram, vec![((7.0, 7.0), 2)]);
		let stats = compute(&[7.0]);
		assert!(stats.std.is_nan());
	}

	#[test]
	fn test_binned_histogram() {
		let data: Vec<f64> = (0..=10).map(|value| value as f64).collect();
		let stats = compute(&data);
		let counts: Vec<usize> = stats.binned_histogram.iter().map(|(_, count)| *count).collect();
		assert_eq!(counts, vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 2]);
		assert_eq!(stats.binned_histogram[9].0, (9.0, 10.0));
		let total: usize = counts.iter().sum();
		assert_eq!(total, stats.count);
	}
}
