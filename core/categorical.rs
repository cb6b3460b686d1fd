/*!
This module decides how a categorical column is charted. Columns with few distinct values become pie charts, columns with a moderate number of distinct values have their long tail collapsed into an "Other" slice or fall back to a bar chart, and columns with too many or too few distinct values are excluded.
*/

use crate::classify::CategoricalColumnView;
use std::{collections::BTreeMap, fmt};

/// Columns with at most this many distinct values are charted as a pie without bucketing.
pub const PIE_MAX_DISTINCT_VALUES: usize = 10;
/// Columns with more than this many distinct values are excluded.
pub const BUCKET_MAX_DISTINCT_VALUES: usize = 20;
/// The number of most frequent values kept when the tail is collapsed.
pub const TOP_N: usize = 9;
/// The tail is collapsed only when it holds strictly less than this share of all values.
pub const OTHER_RATIO_THRESHOLD: f64 = 0.20;
pub const OTHER_LABEL: &str = "Other";

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct BucketSettings {
	pub pie_max_distinct_values: usize,
	pub bucket_max_distinct_values: usize,
	pub top_n: usize,
	pub other_ratio_threshold: f64,
	pub other_label: String,
}

impl Default for BucketSettings {
	fn default() -> Self {
		Self {
			pie_max_distinct_values: PIE_MAX_DISTINCT_VALUES,
			bucket_max_distinct_values: BUCKET_MAX_DISTINCT_VALUES,
			top_n: TOP_N,
			other_ratio_threshold: OTHER_RATIO_THRESHOLD,
			other_label: OTHER_LABEL.to_owned(),
		}
	}
}

/// The counts of each distinct value of a categorical column, sorted by descending count with ties broken by ascending value.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryBreakdown {
	pub buckets: Vec<(String, usize)>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CategoricalChart {
	Pie(CategoryBreakdown),
	/// The breakdown holds the top values followed by one bucket for the rest, whose count is `other_count`.
	BucketedPie {
		breakdown: CategoryBreakdown,
		other_count: usize,
	},
	Bar(CategoryBreakdown),
	Excluded(ExclusionReason),
}

/// Why a column has no chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
	TooManyDistinctValues,
	TooFewDistinctValues,
	UnrecognizedType,
}

impl fmt::Display for ExclusionReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let reason = match self {
			Self::TooManyDistinctValues => "too many distinct values",
			Self::TooFewDistinctValues => "too few distinct values",
			Self::UnrecognizedType => "unrecognized type",
		};
		write!(f, "{}", reason)
	}
}

impl CategoryBreakdown {
	pub fn compute(column: &CategoricalColumnView) -> Self {
		match column {
			CategoricalColumnView::Enum(column) => {
				let mut histogram = vec![0; column.options.len() + 1];
				for value in column.data {
					let index = value.map(|v| v.get()).unwrap_or(0);
					histogram[index] += 1;
				}
				// The first entry counts missing values. Options that never occur are dropped.
				Self::from_counts(
					column
						.options
						.iter()
						.zip(histogram.into_iter().skip(1))
						.filter(|(_, count)| *count > 0)
						.map(|(option, count)| (option.clone(), count)),
				)
			}
			CategoricalColumnView::Text(column) => {
				let mut histogram: BTreeMap<&str, usize> = BTreeMap::new();
				for value in column.data.iter().flatten() {
					*histogram.entry(value.as_str()).or_insert(0) += 1;
				}
				Self::from_counts(
					histogram
						.into_iter()
						.map(|(value, count)| (value.to_owned(), count)),
				)
			}
		}
	}

	pub fn from_counts(counts: impl IntoIterator<Item = (String, usize)>) -> Self {
		let mut buckets: Vec<(String, usize)> = counts.into_iter().collect();
		buckets.sort_by(|(value_a, count_a), (value_b, count_b)| {
			count_b.cmp(count_a).then_with(|| value_a.cmp(value_b))
		});
		Self { buckets }
	}

	/// The number of distinct values.
	pub fn cardinality(&self) -> usize {
		self.buckets.len()
	}

	/// The number of non-missing values.
	pub fn total(&self) -> usize {
		self.buckets.iter().map(|(_, count)| count).sum()
	}

	/// The most frequent value. Ties go to the smallest value.
	pub fn mode(&self) -> Option<&str> {
		self.buckets.first().map(|(value, _)| value.as_str())
	}

	/// Keep the top values and sum the rest into one bucket labeled `other_label`. A top value that already carries the label is folded into that bucket, so the label appears once.
	fn collapse(mut self, top_n: usize, other_label: &str) -> (Self, usize) {
		let rest = self.buckets.split_off(top_n.min(self.buckets.len()));
		let mut other_count: usize = rest.iter().map(|(_, count)| count).sum();
		if let Some(index) = self.buckets.iter().position(|(value, _)| value == other_label) {
			other_count += self.buckets.remove(index).1;
		}
		self.buckets.push((other_label.to_owned(), other_count));
		(self, other_count)
	}
}

/// Pick the chart for a categorical column from the number of distinct values and the share of values outside the top values.
pub fn bucket(breakdown: CategoryBreakdown, settings: &BucketSettings) -> CategoricalChart {
	let n = breakdown.cardinality();
	if n <= 1 {
		CategoricalChart::Excluded(ExclusionReason::TooFewDistinctValues)
	} else if n <= settings.pie_max_distinct_values {
		CategoricalChart::Pie(breakdown)
	} else if n <= settings.bucket_max_distinct_values {
		let total = breakdown.total();
		let other_count: usize = breakdown
			.buckets
			.iter()
			.skip(settings.top_n)
			.map(|(_, count)| count)
			.sum();
		let other_ratio = other_count as f64 / total as f64;
		if other_count > 0 && other_ratio < settings.other_ratio_threshold {
			let (breakdown, other_count) = breakdown.collapse(settings.top_n, &settings.other_label);
			CategoricalChart::BucketedPie {
				breakdown,
				other_count,
			}
		} else {
			CategoricalChart::Bar(breakdown)
		}
	} else {
		CategoricalChart::Excluded(ExclusionReason::TooManyDistinctValues)
	}
}

impl CategoricalChart {
	/// The buckets that are drawn, or `None` if the column is excluded.
	pub fn breakdown(&self) -> Option<&CategoryBreakdown> {
		match self {
			Self::Pie(breakdown) => Some(breakdown),
			Self::BucketedPie { breakdown, .. } => Some(breakdown),
			Self::Bar(breakdown) => Some(breakdown),
			Self::Excluded(_) => None,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use insta::assert_debug_snapshot;

	/// A breakdown with `n` distinct values `v00`, `v01`, ... each occurring once.
	fn uniform(n: usize) -> CategoryBreakdown {
		CategoryBreakdown::from_counts((0..n).map(|index| (format!("v{:02}", index), 1)))
	}

	fn counts(counts: &[usize]) -> CategoryBreakdown {
		CategoryBreakdown::from_counts(
			counts
				.iter()
				.enumerate()
				.map(|(index, count)| (format!("v{:02}", index), *count)),
		)
	}

	fn bucket_default(breakdown: CategoryBreakdown) -> CategoricalChart {
		bucket(breakdown, &BucketSettings::default())
	}

	#[test]
	fn test_boundaries() {
		assert_eq!(
			bucket_default(uniform(0)),
			CategoricalChart::Excluded(ExclusionReason::TooFewDistinctValues)
		);
		assert_eq!(
			bucket_default(uniform(1)),
			CategoricalChart::Excluded(ExclusionReason::TooFewDistinctValues)
		);
		assert!(matches!(bucket_default(uniform(2)), CategoricalChart::Pie(_)));
		assert!(matches!(bucket_default(uniform(10)), CategoricalChart::Pie(_)));
		// Two of eleven values fall outside the top nine, a share of 0.18.
		assert!(matches!(
			bucket_default(uniform(11)),
			CategoricalChart::BucketedPie { other_count: 2, .. }
		));
		assert!(matches!(bucket_default(uniform(20)), CategoricalChart::Bar(_)));
		assert_eq!(
			bucket_default(uniform(21)),
			CategoricalChart::Excluded(ExclusionReason::TooManyDistinctValues)
		);
	}

	#[test]
	fn test_other_ratio_threshold_is_exclusive() {
		// Three of fifteen values fall outside the top nine, a share of exactly 0.20.
		let breakdown = counts(&[4, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]);
		assert_eq!(breakdown.total(), 15);
		assert!(matches!(bucket_default(breakdown), CategoricalChart::Bar(_)));
		// Three of sixteen is below the threshold.
		let breakdown = counts(&[5, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]);
		assert!(matches!(
			bucket_default(breakdown),
			CategoricalChart::BucketedPie { other_count: 3, .. }
		));
	}

	#[test]
	fn test_bucketed_pie() {
		let breakdown = counts(&[10, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]);
		let total = breakdown.total();
		let chart = bucket_default(breakdown);
		let breakdown = chart.breakdown().unwrap();
		assert_eq!(breakdown.total(), total);
		assert_debug_snapshot!(chart, @r###"
  BucketedPie {
      breakdown: CategoryBreakdown {
          buckets: [
              (
                  "v00",
                  10,
              ),
              (
                  "v01",
                  1,
              ),
              (
                  "v02",
                  1,
              ),
              (
                  "v03",
                  1,
              ),
              (
                  "v04",
                  1,
              ),
              (
                  "v05",
                  1,
              ),
              (
                  "v06",
                  1,
              ),
              (
                  "v07",
                  1,
              ),
              (
                  "v08",
                  1,
              ),
              (
                  "Other",
                  2,
              ),
          ],
      },
      other_count: 2,
  }
  "###);
	}

	#[test]
	fn test_real_value_named_like_other_bucket() {
		let breakdown = CategoryBreakdown::from_counts(
			std::iter::once((OTHER_LABEL.to_owned(), 10))
				.chain((0..10).map(|index| (format!("v{:02}", index), 1))),
		);
		let total = breakdown.total();
		let chart = bucket_default(breakdown);
		assert!(matches!(chart, CategoricalChart::BucketedPie { other_count: 12, .. }));
		let breakdown = chart.breakdown().unwrap();
		let labels: Vec<&str> = breakdown.buckets.iter().map(|(value, _)| value.as_str()).collect();
		assert_eq!(
			labels,
			vec!["v00", "v01", "v02", "v03", "v04", "v05", "v06", "v07", OTHER_LABEL]
		);
		assert_eq!(breakdown.total(), total);
	}

	#[test]
	fn test_bucket_sums_equal_total() {
		for n in 0..25 {
			let breakdown = counts(&(0..n).map(|index| 30 - index).collect::<Vec<_>>());
			let total = breakdown.total();
			if let Some(breakdown) = bucket_default(breakdown).breakdown() {
				assert_eq!(breakdown.total(), total);
			}
		}
	}

	#[test]
	fn test_order_and_mode() {
		let breakdown = CategoryBreakdown::from_counts(vec![
			("pear".to_owned(), 2),
			("apple".to_owned(), 5),
			("fig".to_owned(), 5),
			("kiwi".to_owned(), 1),
		]);
		let values: Vec<&str> = breakdown.buckets.iter().map(|(value, _)| value.as_str()).collect();
		assert_eq!(values, vec!["apple", "fig", "pear", "kiwi"]);
		assert_eq!(breakdown.mode(), Some("apple"));
		assert_eq!(CategoryBreakdown::from_counts(Vec::new()).mode(), None);
	}

	#[test]
	fn test_custom_settings() {
		let settings = BucketSettings {
			pie_max_distinct_values: 3,
			top_n: 2,
			other_label: "Rest".to_owned(),
			..Default::default()
		};
		let chart = bucket(counts(&[50, 40, 5, 5]), &settings);
		let breakdown = chart.breakdown().unwrap();
		assert_eq!(breakdown.buckets.last(), Some(&("Rest".to_owned(), 10)));
	}

	#[test]
	fn test_compute() {
		use sheetlens_dataframe::prelude::*;
		use std::num::NonZeroUsize;
		let column = EnumDataFrameColumn {
			name: "city".to_owned(),
			options: vec!["berlin".to_owned(), "paris".to_owned(), "tokyo".to_owned()],
			data: vec![NonZeroUsize::new(3), NonZeroUsize::new(1), None, NonZeroUsize::new(3)],
		};
		let breakdown = CategoryBreakdown::compute(&CategoricalColumnView::Enum(column.view()));
		assert_eq!(
			breakdown.buckets,
			vec![("tokyo".to_owned(), 2), ("berlin".to_owned(), 1)]
		);
		let column = TextDataFrameColumn {
			name: "notes".to_owned(),
			data: vec![Some("b".to_owned()), None, Some("a".to_owned()), Some("b".to_owned())],
		};
		let breakdown = CategoryBreakdown::compute(&CategoricalColumnView::Text(column.view()));
		assert_eq!(breakdown, CategoryBreakdown::compute(&CategoricalColumnView::Text(column.view())));
		assert_eq!(breakdown.mode(), Some("b"));
		assert_eq!(breakdown.total(), 3);
	}
}
