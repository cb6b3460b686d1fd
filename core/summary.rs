/*!
This module summarizes every column of a dataset. Each column is classified, routed to the summarizer for its kind, and given a verdict: either the chart that should be drawn for it or the reason it is excluded.
*/

use crate::{
	categorical::{bucket, BucketSettings, CategoricalChart, CategoryBreakdown},
	chart::ChartSpec,
	classify::{ClassifiedColumn, ColumnProfile},
	number::NumberStats,
};
use chrono::NaiveDate;
use sheetlens_dataframe::prelude::*;

pub use crate::categorical::ExclusionReason;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummarySettings {
	pub bucket: BucketSettings,
}

#[derive(Clone, Debug)]
pub struct Summary {
	pub columns: Vec<ColumnSummary>,
	/// The columns without a chart, in column order.
	pub exclusions: Vec<ExclusionRecord>,
}

#[derive(Clone, Debug)]
pub struct ColumnSummary {
	pub profile: ColumnProfile,
	pub detail: ColumnDetail,
}

#[derive(Clone, Debug)]
pub enum ColumnDetail {
	Number(NumberStats),
	Categorical(CategoricalChart),
	Temporal(Vec<(NaiveDate, usize)>),
	Unrecognized,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ColumnVerdict {
	Included(ChartSpec),
	Excluded(ExclusionReason),
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ExclusionRecord {
	pub column_name: String,
	pub reason: ExclusionReason,
}

/// Summarize every column. A column that cannot be charted is recorded in `exclusions` and never stops the pass.
pub fn summarize(dataframe: &DataFrameView, settings: &SummarySettings) -> Summary {
	let columns: Vec<ColumnSummary> = dataframe
		.columns
		.iter()
		.map(|column| ColumnSummary::compute(column, settings))
		.collect();
	let mut exclusions = Vec::new();
	for column in columns.iter() {
		match column.verdict() {
			ColumnVerdict::Included(chart) => {
				log::debug!(
					"column \"{}\" is {:?} and is charted as {:?}",
					column.profile.name,
					column.profile.kind,
					chart.kind()
				);
			}
			ColumnVerdict::Excluded(reason) => {
				if reason == ExclusionReason::TooFewDistinctValues {
					log::warn!("column \"{}\" is excluded: {}", column.profile.name, reason);
				} else {
					log::debug!("column \"{}\" is excluded: {}", column.profile.name, reason);
				}
				exclusions.push(ExclusionRecord {
					column_name: column.profile.name.clone(),
					reason,
				});
			}
		}
	}
	log::info!(
		"summarized {} columns, {} excluded",
		columns.len(),
		exclusions.len()
	);
	Summary {
		columns,
		exclusions,
	}
}

impl ColumnSummary {
	pub fn compute(column: &DataFrameColumnView, settings: &SummarySettings) -> Self {
		let profile = ColumnProfile::compute(column);
		let detail = match ClassifiedColumn::new(column) {
			ClassifiedColumn::Numeric(column) => {
				ColumnDetail::Number(NumberStats::compute(&column))
			}
			ClassifiedColumn::Categorical(column) => ColumnDetail::Categorical(bucket(
				CategoryBreakdown::compute(&column),
				&settings.bucket,
			)),
			ClassifiedColumn::Temporal(column) => {
				ColumnDetail::Temporal(crate::temporal::aggregate_by_date(&column))
			}
			ClassifiedColumn::Unrecognized { .. } => ColumnDetail::Unrecognized,
		};
		Self { profile, detail }
	}

	/// The chart for this column, or the reason it has none. Number and date columns without a single value have nothing to chart.
	pub fn verdict(&self) -> ColumnVerdict {
		let title = self.profile.name.clone();
		match &self.detail {
			ColumnDetail::Number(stats) if stats.count == 0 => {
				ColumnVerdict::Excluded(ExclusionReason::TooFewDistinctValues)
			}
			ColumnDetail::Number(stats) => ColumnVerdict::Included(ChartSpec::Histogram {
				title,
				bins: stats.binned_histogram.clone(),
			}),
			ColumnDetail::Categorical(chart) => match chart {
				CategoricalChart::Pie(breakdown) | CategoricalChart::BucketedPie { breakdown, .. } => {
					ColumnVerdict::Included(ChartSpec::Pie {
						title,
						slices: breakdown.buckets.clone(),
					})
				}
				CategoricalChart::Bar(breakdown) => ColumnVerdict::Included(ChartSpec::Bar {
					title,
					bars: breakdown
						.buckets
						.iter()
						.map(|(value, count)| (value.clone(), *count as f64))
						.collect(),
				}),
				CategoricalChart::Excluded(reason) => ColumnVerdict::Excluded(*reason),
			},
			ColumnDetail::Temporal(counts) if counts.is_empty() => {
				ColumnVerdict::Excluded(ExclusionReason::TooFewDistinctValues)
			}
			ColumnDetail::Temporal(counts) => ColumnVerdict::Included(ChartSpec::Line {
				title,
				points: counts.clone(),
			}),
			ColumnDetail::Unrecognized => ColumnVerdict::Excluded(ExclusionReason::UnrecognizedType),
		}
	}
}

impl Summary {
	/// The stats of every number column, in column order.
	pub fn number_stats(&self) -> impl Iterator<Item = &NumberStats> {
		self.columns.iter().filter_map(|column| match &column.detail {
			ColumnDetail::Number(stats) => Some(stats),
			_ => None,
		})
	}

	/// The charts of every included column, in column order.
	pub fn charts(&self) -> Vec<ChartSpec> {
		self.columns
			.iter()
			.filter_map(|column| match column.verdict() {
				ColumnVerdict::Included(chart) => Some(chart),
				ColumnVerdict::Excluded(_) => None,
			})
			.collect()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{chart::ChartKind, classify::ColumnKind};
	use insta::assert_debug_snapshot;

	fn dataframe() -> DataFrame {
		let mut csv = String::from("amount,city,when,flag,id,empty\n");
		for index in 0..30 {
			csv.push_str(&format!(
				"{},{},2024-01-0{},{},id{},\n",
				index,
				["berlin", "paris", "tokyo"][index % 3],
				index % 4 + 1,
				index % 2 == 0,
				index
			));
		}
		DataFrame::from_bytes(csv.as_bytes(), Default::default()).unwrap()
	}

	#[test]
	fn test_summarize() {
		let dataframe = dataframe();
		let summary = summarize(&dataframe.view(), &SummarySettings::default());
		let kinds: Vec<ColumnKind> = summary.columns.iter().map(|column| column.profile.kind).collect();
		assert_eq!(
			kinds,
			vec![
				ColumnKind::Numeric,
				ColumnKind::Categorical,
				ColumnKind::Temporal,
				ColumnKind::Unrecognized,
				ColumnKind::Categorical,
				ColumnKind::Unrecognized,
			]
		);
		let charts: Vec<ChartKind> = summary.charts().iter().map(|chart| chart.kind()).collect();
		assert_eq!(charts, vec![ChartKind::Histogram, ChartKind::Pie, ChartKind::Line]);
		assert_debug_snapshot!(summary.exclusions, @r###"
  [
      ExclusionRecord {
          column_name: "flag",
          reason: UnrecognizedType,
      },
      ExclusionRecord {
          column_name: "id",
          reason: TooManyDistinctValues,
      },
      ExclusionRecord {
          column_name: "empty",
          reason: UnrecognizedType,
      },
  ]
  "###);
		let stats: Vec<&NumberStats> = summary.number_stats().collect();
		assert_eq!(stats.len(), 1);
		assert_eq!(stats[0].count, 30);
		assert_eq!(stats[0].median(), 14.5);
	}

	#[test]
	fn test_degenerate_columns() {
		let mut dataframe =
			DataFrame::from_bytes(b"amount,when,city\n,,a\nNA,,a\n", Default::default()).unwrap();
		dataframe.columns[0] = DataFrameColumn::Number(NumberDataFrameColumn {
			name: "amount".to_owned(),
			data: vec![f64::NAN, f64::NAN],
		});
		dataframe.columns[1] = DataFrameColumn::Date(DateDataFrameColumn {
			name: "when".to_owned(),
			data: vec![None, None],
		});
		let summary = summarize(&dataframe.view(), &SummarySettings::default());
		let reasons: Vec<ExclusionReason> = summary.exclusions.iter().map(|record| record.reason).collect();
		assert_eq!(reasons, vec![ExclusionReason::TooFewDistinctValues; 3]);
		// The stats of an all-missing number column are still reported.
		let stats: Vec<&NumberStats> = summary.number_stats().collect();
		assert_eq!(stats[0].count, 0);
		assert!(stats[0].mean.is_nan());
	}

	#[test]
	fn test_summarize_is_idempotent() {
		let dataframe = dataframe();
		let settings = SummarySettings::default();
		let a = summarize(&dataframe.view(), &settings);
		let b = summarize(&dataframe.view(), &settings);
		assert_eq!(format!("{:?}", a), format!("{:?}", b));
		assert_eq!(a.charts(), b.charts());
	}
}
