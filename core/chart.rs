/*!
Chart specifications handed to a renderer. A `ChartSpec` carries the kind of chart and the series to draw, never any drawing.
*/

use chrono::NaiveDate;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
	Pie,
	Bar,
	Line,
	Histogram,
	Heatmap,
}

impl fmt::Display for ChartKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match self {
			Self::Pie => "pie",
			Self::Bar => "bar",
			Self::Line => "line",
			Self::Histogram => "histogram",
			Self::Heatmap => "heatmap",
		};
		write!(f, "{}", kind)
	}
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
	Pie {
		title: String,
		slices: Vec<(String, usize)>,
	},
	Bar {
		title: String,
		bars: Vec<(String, f64)>,
	},
	Line {
		title: String,
		points: Vec<(NaiveDate, usize)>,
	},
	Histogram {
		title: String,
		bins: Vec<((f64, f64), usize)>,
	},
	Heatmap {
		title: String,
		row_labels: Vec<String>,
		column_labels: Vec<String>,
		/// One inner vector per row.
		values: Vec<Vec<f64>>,
	},
}

impl ChartSpec {
	pub fn kind(&self) -> ChartKind {
		match self {
			Self::Pie { .. } => ChartKind::Pie,
			Self::Bar { .. } => ChartKind::Bar,
			Self::Line { .. } => ChartKind::Line,
			Self::Histogram { .. } => ChartKind::Histogram,
			Self::Heatmap { .. } => ChartKind::Heatmap,
		}
	}
}
