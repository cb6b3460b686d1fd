use sheetlens_dataframe::prelude::*;
use sheetlens_util::finite::Finite;
use std::{collections::BTreeSet, fmt};

/// The semantic kind of a column, which decides how it is summarized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
	Numeric,
	Categorical,
	Temporal,
	Unrecognized,
}

impl fmt::Display for ColumnKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match self {
			Self::Numeric => "numeric",
			Self::Categorical => "categorical",
			Self::Temporal => "temporal",
			Self::Unrecognized => "unrecognized",
		};
		write!(f, "{}", kind)
	}
}

/// A column paired with its kind, so that downstream code receives the typed view it needs.
#[derive(Clone, Debug)]
pub enum ClassifiedColumn<'a> {
	Numeric(NumberDataFrameColumnView<'a>),
	Categorical(CategoricalColumnView<'a>),
	Temporal(DateDataFrameColumnView<'a>),
	Unrecognized { name: &'a str },
}

/// The two storage types that hold categorical values.
#[derive(Clone, Debug)]
pub enum CategoricalColumnView<'a> {
	Enum(EnumDataFrameColumnView<'a>),
	Text(TextDataFrameColumnView<'a>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnProfile {
	pub name: String,
	pub kind: ColumnKind,
	/// The number of distinct non-missing values.
	pub cardinality: usize,
	pub missing_count: usize,
}

pub fn classify(column: &DataFrameColumnView) -> ColumnKind {
	ClassifiedColumn::new(column).kind()
}

impl<'a> ClassifiedColumn<'a> {
	pub fn new(column: &DataFrameColumnView<'a>) -> Self {
		match column {
			DataFrameColumnView::Number(column) => Self::Numeric(column.clone()),
			DataFrameColumnView::Date(column) => Self::Temporal(column.clone()),
			DataFrameColumnView::Enum(column) => {
				Self::Categorical(CategoricalColumnView::Enum(column.clone()))
			}
			DataFrameColumnView::Text(column) => {
				Self::Categorical(CategoricalColumnView::Text(column.clone()))
			}
			DataFrameColumnView::Bool(column) => Self::Unrecognized { name: column.name },
			DataFrameColumnView::Unknown(column) => Self::Unrecognized { name: column.name },
		}
	}

	pub fn kind(&self) -> ColumnKind {
		match self {
			Self::Numeric(_) => ColumnKind::Numeric,
			Self::Categorical(_) => ColumnKind::Categorical,
			Self::Temporal(_) => ColumnKind::Temporal,
			Self::Unrecognized { .. } => ColumnKind::Unrecognized,
		}
	}
}

impl ColumnProfile {
	pub fn compute(column: &DataFrameColumnView) -> Self {
		let missing_count = (0..column.len())
			.filter(|index| column.is_missing(*index))
			.count();
		let cardinality = match column {
			DataFrameColumnView::Unknown(_) => 0,
			DataFrameColumnView::Number(column) => column
				.data
				.iter()
				.filter_map(|value| Finite::new(*value).ok())
				.collect::<BTreeSet<_>>()
				.len(),
			DataFrameColumnView::Bool(column) => {
				column.data.iter().flatten().collect::<BTreeSet<_>>().len()
			}
			DataFrameColumnView::Date(column) => {
				column.data.iter().flatten().collect::<BTreeSet<_>>().len()
			}
			DataFrameColumnView::Enum(column) => {
				column.data.iter().flatten().collect::<BTreeSet<_>>().len()
			}
			DataFrameColumnView::Text(column) => column
				.data
				.iter()
				.flatten()
				.map(|value| value.as_str())
				.collect::<BTreeSet<_>>()
				.len(),
		};
		Self {
			name: column.name().to_owned(),
			kind: classify(column),
			cardinality,
			missing_count,
		}
	}
}
