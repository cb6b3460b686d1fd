/*!
This module builds pivot tables: one value column aggregated over every combination of the values of the row key columns and the column key columns.
*/

use crate::{
	chart::ChartSpec,
	error::{ComputationError, Error, UserInputError},
};
use itertools::Itertools;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use sheetlens_dataframe::prelude::*;
use sheetlens_util::finite::Finite;
use std::{
	cmp::Ordering,
	collections::{BTreeMap, BTreeSet},
	fmt,
	str::FromStr,
};

/// Column key combinations are labeled by joining their values with this separator.
pub const KEY_SEPARATOR: &str = " / ";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregator {
	Sum,
	Mean,
	Count,
	Median,
	Min,
	Max,
}

pub const AGGREGATORS: [Aggregator; 6] = [
	Aggregator::Sum,
	Aggregator::Mean,
	Aggregator::Count,
	Aggregator::Median,
	Aggregator::Min,
	Aggregator::Max,
];

impl Aggregator {
	pub fn name(self) -> &'static str {
		match self {
			Self::Sum => "sum",
			Self::Mean => "mean",
			Self::Count => "count",
			Self::Median => "median",
			Self::Min => "min",
			Self::Max => "max",
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Sum => "Sum",
			Self::Mean => "Mean",
			Self::Count => "Count",
			Self::Median => "Median",
			Self::Min => "Minimum",
			Self::Max => "Maximum",
		}
	}

	/// Every aggregator but `count` reads the value column as numbers.
	pub fn requires_numeric(self) -> bool {
		!matches!(self, Self::Count)
	}
}

impl fmt::Display for Aggregator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.name())
	}
}

impl FromStr for Aggregator {
	type Err = UserInputError;
	fn from_str(value: &str) -> Result<Self, Self::Err> {
		AGGREGATORS
			.iter()
			.find(|aggregator| aggregator.name() == value)
			.cloned()
			.ok_or_else(|| UserInputError::UnknownAggregator(value.to_owned()))
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct PivotSpec {
	pub row_keys: Vec<String>,
	pub column_keys: Vec<String>,
	pub value_column: Option<String>,
	pub aggregator: Aggregator,
}

/// The value of one key cell. Numbers sort numerically and before text.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
	Number(Finite<f64>),
	Text(String),
}

impl fmt::Display for KeyValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Number(value) => write!(f, "{}", value),
			Self::Text(value) => write!(f, "{}", value),
		}
	}
}

impl KeyValue {
	/// Read the key at `index`, or `None` if the cell is missing.
	fn from_column(column: &DataFrameColumnView, index: usize) -> Option<Self> {
		match column {
			DataFrameColumnView::Number(column) => Finite::new(column.data[index]).ok().map(Self::Number),
			column => column.display_value(index).map(Self::Text),
		}
	}
}

#[derive(Clone, Debug)]
pub struct PivotResult {
	pub spec: PivotSpec,
	/// The distinct row key combinations, sorted ascending.
	pub row_keys: Vec<Vec<KeyValue>>,
	/// The distinct column key combinations, sorted ascending. Without column keys there is a single empty combination.
	pub column_keys: Vec<Vec<KeyValue>>,
	/// The aggregated values, one row per row key combination and one column per column key combination.
	pub values: Array2<f64>,
}

#[derive(Clone, Debug, Default)]
struct Accumulator {
	count: usize,
	numbers: Vec<f64>,
	sum: f64,
	min: Option<f64>,
	max: Option<f64>,
}

impl Accumulator {
	/// `number` is `None` when the value column is read for counting only.
	fn update(&mut self, number: Option<f64>) {
		self.count += 1;
		if let Some(number) = number {
			self.numbers.push(number);
			self.sum += number;
			self.min = Some(self.min.map_or(number, |min| min.min(number)));
			self.max = Some(self.max.map_or(number, |max| max.max(number)));
		}
	}

	/// `None` when a numeric aggregate has no values to aggregate. Sums and counts of nothing are zero.
	fn finalize(mut self, aggregator: Aggregator) -> Option<f64> {
		let n = self.numbers.len();
		let value = match aggregator {
			Aggregator::Count => self.count.to_f64().unwrap(),
			Aggregator::Sum => self.sum,
			_ if n == 0 => return None,
			Aggregator::Mean => self.sum / n.to_f64().unwrap(),
			Aggregator::Min => self.min.unwrap_or(0.0),
			Aggregator::Max => self.max.unwrap_or(0.0),
			Aggregator::Median => {
				self.numbers
					.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
				if n % 2 == 1 {
					self.numbers[n / 2]
				} else {
					(self.numbers[n / 2 - 1] + self.numbers[n / 2]) / 2.0
				}
			}
		};
		if value.is_finite() {
			Some(value)
		} else {
			Some(0.0)
		}
	}
}

/// Read the key combination of a row, or `None` if any of its cells is missing.
fn read_key(columns: &[&DataFrameColumnView], index: usize) -> Option<Vec<KeyValue>> {
	columns
		.iter()
		.map(|column| KeyValue::from_column(column, index))
		.collect()
}

/// Build a pivot table. Rows whose key cells are missing belong to no group. Groups whose mean, median, min or max has no values are dropped, so a row or column key made only of such groups disappears. Key combinations that remain absent are filled with zero.
pub fn build_pivot(dataframe: &DataFrameView, spec: &PivotSpec) -> Result<PivotResult, Error> {
	if spec.row_keys.is_empty() {
		return Err(UserInputError::NoRowKeys.into());
	}
	let value_column_name = spec
		.value_column
		.as_deref()
		.ok_or(UserInputError::NoValueColumn)?;
	let find_column = |name: &str| {
		dataframe
			.column(name)
			.ok_or_else(|| UserInputError::UnknownColumn(name.to_owned()))
	};
	let row_columns = spec
		.row_keys
		.iter()
		.map(|name| find_column(name))
		.collect::<Result<Vec<_>, _>>()?;
	let column_columns = spec
		.column_keys
		.iter()
		.map(|name| find_column(name))
		.collect::<Result<Vec<_>, _>>()?;
	let value_column = find_column(value_column_name)?;
	let numbers = match (spec.aggregator.requires_numeric(), value_column) {
		(false, _) => None,
		(true, DataFrameColumnView::Number(column)) => Some(column.data),
		(true, _) => {
			return Err(ComputationError::AggregationTypeMismatch {
				column: value_column_name.to_owned(),
				aggregator: spec.aggregator,
			}
			.into())
		}
	};

	let mut groups: BTreeMap<(Vec<KeyValue>, Vec<KeyValue>), Accumulator> = BTreeMap::new();
	for index in 0..dataframe.nrows() {
		let row_key = match read_key(&row_columns, index) {
			Some(row_key) => row_key,
			None => continue,
		};
		let column_key = match read_key(&column_columns, index) {
			Some(column_key) => column_key,
			None => continue,
		};
		let accumulator = groups.entry((row_key, column_key)).or_default();
		if !value_column.is_missing(index) {
			accumulator.update(numbers.map(|numbers| numbers[index]));
		}
	}
	log::debug!(
		"pivot of {} by {:?} and {:?} has {} groups",
		value_column_name,
		spec.row_keys,
		spec.column_keys,
		groups.len()
	);

	let groups: BTreeMap<(Vec<KeyValue>, Vec<KeyValue>), f64> = groups
		.into_iter()
		.filter_map(|(key, accumulator)| {
			accumulator
				.finalize(spec.aggregator)
				.map(|value| (key, value))
		})
		.collect();
	let row_keys: Vec<Vec<KeyValue>> = groups
		.keys()
		.map(|(row_key, _)| row_key.clone())
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect();
	let column_keys: Vec<Vec<KeyValue>> = if spec.column_keys.is_empty() {
		vec![Vec::new()]
	} else {
		groups
			.keys()
			.map(|(_, column_key)| column_key.clone())
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect()
	};
	let mut values = Array::zeros((row_keys.len(), column_keys.len()));
	for ((row_key, column_key), value) in groups {
		if let (Ok(row), Ok(column)) = (
			row_keys.binary_search(&row_key),
			column_keys.binary_search(&column_key),
		) {
			values[[row, column]] = value;
		}
	}
	Ok(PivotResult {
		spec: spec.clone(),
		row_keys,
		column_keys,
		values,
	})
}

impl PivotResult {
	pub fn nrows(&self) -> usize {
		self.row_keys.len()
	}

	pub fn ncols(&self) -> usize {
		self.column_keys.len()
	}

	pub fn value_column(&self) -> &str {
		self.spec.value_column.as_deref().unwrap_or_default()
	}

	pub fn row_labels(&self) -> Vec<String> {
		self.row_keys
			.iter()
			.map(|row_key| row_key.iter().join(KEY_SEPARATOR))
			.collect()
	}

	/// Without column keys the single value column is labeled with the value column's name.
	pub fn column_labels(&self) -> Vec<String> {
		if self.spec.column_keys.is_empty() {
			return vec![self.value_column().to_owned()];
		}
		self.column_keys
			.iter()
			.map(|column_key| column_key.iter().join(KEY_SEPARATOR))
			.collect()
	}

	/// The header of the flattened table: one column per row key followed by one per column key combination.
	pub fn header(&self) -> Vec<String> {
		self.spec
			.row_keys
			.iter()
			.cloned()
			.chain(self.column_labels())
			.collect()
	}

	/// Flatten the table to text cells, with the row key values in the leading columns.
	pub fn to_table(&self) -> (Vec<String>, Array2<String>) {
		let header = self.header();
		let mut cells = Array::from_elem((self.nrows(), header.len()), String::new());
		for (mut cells_row, (row_key, values_row)) in cells
			.axis_iter_mut(Axis(0))
			.zip(self.row_keys.iter().zip(self.values.axis_iter(Axis(0))))
		{
			let row_cells = row_key
				.iter()
				.map(|key| key.to_string())
				.chain(values_row.iter().map(|value| value.to_string()));
			for (cell, text) in cells_row.iter_mut().zip(row_cells) {
				*cell = text;
			}
		}
		(header, cells)
	}

	/// Look up a cell by the text of its row and column keys.
	pub fn get(&self, row_key: &[&str], column_key: &[&str]) -> Option<f64> {
		let matches = |key: &[KeyValue], text: &[&str]| {
			key.len() == text.len() && key.iter().zip(text.iter()).all(|(a, b)| a.to_string() == *b)
		};
		let row = self.row_keys.iter().position(|key| matches(key, row_key))?;
		let column = self
			.column_keys
			.iter()
			.position(|key| matches(key, column_key))?;
		Some(self.values[[row, column]])
	}

	/// A bar chart of the single value column, or a heatmap when there are column keys.
	pub fn chart(&self) -> ChartSpec {
		let title = format!(
			"{} of {} by {}",
			self.spec.aggregator.label(),
			self.value_column(),
			self.spec.row_keys.iter().join(KEY_SEPARATOR)
		);
		if self.spec.column_keys.is_empty() {
			ChartSpec::Bar {
				title,
				bars: self
					.row_labels()
					.into_iter()
					.zip(self.values.column(0).iter().cloned())
					.collect(),
			}
		} else {
			ChartSpec::Heatmap {
				title,
				row_labels: self.row_labels(),
				column_labels: self.column_labels(),
				values: self
					.values
					.axis_iter(Axis(0))
					.map(|row| row.to_vec())
					.collect(),
			}
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn dataframe() -> DataFrame {
		DataFrame::from_bytes(
			b"region,bucket,amount,note\nA,1,10,x\nA,2,20,\nB,1,5,y\n",
			Default::default(),
		)
		.unwrap()
	}

	fn spec(row_keys: &[&str], column_keys: &[&str], value_column: &str, aggregator: Aggregator) -> PivotSpec {
		PivotSpec {
			row_keys: row_keys.iter().map(|name| name.to_string()).collect(),
			column_keys: column_keys.iter().map(|name| name.to_string()).collect(),
			value_column: Some(value_column.to_owned()),
			aggregator,
		}
	}

	#[test]
	fn test_sum_and_count() {
		let dataframe = dataframe();
		let view = dataframe.view();
		let sum = build_pivot(&view, &spec(&["region"], &[], "amount", Aggregator::Sum)).unwrap();
		assert_eq!(sum.row_labels(), vec!["A", "B"]);
		assert_eq!(sum.column_labels(), vec!["amount"]);
		assert_eq!(sum.get(&["A"], &[]), Some(30.0));
		assert_eq!(sum.get(&["B"], &[]), Some(5.0));
		let count = build_pivot(&view, &spec(&["region"], &[], "amount", Aggregator::Count)).unwrap();
		assert_eq!(count.get(&["A"], &[]), Some(2.0));
		assert_eq!(count.get(&["B"], &[]), Some(1.0));
	}

	#[test]
	fn test_column_keys_fill_zero() {
		let dataframe = dataframe();
		let view = dataframe.view();
		let pivot = build_pivot(&view, &spec(&["region"], &["bucket"], "amount", Aggregator::Sum)).unwrap();
		assert_eq!(pivot.column_labels(), vec!["1", "2"]);
		assert_eq!(pivot.get(&["A"], &["1"]), Some(10.0));
		assert_eq!(pivot.get(&["A"], &["2"]), Some(20.0));
		assert_eq!(pivot.get(&["B"], &["1"]), Some(5.0));
		assert_eq!(pivot.get(&["B"], &["2"]), Some(0.0));
		let (header, cells) = pivot.to_table();
		assert_eq!(header, vec!["region", "1", "2"]);
		let rows: Vec<Vec<String>> = cells.genrows().into_iter().map(|row| row.to_vec()).collect();
		assert_eq!(rows, vec![vec!["A", "10", "20"], vec!["B", "5", "0"]]);
	}

	#[test]
	fn test_count_of_text_column() {
		let dataframe = dataframe();
		let view = dataframe.view();
		let pivot = build_pivot(&view, &spec(&["region"], &[], "note", Aggregator::Count)).unwrap();
		// The missing note is not counted.
		assert_eq!(pivot.get(&["A"], &[]), Some(1.0));
		assert_eq!(pivot.get(&["B"], &[]), Some(1.0));
	}

	#[test]
	fn test_aggregation_type_mismatch() {
		let dataframe = dataframe();
		let view = dataframe.view();
		let error = build_pivot(&view, &spec(&["region"], &[], "note", Aggregator::Sum)).unwrap_err();
		assert!(matches!(
			error,
			Error::Computation(ComputationError::AggregationTypeMismatch {
				aggregator: Aggregator::Sum,
				..
			})
		));
		assert_eq!(
			error.to_string(),
			"cannot compute the sum of column \"note\" because it is not numeric, use count for text columns"
		);
	}

	#[test]
	fn test_invalid_selections() {
		let dataframe = dataframe();
		let view = dataframe.view();
		let error = build_pivot(&view, &spec(&[], &[], "amount", Aggregator::Sum)).unwrap_err();
		assert!(matches!(error, Error::UserInput(UserInputError::NoRowKeys)));
		let mut no_value = spec(&["region"], &[], "amount", Aggregator::Sum);
		no_value.value_column = None;
		let error = build_pivot(&view, &no_value).unwrap_err();
		assert!(matches!(error, Error::UserInput(UserInputError::NoValueColumn)));
		let error = build_pivot(&view, &spec(&["city"], &[], "amount", Aggregator::Sum)).unwrap_err();
		assert!(matches!(error, Error::UserInput(UserInputError::UnknownColumn(name)) if name == "city"));
	}

	#[test]
	fn test_other_aggregators() {
		let dataframe = DataFrame::from_bytes(
			b"group,value\na,1\na,2\na,9\nb,4\nb,\nc,\n",
			Default::default(),
		)
		.unwrap();
		let view = dataframe.view();
		let pivot = |aggregator| build_pivot(&view, &spec(&["group"], &[], "value", aggregator)).unwrap();
		let mean = pivot(Aggregator::Mean);
		assert_eq!(mean.get(&["a"], &[]), Some(4.0));
		assert_eq!(mean.get(&["b"], &[]), Some(4.0));
		// A group whose values are all missing has no mean, so its row is dropped.
		assert_eq!(mean.row_labels(), vec!["a", "b"]);
		assert_eq!(mean.get(&["c"], &[]), None);
		assert_eq!(pivot(Aggregator::Sum).get(&["c"], &[]), Some(0.0));
		assert_eq!(pivot(Aggregator::Median).get(&["a"], &[]), Some(2.0));
		assert_eq!(pivot(Aggregator::Min).get(&["a"], &[]), Some(1.0));
		assert_eq!(pivot(Aggregator::Max).get(&["a"], &[]), Some(9.0));
		assert_eq!(pivot(Aggregator::Count).get(&["b"], &[]), Some(1.0));
		assert_eq!(pivot(Aggregator::Count).get(&["c"], &[]), Some(0.0));
	}

	#[test]
	fn test_groups_without_values() {
		let dataframe = DataFrame::from_bytes(
			b"g,k,v\na,x,1\na,y,\nb,x,2\nb,y,4\nc,z,\n",
			Default::default(),
		)
		.unwrap();
		let view = dataframe.view();
		for aggregator in [Aggregator::Mean, Aggregator::Median, Aggregator::Min, Aggregator::Max].iter() {
			let pivot = build_pivot(&view, &spec(&["g"], &["k"], "v", *aggregator)).unwrap();
			assert_eq!(pivot.row_labels(), vec!["a", "b"]);
			assert_eq!(pivot.column_labels(), vec!["x", "y"]);
			// The combination survives through its row and column, so it is filled.
			assert_eq!(pivot.get(&["a"], &["y"]), Some(0.0));
			assert_eq!(pivot.get(&["b"], &["y"]), Some(4.0));
		}
		let sum = build_pivot(&view, &spec(&["g"], &["k"], "v", Aggregator::Sum)).unwrap();
		assert_eq!(sum.row_labels(), vec!["a", "b", "c"]);
		assert_eq!(sum.column_labels(), vec!["x", "y", "z"]);
		assert_eq!(sum.get(&["c"], &["z"]), Some(0.0));
		let count = build_pivot(&view, &spec(&["g"], &[], "v", Aggregator::Count)).unwrap();
		assert_eq!(count.get(&["c"], &[]), Some(0.0));
	}

	#[test]
	fn test_key_order_and_missing_keys() {
		let dataframe = DataFrame::from_bytes(b"size,value\n10,1\n9,1\n100,1\n,1\n10,1\n", Default::default()).unwrap();
		let view = dataframe.view();
		let pivot = build_pivot(&view, &spec(&["size"], &[], "value", Aggregator::Count)).unwrap();
		assert_eq!(pivot.row_labels(), vec!["9", "10", "100"]);
		assert_eq!(pivot.values.column(0).to_vec(), vec![1.0, 2.0, 1.0]);
	}

	#[test]
	fn test_chart() {
		let dataframe = dataframe();
		let view = dataframe.view();
		let pivot = build_pivot(&view, &spec(&["region"], &[], "amount", Aggregator::Sum)).unwrap();
		assert_eq!(
			pivot.chart(),
			ChartSpec::Bar {
				title: "Sum of amount by region".to_owned(),
				bars: vec![("A".to_owned(), 30.0), ("B".to_owned(), 5.0)],
			}
		);
		let pivot = build_pivot(&view, &spec(&["region"], &["bucket"], "amount", Aggregator::Sum)).unwrap();
		assert_eq!(pivot.chart().kind(), crate::chart::ChartKind::Heatmap);
	}

	#[test]
	fn test_parse_aggregator() {
		assert_eq!("median".parse::<Aggregator>(), Ok(Aggregator::Median));
		assert_eq!(
			"total".parse::<Aggregator>(),
			Err(UserInputError::UnknownAggregator("total".to_owned()))
		);
		for aggregator in AGGREGATORS.iter() {
			assert_eq!(aggregator.name().parse::<Aggregator>(), Ok(*aggregator));
		}
	}

	#[test]
	fn test_idempotent() {
		let dataframe = dataframe();
		let view = dataframe.view();
		let spec = spec(&["region"], &["bucket"], "amount", Aggregator::Mean);
		let a = build_pivot(&view, &spec).unwrap();
		let b = build_pivot(&view, &spec).unwrap();
		assert_eq!(a.row_keys, b.row_keys);
		assert_eq!(a.column_keys, b.column_keys);
		assert_eq!(a.values, b.values);
	}
}
