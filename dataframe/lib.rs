/*!
This crate provides a basic implementation of dataframes, which are two dimensional arrays of data where each column can have a different data type, like a spreadsheet. Every column stores its cells in a single typed vector, and every cell may be missing: number columns use `NaN` for missing cells, all other columns use `None`.
*/

use chrono::{NaiveDateTime, Timelike};
use std::num::NonZeroUsize;

mod load;

pub use self::load::*;

pub mod prelude {
	pub use super::{
		BoolDataFrameColumn, BoolDataFrameColumnView, DataFrame, DataFrameColumn,
		DataFrameColumnType, DataFrameColumnView, DataFrameView, DateDataFrameColumn,
		DateDataFrameColumnView, EnumDataFrameColumn, EnumDataFrameColumnView, FromCsvOptions,
		InferOptions, NumberDataFrameColumn, NumberDataFrameColumnView, TextDataFrameColumn,
		TextDataFrameColumnView, UnknownDataFrameColumn, UnknownDataFrameColumnView,
	};
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<DataFrameColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrameView<'a> {
	pub columns: Vec<DataFrameColumnView<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataFrameColumn {
	Unknown(UnknownDataFrameColumn),
	Number(NumberDataFrameColumn),
	Bool(BoolDataFrameColumn),
	Date(DateDataFrameColumn),
	Enum(EnumDataFrameColumn),
	Text(TextDataFrameColumn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownDataFrameColumn {
	pub name: String,
	pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberDataFrameColumn {
	pub name: String,
	pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoolDataFrameColumn {
	pub name: String,
	pub data: Vec<Option<bool>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateDataFrameColumn {
	pub name: String,
	pub data: Vec<Option<NaiveDateTime>>,
}

/// An enum column stores each cell as a one-based index into `options`. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDataFrameColumn {
	pub name: String,
	pub options: Vec<String>,
	pub data: Vec<Option<NonZeroUsize>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextDataFrameColumn {
	pub name: String,
	pub data: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataFrameColumnView<'a> {
	Unknown(UnknownDataFrameColumnView<'a>),
	Number(NumberDataFrameColumnView<'a>),
	Bool(BoolDataFrameColumnView<'a>),
	Date(DateDataFrameColumnView<'a>),
	Enum(EnumDataFrameColumnView<'a>),
	Text(TextDataFrameColumnView<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownDataFrameColumnView<'a> {
	pub name: &'a str,
	pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberDataFrameColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [f64],
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoolDataFrameColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [Option<bool>],
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateDataFrameColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [Option<NaiveDateTime>],
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDataFrameColumnView<'a> {
	pub name: &'a str,
	pub options: &'a [String],
	pub data: &'a [Option<NonZeroUsize>],
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextDataFrameColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [Option<String>],
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataFrameColumnType {
	Unknown,
	Number,
	Bool,
	Date,
	Enum { options: Vec<String> },
	Text,
}

impl DataFrame {
	pub fn new(column_names: Vec<String>, column_types: Vec<DataFrameColumnType>) -> Self {
		let columns = column_names
			.into_iter()
			.zip(column_types.into_iter())
			.map(|(column_name, column_type)| match column_type {
				DataFrameColumnType::Unknown => {
					DataFrameColumn::Unknown(UnknownDataFrameColumn::new(column_name))
				}
				DataFrameColumnType::Number => {
					DataFrameColumn::Number(NumberDataFrameColumn::new(column_name))
				}
				DataFrameColumnType::Bool => {
					DataFrameColumn::Bool(BoolDataFrameColumn::new(column_name))
				}
				DataFrameColumnType::Date => {
					DataFrameColumn::Date(DateDataFrameColumn::new(column_name))
				}
				DataFrameColumnType::Enum { options } => {
					DataFrameColumn::Enum(EnumDataFrameColumn::new(column_name, options))
				}
				DataFrameColumnType::Text => {
					DataFrameColumn::Text(TextDataFrameColumn::new(column_name))
				}
			})
			.collect();
		Self { columns }
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn column_names(&self) -> Vec<&str> {
		self.columns.iter().map(|column| column.name()).collect()
	}

	pub fn view(&self) -> DataFrameView {
		let columns = self.columns.iter().map(|column| column.view()).collect();
		DataFrameView { columns }
	}
}

impl DataFrameColumn {
	pub fn len(&self) -> usize {
		match self {
			Self::Unknown(s) => s.len,
			Self::Number(s) => s.data.len(),
			Self::Bool(s) => s.data.len(),
			Self::Date(s) => s.data.len(),
			Self::Enum(s) => s.data.len(),
			Self::Text(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Unknown(s) => s.name.as_str(),
			Self::Number(s) => s.name.as_str(),
			Self::Bool(s) => s.name.as_str(),
			Self::Date(s) => s.name.as_str(),
			Self::Enum(s) => s.name.as_str(),
			Self::Text(s) => s.name.as_str(),
		}
	}

	pub fn view(&self) -> DataFrameColumnView {
		match self {
			Self::Unknown(column) => DataFrameColumnView::Unknown(column.view()),
			Self::Number(column) => DataFrameColumnView::Number(column.view()),
			Self::Bool(column) => DataFrameColumnView::Bool(column.view()),
			Self::Date(column) => DataFrameColumnView::Date(column.view()),
			Self::Enum(column) => DataFrameColumnView::Enum(column.view()),
			Self::Text(column) => DataFrameColumnView::Text(column.view()),
		}
	}
}

impl UnknownDataFrameColumn {
	pub fn new(name: String) -> Self {
		Self { name, len: 0 }
	}

	pub fn view(&self) -> UnknownDataFrameColumnView {
		UnknownDataFrameColumnView {
			name: &self.name,
			len: self.len,
		}
	}
}

impl NumberDataFrameColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> NumberDataFrameColumnView {
		NumberDataFrameColumnView {
			name: &self.name,
			data: &self.data,
		}
	}
}

impl BoolDataFrameColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> BoolDataFrameColumnView {
		BoolDataFrameColumnView {
			name: &self.name,
			data: &self.data,
		}
	}
}

impl DateDataFrameColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> DateDataFrameColumnView {
		DateDataFrameColumnView {
			name: &self.name,
			data: &self.data,
		}
	}
}

impl EnumDataFrameColumn {
	pub fn new(name: String, options: Vec<String>) -> Self {
		Self {
			name,
			options,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> EnumDataFrameColumnView {
		EnumDataFrameColumnView {
			name: &self.name,
			options: &self.options,
			data: &self.data,
		}
	}
}

impl TextDataFrameColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> TextDataFrameColumnView {
		TextDataFrameColumnView {
			name: &self.name,
			data: &self.data,
		}
	}
}

impl<'a> DataFrameView<'a> {
	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	/// Find a column by name. If several columns share a name, the first wins.
	pub fn column(&self, name: &str) -> Option<&DataFrameColumnView<'a>> {
		self.columns.iter().find(|column| column.name() == name)
	}

	pub fn split_at_row(&self, index: usize) -> (Self, Self) {
		let iter = self.columns.iter().map(|column| column.split_at_row(index));
		let mut columns_a = Vec::with_capacity(self.columns.len());
		let mut columns_b = Vec::with_capacity(self.columns.len());
		for (column_a, column_b) in iter {
			columns_a.push(column_a);
			columns_b.push(column_b);
		}
		(Self { columns: columns_a }, Self { columns: columns_b })
	}

	/// Return a view of at most the first `n` rows.
	pub fn head(&self, n: usize) -> Self {
		let (head, _) = self.split_at_row(n.min(self.nrows()));
		head
	}
}

impl<'a> DataFrameColumnView<'a> {
	pub fn len(&self) -> usize {
		match self {
			Self::Unknown(s) => s.len,
			Self::Number(s) => s.data.len(),
			Self::Bool(s) => s.data.len(),
			Self::Date(s) => s.data.len(),
			Self::Enum(s) => s.data.len(),
			Self::Text(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &'a str {
		match self {
			Self::Unknown(s) => s.name,
			Self::Number(s) => s.name,
			Self::Bool(s) => s.name,
			Self::Date(s) => s.name,
			Self::Enum(s) => s.name,
			Self::Text(s) => s.name,
		}
	}

	pub fn as_number(&self) -> Option<NumberDataFrameColumnView<'a>> {
		match self {
			Self::Number(s) => Some(s.clone()),
			_ => None,
		}
	}

	/// Return whether the cell at `index` is missing. Every cell of an unknown column is missing.
	pub fn is_missing(&self, index: usize) -> bool {
		match self {
			Self::Unknown(_) => true,
			Self::Number(s) => !s.data[index].is_finite(),
			Self::Bool(s) => s.data[index].is_none(),
			Self::Date(s) => s.data[index].is_none(),
			Self::Enum(s) => s.data[index].is_none(),
			Self::Text(s) => s.data[index].is_none(),
		}
	}

	/// Render the cell at `index` as text, or `None` if it is missing.
	pub fn display_value(&self, index: usize) -> Option<String> {
		if self.is_missing(index) {
			return None;
		}
		match self {
			Self::Unknown(_) => None,
			Self::Number(s) => Some(s.data[index].to_string()),
			Self::Bool(s) => s.data[index].map(|value| value.to_string()),
			Self::Date(s) => s.data[index].map(format_date_time),
			Self::Enum(s) => s.data[index].map(|value| s.options[value.get() - 1].clone()),
			Self::Text(s) => s.data[index].clone(),
		}
	}

	pub fn split_at_row(&self, index: usize) -> (Self, Self) {
		match self {
			Self::Unknown(column) => (
				Self::Unknown(UnknownDataFrameColumnView {
					name: column.name,
					len: index,
				}),
				Self::Unknown(UnknownDataFrameColumnView {
					name: column.name,
					len: column.len - index,
				}),
			),
			Self::Number(column) => {
				let (data_a, data_b) = column.data.split_at(index);
				(
					Self::Number(NumberDataFrameColumnView {
						name: column.name,
						data: data_a,
					}),
					Self::Number(NumberDataFrameColumnView {
						name: column.name,
						data: data_b,
					}),
				)
			}
			Self::Bool(column) => {
				let (data_a, data_b) = column.data.split_at(index);
				(
					Self::Bool(BoolDataFrameColumnView {
						name: column.name,
						data: data_a,
					}),
					Self::Bool(BoolDataFrameColumnView {
						name: column.name,
						data: data_b,
					}),
				)
			}
			Self::Date(column) => {
				let (data_a, data_b) = column.data.split_at(index);
				(
					Self::Date(DateDataFrameColumnView {
						name: column.name,
						data: data_a,
					}),
					Self::Date(DateDataFrameColumnView {
						name: column.name,
						data: data_b,
					}),
				)
			}
			Self::Enum(column) => {
				let (data_a, data_b) = column.data.split_at(index);
				(
					Self::Enum(EnumDataFrameColumnView {
						name: column.name,
						options: column.options,
						data: data_a,
					}),
					Self::Enum(EnumDataFrameColumnView {
						name: column.name,
						options: column.options,
						data: data_b,
					}),
				)
			}
			Self::Text(column) => {
				let (data_a, data_b) = column.data.split_at(index);
				(
					Self::Text(TextDataFrameColumnView {
						name: column.name,
						data: data_a,
					}),
					Self::Text(TextDataFrameColumnView {
						name: column.name,
						data: data_b,
					}),
				)
			}
		}
	}
}

/// Dates at midnight are rendered without their time of day.
fn format_date_time(value: NaiveDateTime) -> String {
	if value.num_seconds_from_midnight() == 0 && value.nanosecond() == 0 {
		value.format("%Y-%m-%d").to_string()
	} else {
		value.format("%Y-%m-%d %H:%M:%S").to_string()
	}
}
