use super::*;
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use fnv::FnvHashMap;
use std::{
	collections::{BTreeMap, BTreeSet},
	io::{Cursor, Read, Seek},
	num::NonZeroUsize,
	path::Path,
};

#[derive(Clone)]
pub struct FromCsvOptions<'a> {
	pub column_types: Option<BTreeMap<String, DataFrameColumnType>>,
	pub infer_options: InferOptions,
	pub invalid_values: &'a [&'a str],
}

impl<'a> Default for FromCsvOptions<'a> {
	fn default() -> Self {
		Self {
			column_types: None,
			infer_options: InferOptions::default(),
			invalid_values: DEFAULT_INVALID_VALUES,
		}
	}
}

#[derive(Clone, Debug)]
pub struct InferOptions {
	pub enum_max_unique_values: usize,
}

impl Default for InferOptions {
	fn default() -> Self {
		Self {
			enum_max_unique_values: 100,
		}
	}
}

/// These values are the default values that are considered missing.
pub const DEFAULT_INVALID_VALUES: &[&str] = &[
	"", "null", "NULL", "n/a", "N/A", "NA", "nan", "-nan", "NaN", "-NaN", "?",
];

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

impl DataFrame {
	pub fn from_path(path: &Path, options: FromCsvOptions) -> Result<Self> {
		Self::from_csv(&mut csv::Reader::from_path(path)?, options)
	}

	/// Load a dataframe from the raw bytes of an uploaded csv file.
	pub fn from_bytes(bytes: &[u8], options: FromCsvOptions) -> Result<Self> {
		let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
		Self::from_csv(&mut csv::Reader::from_reader(Cursor::new(bytes)), options)
	}

	pub fn from_csv<R>(reader: &mut csv::Reader<R>, options: FromCsvOptions) -> Result<Self>
	where
		R: Read + Seek,
	{
		let column_names: Vec<String> = reader
			.headers()?
			.into_iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		let n_columns = column_names.len();
		let start_position = reader.position().clone();
		let infer_options = &options.infer_options;
		let invalid_values = options.invalid_values;
		let mut n_rows = None;

		#[derive(Clone, Debug)]
		enum ColumnTypeOrInferStats<'a> {
			ColumnType(DataFrameColumnType),
			InferStats(InferStats<'a>),
		}

		// Retrieve any column types present in the options.
		let mut column_types: Vec<ColumnTypeOrInferStats> =
			if let Some(column_types) = options.column_types.as_ref() {
				column_names
					.iter()
					.map(|column_name| {
						column_types
							.get(column_name)
							.map(|column_type| ColumnTypeOrInferStats::ColumnType(column_type.clone()))
							.unwrap_or_else(|| {
								ColumnTypeOrInferStats::InferStats(InferStats::new(
									infer_options,
									invalid_values,
								))
							})
					})
					.collect()
			} else {
				vec![
					ColumnTypeOrInferStats::InferStats(InferStats::new(
						infer_options,
						invalid_values
					));
					n_columns
				]
			};

		// Passing over the csv to infer column types is only necessary if one or more columns did not have its type specified.
		let needs_infer = column_types
			.iter()
			.any(|column_type| matches!(column_type, ColumnTypeOrInferStats::InferStats(_)));

		let column_types: Vec<DataFrameColumnType> = if needs_infer {
			let mut infer_stats: Vec<(usize, &mut InferStats)> = column_types
				.iter_mut()
				.enumerate()
				.filter_map(|(index, column_type)| match column_type {
					ColumnTypeOrInferStats::ColumnType(_) => None,
					ColumnTypeOrInferStats::InferStats(infer_stats) => Some((index, infer_stats)),
				})
				.collect();
			let mut record = csv::StringRecord::new();
			let mut n_rows_computed = 0;
			while reader.read_record(&mut record)? {
				n_rows_computed += 1;
				for (index, infer_stats) in infer_stats.iter_mut() {
					let value = record.get(*index).unwrap_or("");
					infer_stats.update(value);
				}
			}
			n_rows = Some(n_rows_computed);
			let column_types = column_types
				.into_iter()
				.map(|column_type| match column_type {
					ColumnTypeOrInferStats::ColumnType(column_type) => column_type,
					ColumnTypeOrInferStats::InferStats(infer_stats) => infer_stats.finalize(),
				})
				.collect();
			// After inference, return back to the beginning of the csv to load the values.
			reader.seek(start_position)?;
			column_types
		} else {
			column_types
				.into_iter()
				.filter_map(|column_type| match column_type {
					ColumnTypeOrInferStats::ColumnType(column_type) => Some(column_type),
					ColumnTypeOrInferStats::InferStats(_) => None,
				})
				.collect()
		};

		let mut dataframe = Self::new(column_names, column_types);
		// If an inference pass was done, reserve storage for the values because we know how many rows are in the csv.
		if let Some(n_rows) = n_rows {
			for column in dataframe.columns.iter_mut() {
				match column {
					DataFrameColumn::Unknown(_) => {}
					DataFrameColumn::Number(column) => column.data.reserve_exact(n_rows),
					DataFrameColumn::Bool(column) => column.data.reserve_exact(n_rows),
					DataFrameColumn::Date(column) => column.data.reserve_exact(n_rows),
					DataFrameColumn::Enum(column) => column.data.reserve_exact(n_rows),
					DataFrameColumn::Text(column) => column.data.reserve_exact(n_rows),
				}
			}
		}
		// Enum cells are looked up by option string, so index the options of every enum column once.
		let enum_option_indexes: Vec<Option<FnvHashMap<String, NonZeroUsize>>> = dataframe
			.columns
			.iter()
			.map(|column| match column {
				DataFrameColumn::Enum(column) => Some(
					column
						.options
						.iter()
						.enumerate()
						.filter_map(|(index, option)| {
							NonZeroUsize::new(index + 1).map(|value| (option.clone(), value))
						})
						.collect(),
				),
				_ => None,
			})
			.collect();
		// Read each csv record and insert the values into the columns of the dataframe.
		let mut record = csv::StringRecord::new();
		while reader.read_record(&mut record)? {
			for ((column, enum_option_indexes), value) in dataframe
				.columns
				.iter_mut()
				.zip(enum_option_indexes.iter())
				.zip(record.iter())
			{
				let is_invalid = invalid_values.contains(&value);
				match column {
					DataFrameColumn::Unknown(column) => {
						column.len += 1;
					}
					DataFrameColumn::Number(column) => {
						let value = match parse_number(value) {
							Some(value) if !is_invalid => value,
							_ => std::f64::NAN,
						};
						column.data.push(value);
					}
					DataFrameColumn::Bool(column) => {
						let value = if is_invalid { None } else { parse_bool(value) };
						column.data.push(value);
					}
					DataFrameColumn::Date(column) => {
						let value = if is_invalid {
							None
						} else {
							parse_date_time(value)
						};
						column.data.push(value);
					}
					DataFrameColumn::Enum(column) => {
						let value = if is_invalid {
							None
						} else {
							enum_option_indexes
								.as_ref()
								.and_then(|indexes| indexes.get(value).cloned())
						};
						column.data.push(value);
					}
					DataFrameColumn::Text(column) => {
						let value = if is_invalid {
							None
						} else {
							Some(value.to_owned())
						};
						column.data.push(value);
					}
				}
			}
		}
		Ok(dataframe)
	}
}

fn parse_number(value: &str) -> Option<f64> {
	lexical::parse::<f64, &str>(value)
		.ok()
		.filter(|value| value.is_finite())
}

fn parse_bool(value: &str) -> Option<bool> {
	match value {
		"true" | "True" | "TRUE" => Some(true),
		"false" | "False" | "FALSE" => Some(false),
		_ => None,
	}
}

/// Parse a date or a date with a time of day. Plain dates are placed at midnight.
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
	DATE_TIME_FORMATS
		.iter()
		.find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
		.or_else(|| {
			DATE_FORMATS
				.iter()
				.find_map(|format| NaiveDate::parse_from_str(value, format).ok())
				.map(|date| date.and_hms(0, 0, 0))
		})
}

#[derive(Clone, Debug)]
pub struct InferStats<'a> {
	infer_options: &'a InferOptions,
	invalid_values: &'a [&'a str],
	column_type: InferColumnType,
	unique_values: Option<BTreeSet<String>>,
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum InferColumnType {
	Unknown,
	Number,
	Bool,
	Date,
	Enum,
	Text,
}

impl<'a> InferStats<'a> {
	pub fn new(infer_options: &'a InferOptions, invalid_values: &'a [&'a str]) -> Self {
		Self {
			infer_options,
			invalid_values,
			column_type: InferColumnType::Unknown,
			unique_values: Some(BTreeSet::new()),
		}
	}

	pub fn update(&mut self, value: &str) {
		if self.invalid_values.contains(&value) {
			return;
		}
		if let Some(unique_values) = self.unique_values.as_mut() {
			if !unique_values.contains(value) {
				unique_values.insert(value.to_owned());
			}
			if unique_values.len() > self.infer_options.enum_max_unique_values {
				self.unique_values = None;
			}
		}
		self.column_type = match self.column_type {
			InferColumnType::Unknown => {
				if parse_number(value).is_some() {
					InferColumnType::Number
				} else if parse_bool(value).is_some() {
					InferColumnType::Bool
				} else if parse_date_time(value).is_some() {
					InferColumnType::Date
				} else {
					self.enum_or_text()
				}
			}
			InferColumnType::Number if parse_number(value).is_none() => self.enum_or_text(),
			InferColumnType::Bool if parse_bool(value).is_none() => self.enum_or_text(),
			InferColumnType::Date if parse_date_time(value).is_none() => self.enum_or_text(),
			InferColumnType::Enum => self.enum_or_text(),
			column_type => column_type,
		};
	}

	fn enum_or_text(&self) -> InferColumnType {
		if self.unique_values.is_some() {
			InferColumnType::Enum
		} else {
			InferColumnType::Text
		}
	}

	pub fn finalize(self) -> DataFrameColumnType {
		match self.column_type {
			InferColumnType::Unknown => DataFrameColumnType::Unknown,
			InferColumnType::Number => DataFrameColumnType::Number,
			InferColumnType::Bool => DataFrameColumnType::Bool,
			InferColumnType::Date => DataFrameColumnType::Date,
			InferColumnType::Enum => match self.unique_values {
				Some(unique_values) => DataFrameColumnType::Enum {
					options: unique_values.into_iter().collect(),
				},
				None => DataFrameColumnType::Text,
			},
			InferColumnType::Text => DataFrameColumnType::Text,
		}
	}
}

#[test]
fn test_infer() {
	let csv = r#"number,enum,text
1,test,hello
2,test,world
"#;
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			column_types: None,
			infer_options: InferOptions {
				enum_max_unique_values: 1,
			},
			..Default::default()
		},
	)
	.unwrap();
	insta::assert_debug_snapshot!(df, @r###"
 DataFrame {
     columns: [
         Number(
             NumberDataFrameColumn {
                 name: "number",
                 data: [
                     1.0,
                     2.0,
                 ],
             },
         ),
         Enum(
             EnumDataFrameColumn {
                 name: "enum",
                 options: [
                     "test",
                 ],
                 data: [
                     Some(
                         1,
                     ),
                     Some(
                         1,
                     ),
                 ],
             },
         ),
         Text(
             TextDataFrameColumn {
                 name: "text",
                 data: [
                     Some(
                         "hello",
                     ),
                     Some(
                         "world",
                     ),
                 ],
             },
         ),
     ],
 }
 "###);
}

#[test]
fn test_infer_dates_bools_and_missing() {
	let csv = "when,flag,amount\n2024-01-01,true,1.5\n2024-01-03 10:00:00,false,\nNA,TRUE,x\n";
	let df = DataFrame::from_bytes(csv.as_bytes(), FromCsvOptions::default()).unwrap();
	assert_eq!(df.nrows(), 3);
	match &df.columns[0] {
		DataFrameColumn::Date(column) => {
			assert_eq!(
				column.data,
				vec![
					Some(NaiveDate::from_ymd(2024, 1, 1).and_hms(0, 0, 0)),
					Some(NaiveDate::from_ymd(2024, 1, 3).and_hms(10, 0, 0)),
					None,
				]
			);
		}
		column => panic!("expected a date column, got {:?}", column),
	}
	match &df.columns[1] {
		DataFrameColumn::Bool(column) => {
			assert_eq!(column.data, vec![Some(true), Some(false), Some(true)]);
		}
		column => panic!("expected a bool column, got {:?}", column),
	}
	// A single unparseable value demotes a number column to an enum.
	match &df.columns[2] {
		DataFrameColumn::Enum(column) => {
			assert_eq!(column.options, vec!["1.5".to_owned(), "x".to_owned()]);
			assert_eq!(
				column.data,
				vec![NonZeroUsize::new(1), None, NonZeroUsize::new(2)]
			);
		}
		column => panic!("expected an enum column, got {:?}", column),
	}
}

#[test]
fn test_column_types() {
	let csv = r#"number,text,enum
1,test,hello
2,test,world
"#;
	let mut column_types = BTreeMap::new();
	column_types.insert("text".to_owned(), DataFrameColumnType::Text);
	column_types.insert(
		"enum".to_owned(),
		DataFrameColumnType::Enum {
			options: vec!["hello".to_owned(), "world".to_owned()],
		},
	);
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			column_types: Some(column_types),
			infer_options: InferOptions {
				enum_max_unique_values: 2,
			},
			..Default::default()
		},
	)
	.unwrap();
	assert_eq!(
		df.columns[1],
		DataFrameColumn::Text(TextDataFrameColumn {
			name: "text".to_owned(),
			data: vec![Some("test".to_owned()), Some("test".to_owned())],
		})
	);
	assert_eq!(
		df.columns[2],
		DataFrameColumn::Enum(EnumDataFrameColumn {
			name: "enum".to_owned(),
			options: vec!["hello".to_owned(), "world".to_owned()],
			data: vec![NonZeroUsize::new(1), NonZeroUsize::new(2)],
		})
	);
}

#[test]
fn test_malformed_csv() {
	let csv = "a,b\n1,2\n3\n";
	assert!(DataFrame::from_bytes(csv.as_bytes(), FromCsvOptions::default()).is_err());
}
