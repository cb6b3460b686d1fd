use crate::{
	config::Config,
	error::{Error, UserInputError},
	export::write_csv,
	hypothesis::{self, TTestOutput, TTestSelection},
	pivot::{build_pivot, PivotResult, PivotSpec},
	summary::{summarize, Summary},
};
use anyhow::{Context, Result};
use ndarray::prelude::*;
use sheetlens_dataframe::prelude::*;
use sheetlens_metrics::LinearRegressionOutput;
use std::{io::Write, path::Path};

/// The number of rows shown after a dataset is loaded.
pub const PREVIEW_ROWS: usize = 10;

/// A loaded dataset with its configuration and the last pivot table built from it.
pub struct Session {
	dataframe: DataFrame,
	config: Config,
	last_pivot: Option<PivotResult>,
}

impl Session {
	pub fn new(dataframe: DataFrame, config: Config) -> Self {
		Self {
			dataframe,
			config,
			last_pivot: None,
		}
	}

	pub fn load(path: &Path, config: Config) -> Result<Self> {
		let invalid_values = config.invalid_values();
		let dataframe = DataFrame::from_path(path, csv_options(&config, invalid_values.as_deref()))
			.with_context(|| format!("failed to load {}", path.display()))?;
		log::info!(
			"loaded {} rows and {} columns from {}",
			dataframe.nrows(),
			dataframe.ncols(),
			path.display()
		);
		Ok(Self::new(dataframe, config))
	}

	/// Load an uploaded file from its bytes.
	pub fn from_bytes(bytes: &[u8], config: Config) -> Result<Self> {
		let invalid_values = config.invalid_values();
		let dataframe = DataFrame::from_bytes(bytes, csv_options(&config, invalid_values.as_deref()))
			.context("failed to load the uploaded file")?;
		log::info!(
			"loaded {} rows and {} columns",
			dataframe.nrows(),
			dataframe.ncols()
		);
		Ok(Self::new(dataframe, config))
	}

	/// The header and the first `n` rows as text. Missing cells are empty.
	pub fn preview(&self, n: usize) -> (Vec<String>, Array2<String>) {
		let view = self.dataframe.view();
		let head = view.head(n);
		let header = self
			.dataframe
			.column_names()
			.into_iter()
			.map(|name| name.to_owned())
			.collect();
		let mut cells = Array::from_elem((head.nrows(), head.ncols()), String::new());
		for (mut cells_column, column) in cells.axis_iter_mut(Axis(1)).zip(head.columns.iter()) {
			for (index, cell) in cells_column.iter_mut().enumerate() {
				*cell = column.display_value(index).unwrap_or_default();
			}
		}
		(header, cells)
	}

	pub fn summarize(&self) -> Summary {
		summarize(&self.dataframe.view(), &self.config.summary_settings())
	}

	/// Build a pivot table and keep it as the last result. A failed build discards the previous result.
	pub fn pivot(&mut self, spec: &PivotSpec) -> Result<&PivotResult, Error> {
		self.last_pivot = None;
		let pivot = build_pivot(&self.dataframe.view(), spec)?;
		Ok(&*self.last_pivot.get_or_insert(pivot))
	}

	pub fn last_pivot(&self) -> Option<&PivotResult> {
		self.last_pivot.as_ref()
	}

	pub fn export_last_pivot<W: Write>(&self, writer: W) -> Result<(), Error> {
		let pivot = self.last_pivot.as_ref().ok_or(UserInputError::NoPivot)?;
		write_csv(pivot, writer, &self.config.export_options())
	}

	pub fn regress(&self, x: &str, y: &str) -> Result<LinearRegressionOutput, Error> {
		hypothesis::regress(&self.dataframe.view(), x, y)
	}

	pub fn t_test(&self, selection: &TTestSelection) -> Result<TTestOutput, Error> {
		hypothesis::t_test(&self.dataframe.view(), selection)
	}
}

fn csv_options<'a>(config: &Config, invalid_values: Option<&'a [&'a str]>) -> FromCsvOptions<'a> {
	let mut options = FromCsvOptions {
		column_types: config.column_types(),
		infer_options: config.infer_options(),
		..Default::default()
	};
	if let Some(invalid_values) = invalid_values {
		options.invalid_values = invalid_values;
	}
	options
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::pivot::Aggregator;

	const CSV: &[u8] = b"\xEF\xBB\xBFregion,amount,when\nA,10,2024-01-01\nA,20,-\nB,-,2024-01-02\n";

	fn session() -> Session {
		let config = Config::from_yaml("invalid_values: [\"\", \"-\"]\nexport:\n  byte_order_mark: false\n").unwrap();
		Session::from_bytes(CSV, config).unwrap()
	}

	#[test]
	fn test_preview() {
		let session = session();
		let (header, cells) = session.preview(2);
		assert_eq!(header, vec!["region", "amount", "when"]);
		let rows: Vec<Vec<String>> = cells.genrows().into_iter().map(|row| row.to_vec()).collect();
		assert_eq!(rows, vec![vec!["A", "10", "2024-01-01"], vec!["A", "20", ""]]);
		assert_eq!(session.preview(PREVIEW_ROWS).1.nrows(), 3);
	}

	#[test]
	fn test_pivot_and_export() {
		let mut session = session();
		let mut output = Vec::new();
		assert!(matches!(
			session.export_last_pivot(&mut output),
			Err(Error::UserInput(UserInputError::NoPivot))
		));
		let spec = PivotSpec {
			row_keys: vec!["region".to_owned()],
			column_keys: Vec::new(),
			value_column: Some("amount".to_owned()),
			aggregator: Aggregator::Sum,
		};
		session.pivot(&spec).unwrap();
		session.export_last_pivot(&mut output).unwrap();
		assert_eq!(String::from_utf8(output).unwrap(), "region,amount\nA,30\nB,0\n");
		let invalid = PivotSpec {
			value_column: None,
			..spec
		};
		assert!(session.pivot(&invalid).is_err());
		assert!(session.last_pivot().is_none());
	}

	#[test]
	fn test_summarize() {
		let session = session();
		let summary = session.summarize();
		assert_eq!(summary.columns.len(), 3);
		// "region" has two values, "amount" is numeric, "when" has two dates.
		assert!(summary.exclusions.is_empty());
	}
}
