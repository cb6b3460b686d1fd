use crate::{
	error::{Error, UserInputError},
	pivot::PivotResult,
};
use std::io::Write;

const BYTE_ORDER_MARK: &[u8] = b"\xEF\xBB\xBF";

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ExportOptions {
	/// Spreadsheet programs need a byte order mark to read the file as UTF-8.
	pub byte_order_mark: bool,
	/// An ASCII character.
	pub delimiter: char,
}

impl Default for ExportOptions {
	fn default() -> Self {
		Self {
			byte_order_mark: true,
			delimiter: ',',
		}
	}
}

/// Write a pivot table as delimited text: a header row followed by one row per row key combination. The delimiter must be a single ASCII character.
pub fn write_csv<W: Write>(pivot: &PivotResult, mut writer: W, options: &ExportOptions) -> Result<(), Error> {
	if !options.delimiter.is_ascii() {
		return Err(UserInputError::InvalidDelimiter(options.delimiter).into());
	}
	if options.byte_order_mark {
		writer.write_all(BYTE_ORDER_MARK)?;
	}
	let mut writer = csv::WriterBuilder::new()
		.delimiter(options.delimiter as u8)
		.from_writer(writer);
	let (header, cells) = pivot.to_table();
	writer.write_record(&header)?;
	for row in cells.genrows() {
		writer.write_record(row.iter())?;
	}
	writer.flush()?;
	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::pivot::{build_pivot, Aggregator, PivotSpec};
	use sheetlens_dataframe::prelude::*;

	fn pivot(column_keys: Vec<String>) -> PivotResult {
		let dataframe = DataFrame::from_bytes(
			b"region,bucket,amount\nA,1,10\nA,2,20.5\n\"B, north\",1,5\n",
			Default::default(),
		)
		.unwrap();
		let spec = PivotSpec {
			row_keys: vec!["region".to_owned()],
			column_keys,
			value_column: Some("amount".to_owned()),
			aggregator: Aggregator::Sum,
		};
		build_pivot(&dataframe.view(), &spec).unwrap()
	}

	fn to_csv_bytes(pivot: &PivotResult, options: &ExportOptions) -> Result<Vec<u8>, Error> {
		let mut bytes = Vec::new();
		write_csv(pivot, &mut bytes, options)?;
		Ok(bytes)
	}

	#[test]
	fn test_write_csv() {
		let bytes = to_csv_bytes(&pivot(vec!["bucket".to_owned()]), &ExportOptions::default()).unwrap();
		assert!(bytes.starts_with(BYTE_ORDER_MARK));
		let text = std::str::from_utf8(&bytes[BYTE_ORDER_MARK.len()..]).unwrap();
		assert_eq!(text, "region,1,2\nA,10,20.5\n\"B, north\",5,0\n");
	}

	#[test]
	fn test_write_csv_without_byte_order_mark() {
		let options = ExportOptions {
			byte_order_mark: false,
			delimiter: ';',
		};
		let bytes = to_csv_bytes(&pivot(Vec::new()), &options).unwrap();
		let text = String::from_utf8(bytes).unwrap();
		assert_eq!(text, "region;amount\nA;30.5\nB, north;5\n");
	}

	#[test]
	fn test_non_ascii_delimiter() {
		let options = ExportOptions {
			byte_order_mark: true,
			delimiter: '；',
		};
		let mut bytes = Vec::new();
		let error = write_csv(&pivot(Vec::new()), &mut bytes, &options).unwrap_err();
		assert!(matches!(
			error,
			Error::UserInput(UserInputError::InvalidDelimiter('；'))
		));
		// Nothing is written, not even the byte order mark.
		assert!(bytes.is_empty());
	}
}
