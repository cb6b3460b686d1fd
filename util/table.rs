use ndarray::prelude::*;

/// A plain text table with a header row, used to print summaries and pivot results to the terminal.
pub struct Table<'a> {
	padding: usize,
	header: &'a [String],
	values: &'a Array2<String>,
}

impl<'a> Table<'a> {
	pub fn new(header: &'a [String], values: &'a Array2<String>) -> Self {
		Self {
			padding: 1,
			header,
			values,
		}
	}
}

impl<'a> std::fmt::Display for Table<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let n_columns = self.header.len();
		let mut column_widths: Vec<usize> = vec![0; n_columns];
		// Widen each column to fit its header.
		for (column_width, header) in column_widths.iter_mut().zip(self.header) {
			*column_width = display_width(header);
		}
		// Widen each column to fit its values.
		for (column_width, column) in column_widths
			.iter_mut()
			.zip(self.values.axis_iter(Axis(1)))
		{
			for value in column.iter() {
				*column_width = usize::max(*column_width, display_width(value));
			}
		}
		let line = Line {
			column_widths: &column_widths,
			padding: self.padding,
		};
		let header: Vec<&str> = self.header.iter().map(|value| value.as_str()).collect();
		let row = Row {
			column_widths: &column_widths,
			padding: self.padding,
			values: &header,
		};
		writeln!(f, "{}", row)?;
		writeln!(f, "{}", line)?;
		for values in self.values.genrows() {
			let values: Vec<&str> = values.iter().map(|value| value.as_str()).collect();
			let row = Row {
				column_widths: &column_widths,
				padding: self.padding,
				values: &values,
			};
			writeln!(f, "{}", row)?;
		}
		Ok(())
	}
}

fn display_width(value: &str) -> usize {
	value.chars().count()
}

struct Line<'a> {
	column_widths: &'a [usize],
	padding: usize,
}

impl<'a> std::fmt::Display for Line<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "|")?;
		for column_width in self.column_widths.iter() {
			for _ in 0..column_width + 2 * self.padding {
				write!(f, "-")?;
			}
			write!(f, "|")?;
		}
		Ok(())
	}
}

struct Row<'a> {
	column_widths: &'a [usize],
	padding: usize,
	values: &'a [&'a str],
}

impl<'a> std::fmt::Display for Row<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "|")?;
		for (column_width, value) in self.column_widths.iter().zip(self.values) {
			for _ in 0..self.padding {
				write!(f, " ")?;
			}
			write!(f, "{}", value)?;
			for _ in 0..column_width + self.padding - display_width(value) {
				write!(f, " ")?;
			}
			write!(f, "|")?;
		}
		Ok(())
	}
}

#[test]
fn test_table() {
	let header = vec!["name".to_owned(), "count".to_owned()];
	let values = Array2::from_shape_vec(
		(2, 2),
		vec![
			"a".to_owned(),
			"10".to_owned(),
			"bcd".to_owned(),
			"5".to_owned(),
		],
	)
	.unwrap();
	let table = Table::new(&header, &values).to_string();
	assert_eq!(
		table,
		"| name | count |\n|------|-------|\n| a    | 10    |\n| bcd  | 5     |\n"
	);
}
