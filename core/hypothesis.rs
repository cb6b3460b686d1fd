/*!
This module selects and validates the inputs of the regression and t-test and hands them to the statistics in `sheetlens_metrics`.
*/

use crate::error::{ComputationError, Error, UserInputError};
use ndarray::prelude::*;
use sheetlens_dataframe::prelude::*;
use sheetlens_metrics::{
	LinearRegression, LinearRegressionOutput, Metric, StatisticsError, WelchTTest,
	WelchTTestInput, WelchTTestOutput,
};
use std::collections::BTreeMap;

/// The two samples of a t-test, either two number columns or one number column split by a column with exactly two distinct values.
#[derive(Clone, Debug, PartialEq)]
pub enum TTestSelection {
	Columns {
		a: String,
		b: String,
	},
	Groups {
		value_column: String,
		group_column: String,
	},
}

#[derive(Clone, Debug, PartialEq)]
pub struct TTestOutput {
	/// The names of the two samples, the column names or the group values.
	pub labels: (String, String),
	pub n_a: usize,
	pub n_b: usize,
	pub output: WelchTTestOutput,
}

fn number_column<'a>(
	dataframe: &DataFrameView<'a>,
	name: &str,
) -> Result<NumberDataFrameColumnView<'a>, UserInputError> {
	let column = dataframe
		.column(name)
		.ok_or_else(|| UserInputError::UnknownColumn(name.to_owned()))?;
	column.as_number().ok_or_else(|| UserInputError::NotNumeric {
		column: name.to_owned(),
	})
}

fn statistics_error(operation: &'static str) -> impl Fn(StatisticsError) -> Error {
	move |source| ComputationError::Statistics { operation, source }.into()
}

/// Fit `y = slope * x + intercept`. Rows missing either value are dropped.
pub fn regress(dataframe: &DataFrameView, x: &str, y: &str) -> Result<LinearRegressionOutput, Error> {
	let x_column = number_column(dataframe, x)?;
	let y_column = number_column(dataframe, y)?;
	let pairs: (Vec<f64>, Vec<f64>) = x_column
		.data
		.iter()
		.zip(y_column.data.iter())
		.filter(|(x, y)| x.is_finite() && y.is_finite())
		.map(|(x, y)| (*x, *y))
		.unzip();
	let (x_values, y_values) = pairs;
	if x_values.len() < 2 {
		return Err(UserInputError::TooFewObservations {
			column: format!("{} and {}", x, y),
			needed: 2,
			found: x_values.len(),
		}
		.into());
	}
	let output = LinearRegression::compute(&x_values, &y_values).map_err(statistics_error("regression"))?;
	log::info!(
		"regressed {} on {} over {} rows, r2 = {}",
		y,
		x,
		output.n,
		output.r2
	);
	Ok(output)
}

/// Run Welch's t-test on two samples. Missing values are dropped and each sample needs at least two values.
pub fn t_test(dataframe: &DataFrameView, selection: &TTestSelection) -> Result<TTestOutput, Error> {
	let (labels, a, b) = match selection {
		TTestSelection::Columns { a, b } => {
			let a_values = finite_values(number_column(dataframe, a)?.data.iter().cloned());
			let b_values = finite_values(number_column(dataframe, b)?.data.iter().cloned());
			((a.clone(), b.clone()), a_values, b_values)
		}
		TTestSelection::Groups {
			value_column,
			group_column,
		} => {
			let values = number_column(dataframe, value_column)?;
			let groups = dataframe
				.column(group_column)
				.ok_or_else(|| UserInputError::UnknownColumn(group_column.to_owned()))?;
			let mut samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();
			for (index, value) in values.data.iter().enumerate() {
				if let Some(group) = groups.display_value(index) {
					let sample = samples.entry(group).or_insert_with(Vec::new);
					if value.is_finite() {
						sample.push(*value);
					}
				}
			}
			let found = samples.len();
			let mut samples = samples.into_iter();
			match (samples.next(), samples.next(), samples.next()) {
				(Some((label_a, a)), Some((label_b, b)), None) => ((label_a, label_b), a, b),
				_ => {
					return Err(UserInputError::GroupCount {
						column: group_column.to_owned(),
						found,
					}
					.into())
				}
			}
		}
	};
	for (label, sample) in [(&labels.0, &a), (&labels.1, &b)].iter() {
		if sample.len() < 2 {
			return Err(UserInputError::TooFewObservations {
				column: label.to_string(),
				needed: 2,
				found: sample.len(),
			}
			.into());
		}
	}
	let output = WelchTTest::compute(WelchTTestInput {
		a: ArrayView1::from(a.as_slice()),
		b: ArrayView1::from(b.as_slice()),
	})
	.map_err(statistics_error("t-test"))?;
	log::info!(
		"t-test of {} against {}: t = {}, p = {}",
		labels.0,
		labels.1,
		output.t,
		output.p_value
	);
	Ok(TTestOutput {
		n_a: a.len(),
		n_b: b.len(),
		labels,
		output,
	})
}

fn finite_values(values: impl Iterator<Item = f64>) -> Vec<f64> {
	values.filter(|value| value.is_finite()).collect()
}

#[cfg(test)]
mod test {
	use super::*;
	use rand::{Rng, SeedableRng};
	use rand_xoshiro::Xoshiro256Plus;

	fn number(name: &str, data: Vec<f64>) -> DataFrameColumn {
		DataFrameColumn::Number(NumberDataFrameColumn {
			name: name.to_owned(),
			data,
		})
	}

	#[test]
	fn test_regress_perfect_correlation() {
		let dataframe = DataFrame {
			columns: vec![
				number("x", vec![1.0, 2.0, f64::NAN, 3.0, 4.0]),
				number("y", vec![2.0, 4.0, 5.0, 6.0, 8.0]),
			],
		};
		let output = regress(&dataframe.view(), "x", "y").unwrap();
		assert_eq!(output.n, 4);
		assert!((output.r2 - 1.0).abs() < 1e-9);
		assert!((output.slope - 2.0).abs() < 1e-9);
		assert!(output.intercept.abs() < 1e-9);
	}

	#[test]
	fn test_regress_invalid_inputs() {
		let dataframe = DataFrame::from_bytes(b"x,y,label\n1,2,a\n2,3,b\n3,3,c\n", Default::default()).unwrap();
		let view = dataframe.view();
		assert!(matches!(
			regress(&view, "x", "label"),
			Err(Error::UserInput(UserInputError::NotNumeric { .. }))
		));
		assert!(matches!(
			regress(&view, "z", "y"),
			Err(Error::UserInput(UserInputError::UnknownColumn(_)))
		));
		let dataframe = DataFrame {
			columns: vec![number("x", vec![1.0, 1.0, 1.0]), number("y", vec![1.0, 2.0, 3.0])],
		};
		assert!(matches!(
			regress(&dataframe.view(), "x", "y"),
			Err(Error::Computation(ComputationError::Statistics {
				source: StatisticsError::ZeroVariance(_),
				..
			}))
		));
		let dataframe = DataFrame {
			columns: vec![number("x", vec![1.0, f64::NAN]), number("y", vec![f64::NAN, 2.0])],
		};
		assert!(matches!(
			regress(&dataframe.view(), "x", "y"),
			Err(Error::UserInput(UserInputError::TooFewObservations { found: 0, .. }))
		));
	}

	#[test]
	fn test_t_test_same_distribution() {
		let mut rng = Xoshiro256Plus::seed_from_u64(0);
		// Every value is an independent draw, alternating between the groups.
		let values: Vec<f64> = (0..400).map(|_| rng.gen::<f64>() * 100.0).collect();
		let groups: Vec<String> = (0..400)
			.map(|index| if index % 2 == 0 { "control" } else { "treatment" }.to_owned())
			.collect();
		let dataframe = DataFrame {
			columns: vec![
				number("value", values),
				DataFrameColumn::Text(TextDataFrameColumn {
					name: "group".to_owned(),
					data: groups.into_iter().map(Some).collect(),
				}),
			],
		};
		let selection = TTestSelection::Groups {
			value_column: "value".to_owned(),
			group_column: "group".to_owned(),
		};
		let output = t_test(&dataframe.view(), &selection).unwrap();
		assert_eq!(output.labels, ("control".to_owned(), "treatment".to_owned()));
		assert_eq!((output.n_a, output.n_b), (200, 200));
		assert!(output.output.p_value >= 0.05);
	}

	#[test]
	fn test_t_test_columns() {
		let dataframe = DataFrame {
			columns: vec![
				number("a", vec![1.0, 2.0, 3.0, 4.0, 5.0, f64::NAN]),
				number("b", vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0]),
			],
		};
		let selection = TTestSelection::Columns {
			a: "a".to_owned(),
			b: "b".to_owned(),
		};
		let output = t_test(&dataframe.view(), &selection).unwrap();
		assert_eq!((output.n_a, output.n_b), (5, 6));
		assert!(output.output.t < 0.0);
	}

	#[test]
	fn test_t_test_group_count() {
		let dataframe = DataFrame::from_bytes(
			b"value,group\n1,a\n2,b\n3,c\n4,a\n5,b\n6,c\n",
			Default::default(),
		)
		.unwrap();
		let selection = TTestSelection::Groups {
			value_column: "value".to_owned(),
			group_column: "group".to_owned(),
		};
		assert!(matches!(
			t_test(&dataframe.view(), &selection),
			Err(Error::UserInput(UserInputError::GroupCount { found: 3, .. }))
		));
		let dataframe = DataFrame::from_bytes(b"value,group\n1,a\n2,b\n3,b\n", Default::default()).unwrap();
		assert!(matches!(
			t_test(&dataframe.view(), &selection),
			Err(Error::UserInput(UserInputError::TooFewObservations { found: 1, .. }))
		));
	}
}
