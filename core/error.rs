use crate::pivot::Aggregator;
use sheetlens_metrics::StatisticsError;
use thiserror::Error;

/// Every way an engine operation can fail.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	UserInput(#[from] UserInputError),
	#[error(transparent)]
	Computation(#[from] ComputationError),
	#[error("failed to write csv")]
	Csv(#[from] csv::Error),
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// The selection the user made cannot be acted on.
#[derive(Debug, Error, PartialEq)]
pub enum UserInputError {
	#[error("select at least one row key")]
	NoRowKeys,
	#[error("select a value column")]
	NoValueColumn,
	#[error("there is no column named \"{0}\"")]
	UnknownColumn(String),
	#[error("column \"{column}\" is not numeric")]
	NotNumeric { column: String },
	#[error("column \"{column}\" must contain exactly two groups but contains {found}")]
	GroupCount { column: String, found: usize },
	#[error("column \"{column}\" needs at least {needed} values but has {found}")]
	TooFewObservations {
		column: String,
		needed: usize,
		found: usize,
	},
	#[error("unknown aggregator \"{0}\", expected one of sum, mean, count, median, min, max")]
	UnknownAggregator(String),
	#[error("no pivot table has been built yet")]
	NoPivot,
	#[error("the delimiter '{0}' is not an ASCII character")]
	InvalidDelimiter(char),
}

/// The selection was valid but the data does not support the computation.
#[derive(Debug, Error, PartialEq)]
pub enum ComputationError {
	#[error("cannot compute the {aggregator} of column \"{column}\" because it is not numeric, use count for text columns")]
	AggregationTypeMismatch {
		column: String,
		aggregator: Aggregator,
	},
	#[error("failed to compute the {operation}")]
	Statistics {
		operation: &'static str,
		#[source]
		source: StatisticsError,
	},
}
