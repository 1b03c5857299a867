use thiserror::Error;

/// Errors raised while computing statistics for, fitting or encoding columns.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
	#[error("dataset has no feature columns")]
	NoColumns,
	#[error("column \"{column}\" has insufficient data: {reason}")]
	InsufficientData { column: String, reason: String },
	#[error("invalid value \"{value}\" in column \"{column}\"")]
	InvalidValue { column: String, value: String },
	#[error("unseen value \"{value}\" in column \"{column}\"")]
	UnseenSymbol { column: String, value: String },
	#[error("row {row} has {actual} values, expected {expected}")]
	ColumnCountMismatch {
		row: usize,
		expected: usize,
		actual: usize,
	},
}
