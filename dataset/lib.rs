/*!
This crate provides the tabular input of the encoding engine: raw [`Value`](enum.Value.html)s arranged in rows, and the [`Dataset`](struct.Dataset.html), which pairs those rows with the numeric targets to learn.

Unlike a typed dataframe, a dataset does not commit to a type per column. A column may hold numbers, text and missing values side by side, and deciding what a column is happens downstream, from its statistics.
*/

use std::borrow::Cow;
use thiserror::Error;

pub mod load;

pub use self::load::*;

/// A single raw cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// An empty cell, or one of the invalid value markers such as `"n/a"`.
	Missing,
	Number(f64),
	Text(String),
}

/// A row is indexed by column. Every row in a dataset has the same width.
pub type Row = Vec<Value>;

impl Value {
	pub fn is_missing(&self) -> bool {
		matches!(self, Value::Missing)
	}

	/// Return the numeric reading of this value. Text that parses as a finite number has a numeric reading too.
	pub fn as_number(&self) -> Option<f64> {
		match self {
			Value::Missing => None,
			Value::Number(value) if value.is_finite() => Some(*value),
			Value::Number(_) => None,
			Value::Text(value) => parse_finite(value.as_bytes()),
		}
	}

	/// Return the key this value is counted and looked up under. Missing values are counted as the number zero.
	pub fn key(&self) -> Cow<str> {
		match self {
			Value::Missing => Cow::Borrowed("0"),
			Value::Number(value) => Cow::Owned(value.to_string()),
			Value::Text(value) => Cow::Borrowed(value.as_str()),
		}
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Value {
		Value::Number(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Value {
		Value::Text(value.to_owned())
	}
}

impl std::fmt::Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Missing => write!(f, "<missing>"),
			Value::Number(value) => write!(f, "{}", value),
			Value::Text(value) => write!(f, "{}", value),
		}
	}
}

pub(crate) fn parse_finite(bytes: &[u8]) -> Option<f64> {
	lexical::parse::<f64, _>(bytes)
		.ok()
		.filter(|value| value.is_finite())
}

#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
	#[error("dataset has {samples} samples but {targets} targets")]
	Misaligned { samples: usize, targets: usize },
	#[error("row {row} has {actual} values, expected {expected}")]
	RaggedRow {
		row: usize,
		expected: usize,
		actual: usize,
	},
}

/// A `Dataset` holds aligned `samples` and `targets`: the target at index `i` belongs to the sample at index `i`. It cannot be changed after it is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
	column_names: Vec<String>,
	samples: Vec<Row>,
	targets: Vec<f64>,
}

impl Dataset {
	pub fn new(
		column_names: Vec<String>,
		samples: Vec<Row>,
		targets: Vec<f64>,
	) -> Result<Dataset, DatasetError> {
		if samples.len() != targets.len() {
			return Err(DatasetError::Misaligned {
				samples: samples.len(),
				targets: targets.len(),
			});
		}
		let expected = column_names.len();
		if let Some((row, sample)) = samples
			.iter()
			.enumerate()
			.find(|(_, sample)| sample.len() != expected)
		{
			return Err(DatasetError::RaggedRow {
				row,
				expected,
				actual: sample.len(),
			});
		}
		Ok(Dataset {
			column_names,
			samples,
			targets,
		})
	}

	/// Create a dataset with generated column names `"0"`, `"1"`, and so on, taking the width from the first sample.
	pub fn from_samples(samples: Vec<Row>, targets: Vec<f64>) -> Result<Dataset, DatasetError> {
		let n_columns = samples.first().map(|sample| sample.len()).unwrap_or(0);
		let column_names = (0..n_columns).map(|index| index.to_string()).collect();
		Dataset::new(column_names, samples, targets)
	}

	pub fn column_names(&self) -> &[String] {
		&self.column_names
	}

	pub fn samples(&self) -> &[Row] {
		&self.samples
	}

	pub fn targets(&self) -> &[f64] {
		&self.targets
	}

	pub fn n_rows(&self) -> usize {
		self.samples.len()
	}

	pub fn n_columns(&self) -> usize {
		self.column_names.len()
	}

	/// Return the values of the column at `index`, in row order.
	pub fn column(&self, index: usize) -> Vec<&Value> {
		self.samples.iter().map(|sample| &sample[index]).collect()
	}
}

#[test]
fn test_value_readings() {
	assert_eq!(Value::Number(5.0).key(), "5");
	assert_eq!(Value::Number(2.5).key(), "2.5");
	assert_eq!(Value::Missing.key(), "0");
	assert_eq!(Value::from("red").key(), "red");
	assert_eq!(Value::from("12.5").as_number(), Some(12.5));
	assert_eq!(Value::from("red").as_number(), None);
	assert_eq!(Value::Missing.as_number(), None);
	assert_eq!(Value::Number(f64::NAN).as_number(), None);
}

#[test]
fn test_dataset_invariants() {
	let misaligned = Dataset::from_samples(vec![vec![Value::Number(1.0)]], vec![1.0, 2.0]);
	assert_eq!(
		misaligned,
		Err(DatasetError::Misaligned {
			samples: 1,
			targets: 2
		})
	);
	let ragged = Dataset::from_samples(
		vec![
			vec![Value::Number(1.0), Value::from("a")],
			vec![Value::Number(2.0)],
		],
		vec![1.0, 2.0],
	);
	assert_eq!(
		ragged,
		Err(DatasetError::RaggedRow {
			row: 1,
			expected: 2,
			actual: 1
		})
	);
	let dataset = Dataset::from_samples(
		vec![
			vec![Value::Number(1.0), Value::from("a")],
			vec![Value::Missing, Value::from("b")],
		],
		vec![1.0, 2.0],
	)
	.unwrap();
	assert_eq!(dataset.column_names(), &["0".to_owned(), "1".to_owned()]);
	assert_eq!(
		dataset.column(1),
		vec![&Value::from("a"), &Value::from("b")]
	);
}
