/*!
This module computes the statistics that drive classification: how often each value occurs, how unique the column is, whether every value is a number, and how the column correlates with the target.
*/

use crate::{policy::EncodingPolicy, Error};
use pricecast_dataset::Value;
use std::collections::BTreeMap;

/// This struct contains the statistics for a single column, computed once per training run.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStatistics {
	/// This is the name of the column.
	pub column_name: String,
	/// This maps each distinct value's key to the number of times it occurs. Missing values are counted under the key `"0"`.
	pub value_frequency: BTreeMap<String, usize>,
	/// These are the distinct keys in the order they first appear in the column.
	pub first_appearance: Vec<String>,
	/// The total number of values.
	pub total_count: usize,
	/// The number of distinct values.
	pub unique_count: usize,
	/// `total_count / (unique_count * 100)`, rounded to two decimal places.
	pub uniqueness_ratio: f64,
	/// True if every value in the column is a number. Missing values count as the number zero.
	pub is_all_numeric: bool,
	/// The median of the column. This is only present if the column is all numeric.
	pub median: Option<f64>,
	/// The Pearson correlation between the column and the target, or zero if it is undefined.
	pub correlation_with_target: f64,
}

impl ColumnStatistics {
	/// Compute the statistics of one column. `values` and `targets` must be aligned.
	///
	/// Symbolic columns are correlated with the target through provisional codes assigned with the policy's symbol code rule.
	pub fn compute(
		column_name: &str,
		values: &[&Value],
		targets: &[f64],
		policy: &EncodingPolicy,
	) -> Result<ColumnStatistics, Error> {
		let insufficient = |reason: String| Error::InsufficientData {
			column: column_name.to_owned(),
			reason,
		};
		if values.len() != targets.len() {
			return Err(insufficient(format!(
				"{} values but {} targets",
				values.len(),
				targets.len()
			)));
		}
		if values.len() < 2 {
			return Err(insufficient(format!(
				"at least 2 values are required, found {}",
				values.len()
			)));
		}

		let mut value_frequency: BTreeMap<String, usize> = BTreeMap::new();
		let mut first_appearance = Vec::new();
		for value in values.iter() {
			let key = value.key();
			match value_frequency.get_mut(&*key) {
				Some(count) => *count += 1,
				None => {
					first_appearance.push(key.clone().into_owned());
					value_frequency.insert(key.into_owned(), 1);
				}
			}
		}

		let numbers: Option<Vec<f64>> = values.iter().map(|value| numeric_reading(value)).collect();
		let is_all_numeric = numbers.is_some();
		let total_count = values.len();
		let unique_count = value_frequency.len();
		let uniqueness_ratio = round_to_hundredths(total_count as f64 / (unique_count as f64 * 100.0));

		let (median, correlation) = match numbers {
			Some(numbers) => (
				pricecast_metrics::median(&numbers),
				pricecast_metrics::pearson(&numbers, targets),
			),
			None => {
				let codes = policy
					.symbol_codes
					.assign(&value_frequency, &first_appearance);
				let provisional: Vec<f64> = values
					.iter()
					.map(|value| codes.get(&*value.key()).copied().unwrap_or(0.0))
					.collect();
				(None, pricecast_metrics::pearson(&provisional, targets))
			}
		};

		Ok(ColumnStatistics {
			column_name: column_name.to_owned(),
			value_frequency,
			first_appearance,
			total_count,
			unique_count,
			uniqueness_ratio,
			is_all_numeric,
			median,
			correlation_with_target: correlation.unwrap_or(0.0),
		})
	}
}

/// Missing values read as zero during training.
fn numeric_reading(value: &Value) -> Option<f64> {
	match value {
		Value::Missing => Some(0.0),
		value => value.as_number(),
	}
}

/// Round half away from zero to two decimal places. The scaled value is first reduced to 15 significant digits, so a ratio like `29 / 200`, whose closest float lies just below `0.145`, rounds to `0.15` as its decimal value does.
pub fn round_to_hundredths(value: f64) -> f64 {
	let scaled = value * 100.0;
	let scaled: f64 = format!("{:.14e}", scaled).parse().unwrap_or(scaled);
	scaled.round() / 100.0
}

#[test]
fn test_symbolic_column() {
	let values: Vec<Value> = ["a", "a", "a", "b", "b", "c"]
		.iter()
		.map(|value| Value::from(*value))
		.collect();
	let values: Vec<&Value> = values.iter().collect();
	let targets = [1.0, 1.0, 1.0, 2.0, 2.0, 3.0];
	let stats =
		ColumnStatistics::compute("letters", &values, &targets, &EncodingPolicy::default()).unwrap();
	assert_eq!(stats.total_count, 6);
	assert_eq!(stats.unique_count, 3);
	assert_eq!(stats.uniqueness_ratio, 0.02);
	assert!(!stats.is_all_numeric);
	assert_eq!(stats.median, None);
	assert_eq!(stats.first_appearance, vec!["a", "b", "c"]);
	// Rarer letters get larger codes and come with larger targets.
	assert!(stats.correlation_with_target > 0.9);
}

#[test]
fn test_numeric_column_with_missing_values() {
	let values = vec![
		Value::Number(4.0),
		Value::Missing,
		Value::from("2"),
		Value::Number(4.0),
	];
	let values: Vec<&Value> = values.iter().collect();
	let targets = [4.0, 0.0, 2.0, 4.0];
	let stats = ColumnStatistics::compute("rooms", &values, &targets, &EncodingPolicy::default())
		.unwrap();
	assert!(stats.is_all_numeric);
	assert_eq!(stats.value_frequency.get("0"), Some(&1));
	assert_eq!(stats.value_frequency.get("4"), Some(&2));
	assert_eq!(stats.unique_count, 3);
	assert_eq!(stats.median, Some(3.0));
	assert!((stats.correlation_with_target - 1.0).abs() < 1e-12);
}

#[test]
fn test_constant_column_has_zero_correlation() {
	let values = vec![Value::Number(1.0); 4];
	let values: Vec<&Value> = values.iter().collect();
	let stats = ColumnStatistics::compute(
		"flag",
		&values,
		&[1.0, 2.0, 3.0, 4.0],
		&EncodingPolicy::default(),
	)
	.unwrap();
	assert_eq!(stats.correlation_with_target, 0.0);
	assert_eq!(stats.uniqueness_ratio, 0.04);
}

#[test]
fn test_insufficient_data() {
	let values = vec![Value::Number(1.0)];
	let values: Vec<&Value> = values.iter().collect();
	let result = ColumnStatistics::compute("rooms", &values, &[1.0], &EncodingPolicy::default());
	assert_eq!(
		result,
		Err(Error::InsufficientData {
			column: "rooms".to_owned(),
			reason: "at least 2 values are required, found 1".to_owned(),
		})
	);
}

#[test]
fn test_rounding() {
	assert_eq!(round_to_hundredths(6.0 / 300.0), 0.02);
	assert_eq!(round_to_hundredths(0.125), 0.13);
	assert_eq!(round_to_hundredths(0.104), 0.1);
	assert_eq!(round_to_hundredths(29.0 / 200.0), 0.15);
	assert_eq!(round_to_hundredths(0.144999), 0.14);
	assert_eq!(round_to_hundredths(-0.145), -0.15);
}
