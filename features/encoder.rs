/*!
A [`TransformSpec`](struct.TransformSpec.html) describes how to turn the raw values of one column into numbers.

# Encoding

| column                     | raw value `v`        | feature value                          |
|----------------------------|----------------------|----------------------------------------|
| any                        | missing              | `0.001`                                |
| negatively correlated      | any                  | `0.001`                                |
| categorical, numeric       | number               | `1 / scale_reference + exp(-v) * 100`  |
| short variable, numeric    | number `>= 0`        | `sqrt(v) / scale_reference`            |
| continuous, numeric        | number `>= 0`        | `sqrt(v) / scale_reference`            |
| symbolic                   | symbol in the table  | `code * 10`                            |
| symbolic                   | unseen symbol        | new code `1 / (1 + exp(len + 1))`, then `code * 10` |

The new code for an unseen symbol underflows to zero once the table holds about 709 symbols. From then on, and whenever the new code is already taken, the symbol gets the largest float below the smallest positive code in the table, so codes stay distinct.

A scale reference of zero is replaced by `0.001`. A numeric column that receives text or a negative number has an invalid cell, which is coerced to `0` or rejected depending on the [`EncodeOptions`](../policy/struct.EncodeOptions.html).
*/

use crate::{
	classify::{Category, ValueKind},
	policy::{symbol_code, EncodeOptions, EncodingPolicy, InvalidValues, ScaleReference, UnseenSymbols},
	stats::ColumnStatistics,
	Error,
};
use pricecast_dataset::Value;
use std::collections::BTreeMap;

/// Missing values and irrelevant columns encode to this value. It also replaces a zero scale reference.
pub const EPSILON: f64 = 0.001;

/// Symbol codes are multiplied by this value when they are encoded.
const SYMBOL_CODE_SCALE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformSpec {
	pub column_name: String,
	pub category: Category,
	pub value_kind: ValueKind,
	/// For numeric columns, the median or the correlation with the target, depending on the policy. For symbolic columns, the square root of the number of distinct symbols seen in training.
	pub scale_reference: f64,
	/// The correlation between the column and the target in training.
	pub correlation: f64,
	/// This maps symbols to their codes. It is empty for numeric columns and grows when unseen symbols are encoded with [`UnseenSymbols::Extend`](../policy/enum.UnseenSymbols.html).
	pub symbol_table: BTreeMap<String, f64>,
}

enum Lookup {
	Encoded(f64),
	Unseen,
	Invalid,
}

impl TransformSpec {
	/// Derive the transform for a column from its statistics.
	pub fn derive(stats: &ColumnStatistics, policy: &EncodingPolicy) -> TransformSpec {
		let (category, value_kind) = policy.classify(stats);
		let (scale_reference, symbol_table) = match value_kind {
			ValueKind::Numeric => {
				let scale_reference = match policy.scale_reference {
					ScaleReference::Median => stats.median.unwrap_or(0.0),
					ScaleReference::Correlation => stats.correlation_with_target,
				};
				(scale_reference, BTreeMap::new())
			}
			ValueKind::Symbolic => (
				(stats.unique_count as f64).sqrt(),
				policy
					.symbol_codes
					.assign(&stats.value_frequency, &stats.first_appearance),
			),
		};
		tracing::debug!(
			column = %stats.column_name,
			uniqueness_ratio = stats.uniqueness_ratio,
			%category,
			%value_kind,
			scale_reference,
			correlation = stats.correlation_with_target,
			"classified column"
		);
		TransformSpec {
			column_name: stats.column_name.clone(),
			category,
			value_kind,
			scale_reference,
			correlation: stats.correlation_with_target,
			symbol_table,
		}
	}

	/// Encode `value`, recording a new code in the symbol table if `value` is an unseen symbol and `options` allow it.
	pub fn encode(
		&mut self,
		value: &Value,
		policy: &EncodingPolicy,
		options: &EncodeOptions,
	) -> Result<f64, Error> {
		match self.lookup(value, policy) {
			Lookup::Encoded(encoded) => Ok(encoded),
			Lookup::Invalid => self.invalid(value, options),
			Lookup::Unseen => match options.unseen_symbols {
				UnseenSymbols::Extend => {
					let code = symbol_code(self.symbol_table.len() + 1, &self.symbol_table);
					tracing::debug!(column = %self.column_name, value = %value, code, "assigned code to unseen value");
					self.symbol_table.insert(value.key().into_owned(), code);
					Ok(code * SYMBOL_CODE_SCALE)
				}
				UnseenSymbols::Reject => Err(self.unseen(value)),
			},
		}
	}

	/// Encode `value` without modifying the symbol table. Unseen symbols are always rejected.
	pub fn encode_frozen(
		&self,
		value: &Value,
		policy: &EncodingPolicy,
		options: &EncodeOptions,
	) -> Result<f64, Error> {
		match self.lookup(value, policy) {
			Lookup::Encoded(encoded) => Ok(encoded),
			Lookup::Invalid => self.invalid(value, options),
			Lookup::Unseen => Err(self.unseen(value)),
		}
	}

	fn lookup(&self, value: &Value, policy: &EncodingPolicy) -> Lookup {
		if value.is_missing() || (policy.drop_negatively_correlated && self.correlation < 0.0) {
			return Lookup::Encoded(EPSILON);
		}
		match self.value_kind {
			ValueKind::Numeric => {
				let value = match value.as_number() {
					Some(value) => value,
					None => return Lookup::Invalid,
				};
				let encoded = match self.category {
					Category::Categorical => {
						1.0 / self.divisor() + (-value).exp() * 100.0
					}
					Category::ShortVariable | Category::Continuous => {
						if value < 0.0 {
							return Lookup::Invalid;
						}
						value.sqrt() / self.divisor()
					}
				};
				if encoded.is_finite() {
					Lookup::Encoded(encoded)
				} else {
					Lookup::Invalid
				}
			}
			ValueKind::Symbolic => match self.symbol_table.get(&*value.key()) {
				Some(code) => Lookup::Encoded(code * SYMBOL_CODE_SCALE),
				None => Lookup::Unseen,
			},
		}
	}

	/// The scale reference, unless it is zero or not finite, in which case it is epsilon.
	fn divisor(&self) -> f64 {
		if self.scale_reference == 0.0 || !self.scale_reference.is_finite() {
			tracing::trace!(column = %self.column_name, scale_reference = self.scale_reference, "degenerate divisor");
			EPSILON
		} else {
			self.scale_reference
		}
	}

	fn invalid(&self, value: &Value, options: &EncodeOptions) -> Result<f64, Error> {
		match options.invalid_values {
			InvalidValues::Coerce => {
				tracing::warn!(column = %self.column_name, value = %value, "coerced invalid value to 0");
				Ok(0.0)
			}
			InvalidValues::Strict => Err(Error::InvalidValue {
				column: self.column_name.clone(),
				value: value.to_string(),
			}),
		}
	}

	fn unseen(&self, value: &Value) -> Error {
		Error::UnseenSymbol {
			column: self.column_name.clone(),
			value: value.to_string(),
		}
	}
}

#[cfg(test)]
fn spec(category: Category, value_kind: ValueKind, scale_reference: f64) -> TransformSpec {
	TransformSpec {
		column_name: "column".to_owned(),
		category,
		value_kind,
		scale_reference,
		correlation: 0.5,
		symbol_table: BTreeMap::new(),
	}
}

#[test]
fn test_missing_values_encode_to_epsilon() {
	let policy = EncodingPolicy::default();
	let options = EncodeOptions::default();
	for category in [
		Category::Categorical,
		Category::ShortVariable,
		Category::Continuous,
	]
	.iter()
	{
		for value_kind in [ValueKind::Numeric, ValueKind::Symbolic].iter() {
			let mut spec = spec(*category, *value_kind, 2.0);
			assert_eq!(spec.encode(&Value::Missing, &policy, &options), Ok(EPSILON));
			assert!(spec.symbol_table.is_empty());
		}
	}
}

#[test]
fn test_negatively_correlated_columns_encode_to_epsilon() {
	let mut spec = spec(Category::Continuous, ValueKind::Numeric, 2.0);
	spec.correlation = -0.3;
	let options = EncodeOptions::default();
	let policy = EncodingPolicy::default();
	assert_eq!(spec.encode(&Value::Number(9.0), &policy, &options), Ok(EPSILON));
	let policy = EncodingPolicy {
		drop_negatively_correlated: false,
		..EncodingPolicy::default()
	};
	assert_eq!(spec.encode(&Value::Number(9.0), &policy, &options), Ok(1.5));
}

#[test]
fn test_numeric_encodings() {
	let policy = EncodingPolicy::default();
	let options = EncodeOptions::default();
	let mut categorical = spec(Category::Categorical, ValueKind::Numeric, 4.0);
	assert_eq!(
		categorical.encode(&Value::Number(2.0), &policy, &options),
		Ok(0.25 + (-2.0f64).exp() * 100.0)
	);
	let mut short_variable = spec(Category::ShortVariable, ValueKind::Numeric, 4.0);
	assert_eq!(
		short_variable.encode(&Value::Number(16.0), &policy, &options),
		Ok(1.0)
	);
	// Numeric text reads as a number.
	assert_eq!(
		short_variable.encode(&Value::from("4"), &policy, &options),
		Ok(0.5)
	);
}

#[test]
fn test_degenerate_divisor_is_replaced_by_epsilon() {
	let policy = EncodingPolicy::default();
	let options = EncodeOptions::default();
	let mut continuous = spec(Category::Continuous, ValueKind::Numeric, 0.0);
	assert_eq!(
		continuous.encode(&Value::Number(4.0), &policy, &options),
		Ok(2.0 / EPSILON)
	);
	let mut categorical = spec(Category::Categorical, ValueKind::Numeric, 0.0);
	assert_eq!(
		categorical.encode(&Value::Number(0.0), &policy, &options),
		Ok(1.0 / EPSILON + 100.0)
	);
}

#[test]
fn test_invalid_values() {
	let policy = EncodingPolicy::default();
	let mut continuous = spec(Category::Continuous, ValueKind::Numeric, 2.0);
	let permissive = EncodeOptions::default();
	assert_eq!(
		continuous.encode(&Value::Number(-4.0), &policy, &permissive),
		Ok(0.0)
	);
	assert_eq!(
		continuous.encode(&Value::from("many"), &policy, &permissive),
		Ok(0.0)
	);
	let strict = EncodeOptions {
		invalid_values: InvalidValues::Strict,
		..EncodeOptions::default()
	};
	assert_eq!(
		continuous.encode(&Value::Number(-4.0), &policy, &strict),
		Err(Error::InvalidValue {
			column: "column".to_owned(),
			value: "-4".to_owned(),
		})
	);
	let mut categorical = spec(Category::Categorical, ValueKind::Numeric, 2.0);
	assert!(categorical
		.encode(&Value::Number(-1000.0), &policy, &strict)
		.is_err());
}

#[test]
fn test_unseen_symbols() {
	let policy = EncodingPolicy::default();
	let mut symbolic = spec(Category::Categorical, ValueKind::Symbolic, 1.0);
	symbolic.symbol_table.insert("red".to_owned(), 0.5);
	let options = EncodeOptions::default();
	assert_eq!(symbolic.encode(&Value::from("red"), &policy, &options), Ok(5.0));
	let reject = EncodeOptions {
		unseen_symbols: UnseenSymbols::Reject,
		..EncodeOptions::default()
	};
	assert_eq!(
		symbolic.encode_frozen(&Value::from("blue"), &policy, &options),
		Err(Error::UnseenSymbol {
			column: "column".to_owned(),
			value: "blue".to_owned(),
		})
	);
	assert!(symbolic
		.encode(&Value::from("blue"), &policy, &reject)
		.is_err());
	assert_eq!(symbolic.symbol_table.len(), 1);
	let encoded = symbolic
		.encode(&Value::from("blue"), &policy, &options)
		.unwrap();
	let code = 1.0 / (1.0 + 2.0f64.exp());
	assert_eq!(symbolic.symbol_table.get("blue"), Some(&code));
	assert_eq!(encoded, code * 10.0);
	// Once assigned, the code is reused.
	assert_eq!(
		symbolic.encode_frozen(&Value::from("blue"), &policy, &options),
		Ok(encoded)
	);
}

#[cfg(test)]
proptest::proptest! {
	#[test]
	fn test_unseen_symbols_get_distinct_codes(n in 1usize..64) {
		let policy = EncodingPolicy::default();
		let options = EncodeOptions::default();
		let mut symbolic = spec(Category::Continuous, ValueKind::Symbolic, 1.0);
		symbolic.symbol_table.insert("seen".to_owned(), 0.75);
		let mut codes = Vec::new();
		for index in 0..n {
			let value = Value::Text(format!("unseen {}", index));
			let encoded = symbolic.encode(&value, &policy, &options).unwrap();
			proptest::prop_assert!(encoded.is_finite());
			proptest::prop_assert!(!codes.contains(&encoded));
			codes.push(encoded);
			proptest::prop_assert_eq!(symbolic.symbol_table.get("seen"), Some(&0.75));
		}
		proptest::prop_assert_eq!(symbolic.symbol_table.len(), n + 1);
		for (index, encoded) in codes.iter().enumerate() {
			let value = Value::Text(format!("unseen {}", index));
			proptest::prop_assert_eq!(symbolic.encode(&value, &policy, &options).unwrap(), *encoded);
		}
	}
}

#[test]
fn test_unseen_symbol_codes_past_underflow() {
	let policy = EncodingPolicy::default();
	let options = EncodeOptions::default();
	let mut symbolic = spec(Category::Continuous, ValueKind::Symbolic, 1.0);
	let mut codes = Vec::new();
	for index in 0..800 {
		let value = Value::Text(format!("unseen {}", index));
		symbolic.encode(&value, &policy, &options).unwrap();
		codes.push(symbolic.symbol_table[&format!("unseen {}", index)]);
	}
	assert_eq!(symbolic.symbol_table.len(), 800);
	assert!(codes.iter().all(|code| *code > 0.0));
	for pair in codes.windows(2) {
		assert!(pair[0] > pair[1]);
	}
}
