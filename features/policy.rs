/*!
An [`EncodingPolicy`](struct.EncodingPolicy.html) is the set of decisions that turn column statistics into a classification and an encoding. The default policy is the three-way split with median scale references and frequency-based symbol codes. [`EncodingPolicy::legacy`](struct.EncodingPolicy.html#method.legacy) keeps the older two-way split, correlation scale references and ordinal symbol codes available through the same code paths.
*/

use std::collections::BTreeMap;

/// The default boundary above which a column is categorical.
pub const DEFAULT_CATEGORICAL_BOUNDARY: f64 = 0.1;
/// The default boundary above which a column that is not categorical is a short variable.
pub const DEFAULT_LIMITED_VARIABLE_BOUNDARY: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EncodingPolicy {
	/// Columns with a uniqueness ratio strictly greater than this are categorical.
	pub categorical_boundary: f64,
	/// Columns that are not categorical and have a uniqueness ratio strictly greater than this are short variables. This is ignored by the two-way split.
	pub limited_variable_boundary: f64,
	pub category_split: CategorySplit,
	pub scale_reference: ScaleReference,
	pub symbol_codes: SymbolCodes,
	/// If this is true, every value of a column whose correlation with the target is negative encodes to epsilon.
	pub drop_negatively_correlated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CategorySplit {
	/// Categorical, short variable or continuous.
	#[serde(rename = "three_way")]
	ThreeWay,
	/// Categorical or continuous.
	#[serde(rename = "two_way")]
	TwoWay,
}

/// This enum selects the statistic numeric columns are scaled by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScaleReference {
	#[serde(rename = "median")]
	Median,
	/// The correlation with the target. Near-zero and negative correlations make this fragile.
	#[serde(rename = "correlation")]
	Correlation,
}

/// This enum selects how symbols seen in training are assigned codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SymbolCodes {
	/// `sqrt(unique_count) / sqrt(frequency)`. Rare symbols get large codes and common symbols get small ones.
	#[serde(rename = "frequency")]
	Frequency,
	/// `1 / (1 + exp(ord))` where `ord` counts from one in order of first appearance.
	#[serde(rename = "ordinal")]
	Ordinal,
}

impl Default for EncodingPolicy {
	fn default() -> Self {
		Self {
			categorical_boundary: DEFAULT_CATEGORICAL_BOUNDARY,
			limited_variable_boundary: DEFAULT_LIMITED_VARIABLE_BOUNDARY,
			category_split: CategorySplit::ThreeWay,
			scale_reference: ScaleReference::Median,
			symbol_codes: SymbolCodes::Frequency,
			drop_negatively_correlated: true,
		}
	}
}

impl EncodingPolicy {
	pub fn legacy() -> Self {
		Self {
			category_split: CategorySplit::TwoWay,
			scale_reference: ScaleReference::Correlation,
			symbol_codes: SymbolCodes::Ordinal,
			..Self::default()
		}
	}

	pub fn with_boundaries(mut self, categorical_boundary: f64, limited_variable_boundary: f64) -> Self {
		self.categorical_boundary = categorical_boundary;
		self.limited_variable_boundary = limited_variable_boundary;
		self
	}
}

impl SymbolCodes {
	/// Assign a code to every distinct symbol in `value_frequency`. `first_appearance` lists the same symbols in the order they first appeared in the column.
	pub fn assign(
		self,
		value_frequency: &BTreeMap<String, usize>,
		first_appearance: &[String],
	) -> BTreeMap<String, f64> {
		match self {
			SymbolCodes::Frequency => {
				let scale = (value_frequency.len() as f64).sqrt();
				value_frequency
					.iter()
					.map(|(value, frequency)| (value.clone(), scale / (*frequency as f64).sqrt()))
					.collect()
			}
			SymbolCodes::Ordinal => {
				let mut codes = BTreeMap::new();
				for (index, value) in first_appearance.iter().enumerate() {
					let code = symbol_code(index + 1, &codes);
					codes.insert(value.clone(), code);
				}
				codes
			}
		}
	}
}

/**
The code for the symbol at ordinal `ord`, given the codes already assigned in `codes`.

This is `1 / (1 + exp(ord))`. Past an ordinal of about 709 that underflows to zero, so if it is zero or already in `codes`, the code is the largest float below the smallest positive code in `codes` instead. The result is always positive and never equal to a code in `codes`.
*/
pub(crate) fn symbol_code(ord: usize, codes: &BTreeMap<String, f64>) -> f64 {
	let code = 1.0 / (1.0 + (ord as f64).exp());
	if code > 0.0 && !codes.values().any(|taken| *taken == code) {
		return code;
	}
	let lowest = codes
		.values()
		.copied()
		.filter(|taken| *taken > 0.0)
		.fold(f64::INFINITY, f64::min);
	if lowest.is_finite() {
		// For a positive float, the next smaller float has the previous bit pattern.
		f64::from_bits(lowest.to_bits() - 1)
	} else {
		f64::MIN_POSITIVE
	}
}

/// Options that control encoding at train and predict time. Unlike the policy, these are not persisted with the encoder state, so a deployment can choose them per batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
	pub unseen_symbols: UnseenSymbols,
	pub invalid_values: InvalidValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnseenSymbols {
	/// Assign a new code to a symbol that was not seen in training and record it in the symbol table.
	#[serde(rename = "extend")]
	Extend,
	/// Fail on a symbol that was not seen in training. The encoder state is never modified.
	#[serde(rename = "reject")]
	Reject,
}

impl Default for UnseenSymbols {
	fn default() -> Self {
		UnseenSymbols::Extend
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InvalidValues {
	/// Encode an invalid cell as zero and log a warning.
	#[serde(rename = "coerce")]
	Coerce,
	/// Fail the whole batch on the first invalid cell.
	#[serde(rename = "strict")]
	Strict,
}

impl Default for InvalidValues {
	fn default() -> Self {
		InvalidValues::Coerce
	}
}

#[test]
fn test_symbol_codes() {
	let mut value_frequency = BTreeMap::new();
	value_frequency.insert("a".to_owned(), 3);
	value_frequency.insert("b".to_owned(), 2);
	value_frequency.insert("c".to_owned(), 1);
	let first_appearance = vec!["c".to_owned(), "a".to_owned(), "b".to_owned()];

	let codes = SymbolCodes::Frequency.assign(&value_frequency, &first_appearance);
	let scale = 3.0f64.sqrt();
	assert_eq!(codes["a"], scale / 3.0f64.sqrt());
	assert_eq!(codes["b"], scale / 2.0f64.sqrt());
	assert_eq!(codes["c"], scale);
	assert!(codes["c"] > codes["b"] && codes["b"] > codes["a"]);

	let codes = SymbolCodes::Ordinal.assign(&value_frequency, &first_appearance);
	assert_eq!(codes["c"], 1.0 / (1.0 + 1.0f64.exp()));
	assert_eq!(codes["a"], 1.0 / (1.0 + 2.0f64.exp()));
	assert_eq!(codes["b"], 1.0 / (1.0 + 3.0f64.exp()));
}

#[test]
fn test_ordinal_codes_past_underflow() {
	let first_appearance: Vec<String> = (0..800).map(|index| format!("symbol {}", index)).collect();
	let value_frequency = first_appearance
		.iter()
		.map(|value| (value.clone(), 1))
		.collect();
	let codes = SymbolCodes::Ordinal.assign(&value_frequency, &first_appearance);
	assert_eq!(codes.len(), 800);
	let codes: Vec<f64> = first_appearance.iter().map(|value| codes[value]).collect();
	assert!(codes.iter().all(|code| *code > 0.0));
	for pair in codes.windows(2) {
		assert!(pair[0] > pair[1]);
	}
}

#[test]
fn test_policy_serialization() {
	let policy = EncodingPolicy::legacy();
	let json = serde_json::to_string(&policy).unwrap();
	assert_eq!(
		json,
		r#"{"categorical_boundary":0.1,"limited_variable_boundary":0.05,"category_split":"two_way","scale_reference":"correlation","symbol_codes":"ordinal","drop_negatively_correlated":true}"#
	);
	let restored: EncodingPolicy = serde_json::from_str(&json).unwrap();
	assert_eq!(restored, policy);
}
