/*!
This module defines the `Config` struct, which is read from an optional YAML file and configures how columns are classified and encoded and how the linear regressor is trained. Every field is optional.
*/

use anyhow::{Context, Result};
use pricecast_features::{
	policy::{CategorySplit, ScaleReference, SymbolCodes},
	EncodeOptions, EncodingPolicy, InvalidValues, UnseenSymbols,
};
use pricecast_linear::TrainOptions;
use std::path::Path;

#[derive(Debug, Default, serde::Deserialize)]
pub struct Config {
	pub categorical_boundary: Option<f64>,
	pub limited_variable_boundary: Option<f64>,
	pub policy: Option<PolicyPreset>,
	pub category_split: Option<CategorySplit>,
	pub scale_reference: Option<ScaleReference>,
	pub symbol_codes: Option<SymbolCodes>,
	pub drop_negatively_correlated: Option<bool>,
	pub unseen_symbols: Option<UnseenSymbols>,
	pub invalid_values: Option<InvalidValues>,
	pub linear: Option<LinearConfig>,
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub enum PolicyPreset {
	#[serde(rename = "canonical")]
	Canonical,
	#[serde(rename = "legacy")]
	Legacy,
}

#[derive(Debug, serde::Deserialize)]
pub struct LinearConfig {
	pub l2_regularization: Option<f64>,
	pub learning_rate: Option<f64>,
	pub max_epochs: Option<usize>,
	pub n_examples_per_batch: Option<usize>,
	pub early_stopping_options: Option<EarlyStoppingOptions>,
}

#[derive(Debug, serde::Deserialize)]
pub struct EarlyStoppingOptions {
	pub early_stopping_fraction: f64,
	pub n_epochs_without_improvement_to_stop: usize,
	pub min_decrease_in_loss_for_significant_change: f64,
}

impl Config {
	/// Read and parse the config file at `path`.
	pub fn from_path(path: &Path) -> Result<Config> {
		let config = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read config file {}", path.display()))?;
		let config = serde_yaml::from_str(&config)
			.with_context(|| format!("failed to parse config file {}", path.display()))?;
		Ok(config)
	}

	/// Start from the preset policy and apply the fields set in this config.
	pub fn encoding_policy(&self) -> EncodingPolicy {
		let mut policy = match self.policy.unwrap_or(PolicyPreset::Canonical) {
			PolicyPreset::Canonical => EncodingPolicy::default(),
			PolicyPreset::Legacy => EncodingPolicy::legacy(),
		};
		if let Some(categorical_boundary) = self.categorical_boundary {
			policy.categorical_boundary = categorical_boundary;
		}
		if let Some(limited_variable_boundary) = self.limited_variable_boundary {
			policy.limited_variable_boundary = limited_variable_boundary;
		}
		if let Some(category_split) = self.category_split {
			policy.category_split = category_split;
		}
		if let Some(scale_reference) = self.scale_reference {
			policy.scale_reference = scale_reference;
		}
		if let Some(symbol_codes) = self.symbol_codes {
			policy.symbol_codes = symbol_codes;
		}
		if let Some(drop_negatively_correlated) = self.drop_negatively_correlated {
			policy.drop_negatively_correlated = drop_negatively_correlated;
		}
		policy
	}

	pub fn encode_options(&self) -> EncodeOptions {
		EncodeOptions {
			unseen_symbols: self.unseen_symbols.unwrap_or_default(),
			invalid_values: self.invalid_values.unwrap_or_default(),
		}
	}

	pub fn linear_train_options(&self) -> TrainOptions {
		let mut options = TrainOptions::default();
		let linear = match self.linear.as_ref() {
			Some(linear) => linear,
			None => return options,
		};
		if let Some(l2_regularization) = linear.l2_regularization {
			options.l2_regularization = l2_regularization;
		}
		if let Some(learning_rate) = linear.learning_rate {
			options.learning_rate = learning_rate;
		}
		if let Some(max_epochs) = linear.max_epochs {
			options.max_epochs = max_epochs;
		}
		if let Some(n_examples_per_batch) = linear.n_examples_per_batch {
			options.n_examples_per_batch = n_examples_per_batch;
		}
		if let Some(early_stopping_options) = linear.early_stopping_options.as_ref() {
			options.early_stopping_options = Some(pricecast_linear::EarlyStoppingOptions {
				early_stopping_fraction: early_stopping_options.early_stopping_fraction,
				n_epochs_without_improvement_to_stop: early_stopping_options
					.n_epochs_without_improvement_to_stop,
				min_decrease_in_loss_for_significant_change: early_stopping_options
					.min_decrease_in_loss_for_significant_change,
			});
		}
		options
	}
}

#[test]
fn test_defaults() {
	let config = Config::default();
	assert_eq!(config.encoding_policy(), EncodingPolicy::default());
	assert_eq!(config.encode_options(), EncodeOptions::default());
	assert_eq!(config.linear_train_options(), TrainOptions::default());
}

#[test]
fn test_parse() {
	let config: Config = serde_yaml::from_str(
		r#"
policy: legacy
categorical_boundary: 0.2
drop_negatively_correlated: false
unseen_symbols: reject
invalid_values: strict
linear:
  learning_rate: 0.05
  max_epochs: 10
  early_stopping_options:
    early_stopping_fraction: 0.2
    n_epochs_without_improvement_to_stop: 5
    min_decrease_in_loss_for_significant_change: 0.0001
"#,
	)
	.unwrap();
	let policy = config.encoding_policy();
	assert_eq!(policy.category_split, CategorySplit::TwoWay);
	assert_eq!(policy.symbol_codes, SymbolCodes::Ordinal);
	assert_eq!(policy.categorical_boundary, 0.2);
	assert!(!policy.drop_negatively_correlated);
	insta::assert_debug_snapshot!(config.encode_options(), @r###"
 EncodeOptions {
     unseen_symbols: Reject,
     invalid_values: Strict,
 }
 "###);
	let options = config.linear_train_options();
	assert_eq!(options.learning_rate, 0.05);
	assert_eq!(options.max_epochs, 10);
	assert_eq!(options.n_examples_per_batch, 128);
	assert_eq!(
		options.early_stopping_options.map(|o| o.n_epochs_without_improvement_to_stop),
		Some(5)
	);
}

#[test]
fn test_unknown_preset() {
	let result = serde_yaml::from_str::<Config>("policy: experimental");
	assert!(result.is_err());
}

#[test]
fn test_missing_file() {
	let error = Config::from_path(Path::new("/nonexistent/pricecast.yaml")).unwrap_err();
	assert_eq!(
		error.to_string(),
		"failed to read config file /nonexistent/pricecast.yaml"
	);
}
