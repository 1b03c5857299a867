/*!
This module defines the [`Engine`](struct.Engine.html), which fits an [`EncoderState`](../../pricecast_features/state/struct.EncoderState.html) to a dataset, encodes rows with it and hands the encoded rows to a [`Regressor`](trait.Regressor.html).
*/

use crate::Error;
use ndarray::prelude::*;
use pricecast_dataset::{Dataset, Row};
use pricecast_features::{EncodeOptions, EncoderState, EncodingPolicy};
use pricecast_linear::LinearRegressor;

/// A `Regressor` fits encoded features to targets and predicts targets for encoded features. Its hyperparameters are its own business.
pub trait Regressor {
	fn train(&mut self, features: ArrayView2<f64>, targets: &[f64]);
	fn predict(&self, features: ArrayView2<f64>) -> Vec<f64>;
}

impl Regressor for LinearRegressor {
	fn train(&mut self, features: ArrayView2<f64>, targets: &[f64]) {
		self.fit(features, ArrayView1::from(targets));
	}

	fn predict(&self, features: ArrayView2<f64>) -> Vec<f64> {
		LinearRegressor::predict(self, features).to_vec()
	}
}

/**
An `Engine` is untrained until [`train`](#method.train) succeeds or it is created with [`with_state`](#method.with_state). Only a trained engine can encode rows or predict.

Encoding may add unseen symbols to the state, so `encode` and `predict` take `&mut self`. Wrap the engine in a `Mutex` to share it between threads.
*/
#[derive(Debug)]
pub struct Engine<R: Regressor> {
	regressor: R,
	policy: EncodingPolicy,
	options: EncodeOptions,
	state: Option<EncoderState>,
}

impl<R: Regressor> Engine<R> {
	/// Create an untrained engine that will fit its state with the default policy.
	pub fn new(regressor: R, options: EncodeOptions) -> Engine<R> {
		Engine {
			regressor,
			policy: EncodingPolicy::default(),
			options,
			state: None,
		}
	}

	/// Create a trained engine from a state restored from a previous run. `regressor` must already be fitted.
	pub fn with_state(regressor: R, state: EncoderState, options: EncodeOptions) -> Engine<R> {
		Engine {
			regressor,
			policy: state.policy.clone(),
			options,
			state: Some(state),
		}
	}

	/// Use `policy` the next time this engine is trained.
	pub fn with_policy(mut self, policy: EncodingPolicy) -> Engine<R> {
		self.policy = policy;
		self
	}

	/// Fit the encoder state to `dataset`, encode every sample and train the regressor on the encoded samples.
	pub fn train(&mut self, dataset: &Dataset) -> Result<&EncoderState, Error> {
		tracing::info!(
			rows = dataset.n_rows(),
			columns = dataset.n_columns(),
			"training"
		);
		let mut state = EncoderState::fit(dataset, &self.policy)?;
		let features = state.encode_rows(dataset.samples(), &self.options)?;
		self.regressor.train(features.view(), dataset.targets());
		tracing::info!(rows = dataset.n_rows(), "finished training");
		Ok(&*self.state.insert(state))
	}

	/// Encode `samples` with the trained state.
	pub fn encode(&mut self, samples: &[Row]) -> Result<Array2<f64>, Error> {
		let options = self.options;
		let state = self.state.as_mut().ok_or(Error::NotTrained)?;
		Ok(state.encode_rows(samples, &options)?)
	}

	/// Predict a target for each of `samples`. The predictions are in the same order as `samples`.
	pub fn predict(&mut self, samples: &[Row]) -> Result<Vec<f64>, Error> {
		if self.state.is_none() {
			return Err(Error::NotTrained);
		}
		tracing::info!(rows = samples.len(), "predicting");
		let features = self.encode(samples)?;
		let predictions = self.regressor.predict(features.view());
		tracing::info!(rows = predictions.len(), "finished predicting");
		Ok(predictions)
	}

	pub fn state(&self) -> Option<&EncoderState> {
		self.state.as_ref()
	}

	pub fn into_state(self) -> Option<EncoderState> {
		self.state
	}

	pub fn regressor(&self) -> &R {
		&self.regressor
	}

	pub fn options(&self) -> &EncodeOptions {
		&self.options
	}

	/// Split this engine into its regressor and its state.
	pub fn into_parts(self) -> (R, Option<EncoderState>) {
		(self.regressor, self.state)
	}
}

#[cfg(test)]
#[derive(Debug, Default)]
struct RowSum {
	trained_on: Option<(Array2<f64>, Vec<f64>)>,
	n_predict_calls: std::cell::Cell<usize>,
}

#[cfg(test)]
impl Regressor for RowSum {
	fn train(&mut self, features: ArrayView2<f64>, targets: &[f64]) {
		self.trained_on = Some((features.to_owned(), targets.to_vec()));
	}

	fn predict(&self, features: ArrayView2<f64>) -> Vec<f64> {
		self.n_predict_calls.set(self.n_predict_calls.get() + 1);
		features.axis_iter(Axis(0)).map(|row| row.sum()).collect()
	}
}

#[cfg(test)]
fn letters() -> Dataset {
	let samples = ["a", "a", "a", "b", "b", "c"]
		.iter()
		.map(|letter| vec![pricecast_dataset::Value::from(*letter)])
		.collect();
	Dataset::new(
		vec!["letter".to_owned()],
		samples,
		vec![1.0, 1.0, 1.0, 2.0, 2.0, 3.0],
	)
	.unwrap()
}

#[test]
fn test_predict_before_train() {
	let mut engine = Engine::new(RowSum::default(), EncodeOptions::default());
	let samples = vec![vec![pricecast_dataset::Value::from("a")]];
	assert_eq!(engine.predict(&samples), Err(Error::NotTrained));
	assert_eq!(engine.encode(&samples), Err(Error::NotTrained));
	assert_eq!(engine.regressor().n_predict_calls.get(), 0);
	assert!(engine.state().is_none());
}

#[test]
fn test_unseen_symbol_is_added() {
	use pricecast_dataset::Value;
	use pricecast_features::{Category, ValueKind};
	let dataset = letters();
	let mut engine = Engine::new(RowSum::default(), EncodeOptions::default());
	let state = engine.train(&dataset).unwrap();
	let spec = &state.columns[0];
	assert_eq!(spec.category, Category::Continuous);
	assert_eq!(spec.value_kind, ValueKind::Symbolic);
	assert_eq!(spec.symbol_table.len(), 3);
	let (features, targets) = engine.regressor().trained_on.clone().unwrap();
	assert_eq!(features.dim(), (6, 1));
	assert_eq!(targets, dataset.targets());

	let predictions = engine.predict(&[vec![Value::from("d")]]).unwrap();
	assert_eq!(predictions.len(), 1);
	assert!(predictions[0].is_finite());
	let table = &engine.state().unwrap().columns[0].symbol_table;
	assert_eq!(table.len(), 4);
	assert!(table.contains_key("d"));
}

#[test]
fn test_missing_values_encode_to_epsilon() {
	use pricecast_dataset::Value;
	let mut engine = Engine::new(RowSum::default(), EncodeOptions::default());
	engine.train(&letters()).unwrap();
	let encoded = engine.encode(&[vec![Value::Missing]]).unwrap();
	assert_eq!(encoded[[0, 0]], pricecast_features::encoder::EPSILON);
}

#[test]
fn test_restored_state_encodes_identically() {
	use pricecast_dataset::Value;
	let dataset = letters();
	let held_out = vec![
		vec![Value::from("d")],
		vec![Value::Missing],
		vec![Value::from("b")],
		vec![Value::from("e")],
		vec![Value::from("d")],
	];
	let mut engine = Engine::new(RowSum::default(), EncodeOptions::default());
	let json = engine.train(&dataset).unwrap().to_json().unwrap();
	let bytes = engine.state().unwrap().to_vec().unwrap();
	let encoded = engine.encode(dataset.samples()).unwrap();
	let predictions = engine.predict(dataset.samples()).unwrap();
	let encoded_held_out = engine.encode(&held_out).unwrap();
	let grown_table = engine.state().unwrap().columns[0].symbol_table.clone();
	assert_eq!(grown_table.len(), 5);

	let from_json = EncoderState::from_json(&json).unwrap();
	let from_bytes = EncoderState::from_slice(&bytes).unwrap();
	for state in vec![from_json, from_bytes] {
		let mut restored = Engine::with_state(RowSum::default(), state, EncodeOptions::default());
		assert_eq!(restored.encode(dataset.samples()).unwrap(), encoded);
		assert_eq!(restored.predict(dataset.samples()).unwrap(), predictions);
		let restored_held_out = restored.encode(&held_out).unwrap();
		assert!(restored_held_out
			.iter()
			.zip(encoded_held_out.iter())
			.all(|(restored, original)| restored.to_bits() == original.to_bits()));
		let restored_table = &restored.state().unwrap().columns[0].symbol_table;
		assert_eq!(restored_table, &grown_table);
		assert!(restored_table
			.values()
			.zip(grown_table.values())
			.all(|(restored, original)| restored.to_bits() == original.to_bits()));
	}
}

#[test]
fn test_column_count_mismatch() {
	use pricecast_dataset::Value;
	let mut engine = Engine::new(RowSum::default(), EncodeOptions::default());
	engine.train(&letters()).unwrap();
	let result = engine.predict(&[vec![Value::from("a")], vec![Value::from("a"), Value::Missing]]);
	assert_eq!(
		result,
		Err(Error::Features(pricecast_features::Error::ColumnCountMismatch {
			row: 1,
			expected: 1,
			actual: 2,
		}))
	);
	assert_eq!(engine.regressor().n_predict_calls.get(), 0);
}

#[test]
fn test_train_linear_regressor() {
	use pricecast_dataset::Value;
	use pricecast_linear::TrainOptions;
	let samples = (0..40)
		.map(|index| {
			let parity = if index % 2 == 0 { "even" } else { "odd" };
			vec![Value::Number((index % 20) as f64), Value::from(parity)]
		})
		.collect();
	let targets = (0..40).map(|index| (index % 20) as f64).collect();
	let dataset = Dataset::new(vec!["x".to_owned(), "parity".to_owned()], samples, targets).unwrap();
	let options = TrainOptions {
		max_epochs: 200,
		early_stopping_options: None,
		..Default::default()
	};
	let mut engine = Engine::new(LinearRegressor::new(options), EncodeOptions::default());
	engine.train(&dataset).unwrap();
	assert_eq!(engine.regressor().losses.len(), 200);
	let predictions = engine.predict(dataset.samples()).unwrap();
	assert_eq!(predictions.len(), 40);
	assert!(predictions.iter().all(|prediction| prediction.is_finite()));
}
