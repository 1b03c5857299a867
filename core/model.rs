/*!
A `Model` is what `pricecast train` writes and `pricecast predict` reads: the fitted encoder state together with the fitted linear regressor.
*/

use crate::{engine::Engine, Error};
use anyhow::{format_err, Context, Result};
use pricecast_features::{EncodeOptions, EncoderState};
use pricecast_linear::LinearRegressor;
use std::{
	io::{Read, Write},
	path::Path,
};

/// The major version written at the start of every model file.
pub const MODEL_VERSION: u8 = 0;

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct Model {
	pub state: EncoderState,
	pub regressor: LinearRegressor,
}

impl Model {
	/// Take the state and regressor out of a trained engine.
	pub fn from_engine(engine: Engine<LinearRegressor>) -> Result<Model, Error> {
		let (regressor, state) = engine.into_parts();
		let state = state.ok_or(Error::NotTrained)?;
		Ok(Model { state, regressor })
	}

	/// Create a trained engine that encodes with `options`.
	pub fn into_engine(self, options: EncodeOptions) -> Engine<LinearRegressor> {
		Engine::with_state(self.regressor, self.state, options)
	}

	/// Deserialize a `Model` from a slice.
	pub fn from_slice(slice: &[u8]) -> Result<Self> {
		let major_version = *slice
			.first()
			.ok_or_else(|| format_err!("model is empty"))?;
		if major_version != MODEL_VERSION {
			return Err(format_err!("unknown major version {}", major_version));
		}
		let slice = &slice[1..];
		let model: Self = rmp_serde::from_slice(slice)?;
		Ok(model)
	}

	/// Serialize this model to a version byte followed by MessagePack.
	pub fn to_vec(&self) -> Result<Vec<u8>> {
		let mut bytes = vec![MODEL_VERSION];
		rmp_serde::encode::write_named(&mut bytes, self)?;
		Ok(bytes)
	}

	/// Deserialize a `Model` by reading the file at `path`.
	pub fn from_path(path: &Path) -> Result<Self> {
		let file = std::fs::File::open(path)
			.with_context(|| format!("failed to open model {}", path.display()))?;
		let mut reader = std::io::BufReader::new(file);
		let mut major_version = [0u8; 1];
		reader.read_exact(&mut major_version)?;
		let major_version = major_version[0];
		if major_version != MODEL_VERSION {
			return Err(format_err!("unknown major version {}", major_version));
		}
		let model: Model = rmp_serde::from_read(&mut reader)
			.with_context(|| format!("failed to read model {}", path.display()))?;
		Ok(model)
	}

	/// Write this model to the file at `path`.
	pub fn to_file(&self, path: &Path) -> Result<()> {
		let file = std::fs::File::create(path)
			.with_context(|| format!("failed to create {}", path.display()))?;
		let mut writer = std::io::BufWriter::new(file);
		writer.write_all(&[MODEL_VERSION])?;
		rmp_serde::encode::write_named(&mut writer, self)?;
		writer.flush()?;
		Ok(())
	}
}

#[test]
fn test_model_round_trip() {
	use pricecast_dataset::{Dataset, Value};
	use pricecast_linear::TrainOptions;
	let samples = (0..12)
		.map(|index| vec![Value::Number(index as f64), Value::from(["x", "y", "z"][index % 3])])
		.collect();
	let targets = (0..12).map(|index| 3.0 * index as f64).collect();
	let dataset = Dataset::new(vec!["size".to_owned(), "kind".to_owned()], samples, targets).unwrap();
	let options = TrainOptions {
		max_epochs: 50,
		early_stopping_options: None,
		..Default::default()
	};
	let mut engine = Engine::new(LinearRegressor::new(options), EncodeOptions::default());
	engine.train(&dataset).unwrap();
	let predictions = engine.predict(dataset.samples()).unwrap();
	let model = Model::from_engine(engine).unwrap();

	let bytes = model.to_vec().unwrap();
	let restored = Model::from_slice(&bytes).unwrap();
	assert_eq!(restored.state, model.state);
	assert_eq!(restored.regressor.weights, model.regressor.weights);
	let mut engine = restored.into_engine(EncodeOptions::default());
	assert_eq!(engine.predict(dataset.samples()).unwrap(), predictions);
}

#[test]
fn test_untrained_engine_has_no_model() {
	let engine = Engine::new(LinearRegressor::default(), EncodeOptions::default());
	assert!(matches!(Model::from_engine(engine), Err(Error::NotTrained)));
}

#[test]
fn test_unknown_version() {
	let error = Model::from_slice(&[3, 0x80]).unwrap_err();
	assert_eq!(error.to_string(), "unknown major version 3");
}
