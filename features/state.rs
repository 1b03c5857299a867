use crate::{
	encoder::TransformSpec,
	policy::{EncodeOptions, EncodingPolicy, UnseenSymbols},
	stats::ColumnStatistics,
	Error,
};
use anyhow::{format_err, Context, Result};
use itertools::izip;
use ndarray::prelude::*;
use pricecast_dataset::{Dataset, Row};
use rayon::prelude::*;
use std::{
	io::{Read, Write},
	path::Path,
};

/// The major version written at the start of every serialized `EncoderState`.
pub const FORMAT_VERSION: u8 = 0;

/**
An `EncoderState` holds everything needed to encode rows the same way they were encoded in training: the policy that produced it and one [`TransformSpec`](../encoder/struct.TransformSpec.html) per column, indexed by column.

It is plain data. Write it with [`to_file`](#method.to_file) or [`to_json`](#method.to_json) after training and read it back before predicting in another process.
*/
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EncoderState {
	pub format_version: u8,
	pub policy: EncodingPolicy,
	pub columns: Vec<TransformSpec>,
}

impl EncoderState {
	/// Compute the statistics of every column of `dataset` and derive its transform. Columns are processed in parallel.
	pub fn fit(dataset: &Dataset, policy: &EncodingPolicy) -> Result<EncoderState, Error> {
		if dataset.n_columns() == 0 {
			return Err(Error::NoColumns);
		}
		let column_names = dataset.column_names();
		let targets = dataset.targets();
		let columns = (0..dataset.n_columns())
			.into_par_iter()
			.map(|index| {
				let values = dataset.column(index);
				let stats = ColumnStatistics::compute(&column_names[index], &values, targets, policy)?;
				Ok(TransformSpec::derive(&stats, policy))
			})
			.collect::<Result<Vec<_>, Error>>()?;
		Ok(EncoderState {
			format_version: FORMAT_VERSION,
			policy: policy.clone(),
			columns,
		})
	}

	pub fn n_columns(&self) -> usize {
		self.columns.len()
	}

	/// Encode `rows` into a matrix with one row per input row and one column per trained column.
	///
	/// With [`UnseenSymbols::Extend`](../policy/enum.UnseenSymbols.html), unseen symbols are added to the symbol tables. The tables are only updated if the whole batch encodes successfully. With `UnseenSymbols::Reject` this is the same as [`encode_rows_frozen`](#method.encode_rows_frozen).
	pub fn encode_rows(&mut self, rows: &[Row], options: &EncodeOptions) -> Result<Array2<f64>, Error> {
		if options.unseen_symbols == UnseenSymbols::Reject {
			return self.encode_rows_frozen(rows, options);
		}
		self.check_widths(rows)?;
		tracing::info!(
			rows = rows.len(),
			columns = self.n_columns(),
			unseen_symbols = ?options.unseen_symbols,
			invalid_values = ?options.invalid_values,
			"encoding rows"
		);
		let mut columns = self.columns.clone();
		let mut features = Array2::zeros((rows.len(), columns.len()));
		for (row, mut features) in izip!(rows.iter(), features.axis_iter_mut(Axis(0))) {
			for (spec, value, feature) in izip!(columns.iter_mut(), row.iter(), features.iter_mut()) {
				*feature = spec.encode(value, &self.policy, options)?;
			}
		}
		let n_new_symbols: usize = izip!(columns.iter(), self.columns.iter())
			.map(|(new, old)| new.symbol_table.len() - old.symbol_table.len())
			.sum();
		if n_new_symbols > 0 {
			tracing::info!(n_new_symbols, "extended symbol tables");
		}
		self.columns = columns;
		Ok(features)
	}

	/// Encode `rows` without modifying this state. Rows are encoded in parallel and unseen symbols are rejected.
	pub fn encode_rows_frozen(&self, rows: &[Row], options: &EncodeOptions) -> Result<Array2<f64>, Error> {
		self.check_widths(rows)?;
		tracing::info!(
			rows = rows.len(),
			columns = self.n_columns(),
			invalid_values = ?options.invalid_values,
			"encoding rows with frozen symbol tables"
		);
		let mut features = Array2::zeros((rows.len(), self.n_columns()));
		features
			.axis_iter_mut(Axis(0))
			.into_par_iter()
			.zip(rows.par_iter())
			.try_for_each(|(mut features, row)| -> Result<(), Error> {
				for (spec, value, feature) in izip!(self.columns.iter(), row.iter(), features.iter_mut()) {
					*feature = spec.encode_frozen(value, &self.policy, options)?;
				}
				Ok(())
			})?;
		Ok(features)
	}

	fn check_widths(&self, rows: &[Row]) -> Result<(), Error> {
		let expected = self.n_columns();
		match rows.iter().position(|row| row.len() != expected) {
			Some(row) => Err(Error::ColumnCountMismatch {
				row,
				expected,
				actual: rows[row].len(),
			}),
			None => Ok(()),
		}
	}

	/// Serialize this state to a JSON document.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	/// Deserialize a state from a JSON document written by [`to_json`](#method.to_json).
	pub fn from_json(json: &str) -> Result<Self> {
		let state: Self = serde_json::from_str(json)?;
		if state.format_version != FORMAT_VERSION {
			return Err(format_err!("unknown major version {}", state.format_version));
		}
		Ok(state)
	}

	/// Deserialize a state from a slice holding a version byte followed by MessagePack.
	pub fn from_slice(slice: &[u8]) -> Result<Self> {
		let major_version = *slice
			.first()
			.ok_or_else(|| format_err!("encoder state is empty"))?;
		if major_version != FORMAT_VERSION {
			return Err(format_err!("unknown major version {}", major_version));
		}
		let state: Self = rmp_serde::from_slice(&slice[1..])?;
		Ok(state)
	}

	/// Serialize this state to a version byte followed by MessagePack.
	pub fn to_vec(&self) -> Result<Vec<u8>> {
		let mut bytes = vec![FORMAT_VERSION];
		rmp_serde::encode::write_named(&mut bytes, self)?;
		Ok(bytes)
	}

	/// Deserialize a state by reading the file at `path`.
	pub fn from_path(path: &Path) -> Result<Self> {
		let file = std::fs::File::open(path)
			.with_context(|| format!("failed to open encoder state {}", path.display()))?;
		let mut reader = std::io::BufReader::new(file);
		let mut major_version = [0u8; 1];
		reader.read_exact(&mut major_version)?;
		let major_version = major_version[0];
		if major_version != FORMAT_VERSION {
			return Err(format_err!("unknown major version {}", major_version));
		}
		let state: Self = rmp_serde::from_read(&mut reader)
			.with_context(|| format!("failed to read encoder state {}", path.display()))?;
		Ok(state)
	}

	/// Write this state to the file at `path`.
	pub fn to_file(&self, path: &Path) -> Result<()> {
		let file = std::fs::File::create(path)
			.with_context(|| format!("failed to create {}", path.display()))?;
		let mut writer = std::io::BufWriter::new(file);
		writer.write_all(&[FORMAT_VERSION])?;
		rmp_serde::encode::write_named(&mut writer, self)?;
		writer.flush()?;
		Ok(())
	}
}

#[cfg(test)]
fn housing() -> Dataset {
	use pricecast_dataset::Value;
	let districts = ["north", "north", "south", "north", "east", "south", "north", "north"];
	let samples = (0..8)
		.map(|index| {
			vec![
				Value::Number((index % 4 + 1) as f64),
				Value::from(districts[index]),
				Value::Number(40.0 + 7.0 * index as f64),
			]
		})
		.collect();
	let targets = (0..8).map(|index| 100.0 + 10.0 * index as f64).collect();
	Dataset::new(
		vec!["rooms".to_owned(), "district".to_owned(), "area".to_owned()],
		samples,
		targets,
	)
	.unwrap()
}

#[test]
fn test_fit() {
	use crate::classify::{Category, ValueKind};
	let state = EncoderState::fit(&housing(), &EncodingPolicy::default()).unwrap();
	assert_eq!(state.n_columns(), 3);
	let kinds: Vec<(&str, Category, ValueKind)> = state
		.columns
		.iter()
		.map(|spec| (spec.column_name.as_str(), spec.category, spec.value_kind))
		.collect();
	assert_eq!(
		kinds,
		vec![
			("rooms", Category::Continuous, ValueKind::Numeric),
			("district", Category::Continuous, ValueKind::Symbolic),
			("area", Category::Continuous, ValueKind::Numeric),
		]
	);
	assert_eq!(state.columns[0].scale_reference, 2.5);
	assert_eq!(state.columns[1].scale_reference, 3.0f64.sqrt());
	assert_eq!(state.columns[1].symbol_table.len(), 3);
}

#[test]
fn test_fit_with_boundaries() {
	use crate::classify::Category;
	// With 8 rows, "rooms" has 4 distinct values and a ratio of 0.02, and "district" has 3 and a ratio of 0.03.
	let policy = EncodingPolicy::default().with_boundaries(0.02, 0.01);
	let state = EncoderState::fit(&housing(), &policy).unwrap();
	assert_eq!(state.columns[0].category, Category::ShortVariable);
	assert_eq!(state.columns[1].category, Category::Categorical);
	assert_eq!(state.columns[2].category, Category::Continuous);
}

#[test]
fn test_fit_requires_data() {
	let dataset = Dataset::from_samples(vec![], vec![]).unwrap();
	assert_eq!(
		EncoderState::fit(&dataset, &EncodingPolicy::default()),
		Err(Error::NoColumns)
	);
	let dataset = Dataset::from_samples(vec![vec![1.0.into()]], vec![1.0]).unwrap();
	assert!(matches!(
		EncoderState::fit(&dataset, &EncodingPolicy::default()),
		Err(Error::InsufficientData { .. })
	));
}

#[test]
fn test_encode_rows_is_all_or_nothing() {
	use crate::policy::InvalidValues;
	use pricecast_dataset::Value;
	let mut state = EncoderState::fit(&housing(), &EncodingPolicy::default()).unwrap();
	let before = state.clone();
	let strict = EncodeOptions {
		invalid_values: InvalidValues::Strict,
		..EncodeOptions::default()
	};
	let rows = vec![
		vec![Value::Number(2.0), Value::from("west"), Value::Number(60.0)],
		vec![Value::Number(-1.0), Value::from("north"), Value::Number(60.0)],
	];
	assert_eq!(
		state.encode_rows(&rows, &strict),
		Err(Error::InvalidValue {
			column: "rooms".to_owned(),
			value: "-1".to_owned(),
		})
	);
	assert_eq!(state, before);

	let short = vec![vec![Value::Number(2.0)]];
	assert_eq!(
		state.encode_rows(&short, &EncodeOptions::default()),
		Err(Error::ColumnCountMismatch {
			row: 0,
			expected: 3,
			actual: 1,
		})
	);
}

#[test]
fn test_frozen_and_extending_encodings_agree() {
	use pricecast_dataset::Value;
	let dataset = housing();
	let mut state = EncoderState::fit(&dataset, &EncodingPolicy::default()).unwrap();
	let frozen = state
		.encode_rows_frozen(dataset.samples(), &EncodeOptions::default())
		.unwrap();
	let extending = state
		.encode_rows(dataset.samples(), &EncodeOptions::default())
		.unwrap();
	assert_eq!(frozen, extending);
	assert_eq!(frozen.dim(), (8, 3));

	let unseen = vec![vec![Value::Number(2.0), Value::from("west"), Value::Missing]];
	assert_eq!(
		state.encode_rows_frozen(&unseen, &EncodeOptions::default()),
		Err(Error::UnseenSymbol {
			column: "district".to_owned(),
			value: "west".to_owned(),
		})
	);
	let encoded = state
		.encode_rows(&unseen, &EncodeOptions::default())
		.unwrap();
	assert!(encoded.iter().all(|value| value.is_finite()));
	assert_eq!(encoded[[0, 2]], crate::encoder::EPSILON);
	assert!(state.columns[1].symbol_table.contains_key("west"));
}

#[test]
fn test_persistence() {
	let state = EncoderState::fit(&housing(), &EncodingPolicy::legacy()).unwrap();
	let json = state.to_json().unwrap();
	assert_eq!(EncoderState::from_json(&json).unwrap(), state);
	let bytes = state.to_vec().unwrap();
	assert_eq!(bytes[0], FORMAT_VERSION);
	assert_eq!(EncoderState::from_slice(&bytes).unwrap(), state);
	let mut unknown = bytes;
	unknown[0] = 7;
	assert_eq!(
		EncoderState::from_slice(&unknown).unwrap_err().to_string(),
		"unknown major version 7"
	);
	assert!(EncoderState::from_slice(&[]).is_err());
}

#[test]
fn test_json_document() {
	let dataset = Dataset::from_samples(
		vec![
			vec!["a".into()],
			vec!["a".into()],
			vec!["b".into()],
			vec![pricecast_dataset::Value::Missing],
		],
		vec![1.0, 1.0, 2.0, 3.0],
	)
	.unwrap();
	let state = EncoderState::fit(&dataset, &EncodingPolicy::legacy()).unwrap();
	let json: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
	insta::assert_debug_snapshot!(json["columns"][0]["symbol_table"].as_object().map(|table| table.keys().collect::<Vec<_>>()), @r###"
 Some(
     [
         "0",
         "a",
         "b",
     ],
 )
 "###);
	assert_eq!(json["columns"][0]["category"], "continuous");
	assert_eq!(json["columns"][0]["value_kind"], "symbolic");
	assert_eq!(json["policy"]["category_split"], "two_way");
}
