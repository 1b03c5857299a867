//! This module contains the main entrypoint to the pricecast cli.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use pricecast_core::{Config, Engine, Model};
use pricecast_dataset::{
	load::{read_named_columns, read_rows, FromCsvOptions, TargetColumn, DEFAULT_INVALID_VALUES},
	Dataset, Row,
};
use pricecast_features::{EncoderState, InvalidValues, UnseenSymbols};
use pricecast_linear::LinearRegressor;
use std::{
	io::Write,
	path::{Path, PathBuf},
};

mod logging;

#[derive(Parser, Debug)]
#[command(
	name = "pricecast",
	about = "Infer feature types from a csv file, encode them and predict prices.",
	disable_help_subcommand = true
)]
struct Args {
	/// Print more log output. Repeat for more detail. `RUST_LOG` overrides this.
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Train a model from a csv file.
	Train(Box<TrainArgs>),
	/// Predict a price for every row of a csv file.
	Predict(Box<PredictArgs>),
}

#[derive(clap::Args, Debug)]
struct TrainArgs {
	/// The path to your .csv file.
	#[arg(short, long)]
	file: PathBuf,
	/// The number of leading feature columns. The column right after them is the target.
	#[arg(long, conflicts_with = "target")]
	features: Option<usize>,
	/// The name of the column to predict. Defaults to the last column.
	#[arg(short, long)]
	target: Option<String>,
	/// The path to a config file.
	#[arg(short, long)]
	config: Option<PathBuf>,
	/// The path to write the .pricecast file to.
	#[arg(short, long)]
	output: Option<PathBuf>,
	/// Also write the encoder state as json to this path.
	#[arg(long)]
	state: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct PredictArgs {
	/// The path to a .pricecast file written by `pricecast train`.
	#[arg(short, long)]
	model: PathBuf,
	/// The path to the .csv file with the rows to predict.
	#[arg(short, long)]
	file: PathBuf,
	/// Read the first `n` columns by position. By default, columns are matched to the trained columns by name.
	#[arg(long)]
	features: Option<usize>,
	/// The path to a config file.
	#[arg(short, long)]
	config: Option<PathBuf>,
	/// Fail on values that were not seen in training instead of assigning them new codes.
	#[arg(long, conflicts_with = "update_model")]
	read_only: bool,
	/// Fail on invalid values instead of encoding them as zero.
	#[arg(long)]
	strict: bool,
	/// Write symbols first seen in this file back to the model file.
	#[arg(long)]
	update_model: bool,
}

fn main() {
	let args = Args::parse();
	logging::init_logging(args.verbose);
	let result = match args.command {
		Command::Train(args) => cli_train(*args),
		Command::Predict(args) => cli_predict(*args),
	};
	if let Err(error) = result {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn cli_train(args: TrainArgs) -> Result<()> {
	let config = load_config(args.config.as_deref())?;

	// Load the dataset.
	let target_column = match (args.features, args.target) {
		(Some(n_features), _) => TargetColumn::AfterFeatures(n_features),
		(None, Some(target)) => TargetColumn::Named(target),
		(None, None) => TargetColumn::Last,
	};
	let dataset = Dataset::from_path(
		&args.file,
		FromCsvOptions {
			target_column,
			..Default::default()
		},
	)?;

	// Train the engine.
	let regressor = LinearRegressor::new(config.linear_train_options());
	let mut engine =
		Engine::new(regressor, config.encode_options()).with_policy(config.encoding_policy());
	let state = engine.train(&dataset)?;
	if let Some(state_path) = args.state.as_ref() {
		std::fs::write(state_path, state.to_json()?)
			.with_context(|| format!("failed to write {}", state_path.display()))?;
	}
	let model = Model::from_engine(engine)?;

	// Retrieve the output path from the command line arguments or generate a default.
	let output_path = match args.output {
		Some(output) => output,
		None => {
			let dir = std::env::current_dir()?;
			let csv_file_name = args
				.file
				.file_stem()
				.and_then(|file_stem| file_stem.to_str())
				.unwrap_or("model");
			available_path(&dir, csv_file_name, "pricecast")?
		}
	};
	model.to_file(&output_path)?;
	eprintln!("Your model was written to {}.", output_path.display());
	Ok(())
}

fn cli_predict(args: PredictArgs) -> Result<()> {
	let config = load_config(args.config.as_deref())?;
	let model = Model::from_path(&args.model)?;
	let mut options = config.encode_options();
	if args.read_only {
		options.unseen_symbols = UnseenSymbols::Reject;
	}
	if args.strict {
		options.invalid_values = InvalidValues::Strict;
	}
	let mut reader = csv::Reader::from_path(&args.file)
		.with_context(|| format!("failed to open csv file {}", args.file.display()))?;
	let rows = read_predict_rows(&mut reader, &model.state, args.features)
		.with_context(|| format!("failed to read rows from {}", args.file.display()))?;

	let mut engine = model.into_engine(options);
	let predictions = engine.predict(&rows)?;
	let stdout = std::io::stdout();
	let mut stdout = stdout.lock();
	for prediction in predictions.iter() {
		writeln!(stdout, "{}", prediction)?;
	}

	if args.update_model {
		Model::from_engine(engine)?.to_file(&args.model)?;
	}
	Ok(())
}

/// Read the rows to predict. Columns are matched to the trained columns by name, so the target and any other extra columns are skipped. If `n_features` is given, the first `n_features` columns are read by position instead.
fn read_predict_rows<R>(
	reader: &mut csv::Reader<R>,
	state: &EncoderState,
	n_features: Option<usize>,
) -> Result<Vec<Row>>
where
	R: std::io::Read,
{
	match n_features {
		Some(n_features) => {
			let (_, rows) = read_rows(reader, Some(n_features), DEFAULT_INVALID_VALUES)?;
			Ok(rows)
		}
		None => {
			let column_names: Vec<String> = state
				.columns
				.iter()
				.map(|column| column.column_name.clone())
				.collect();
			read_named_columns(reader, &column_names, DEFAULT_INVALID_VALUES)
		}
	}
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
	match config_path {
		Some(config_path) => Config::from_path(config_path),
		None => Ok(Config::default()),
	}
}

fn available_path(dir: &Path, name: &str, extension: &str) -> Result<PathBuf> {
	let mut i = 0;
	loop {
		let mut path = PathBuf::from(dir);
		let mut filename = String::new();
		filename.push_str(name);
		if i > 0 {
			filename.push(' ');
			filename.push_str(&i.to_string());
		}
		filename.push('.');
		filename.push_str(extension);
		path.push(filename);
		match std::fs::metadata(&path) {
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
				return Ok(path);
			}
			Err(error) => return Err(error.into()),
			Ok(_) => {
				i += 1;
				continue;
			}
		}
	}
}

#[test]
fn test_args() {
	use clap::CommandFactory;
	Args::command().debug_assert();
	let args = Args::try_parse_from(&[
		"pricecast",
		"predict",
		"--model",
		"houses.pricecast",
		"--file",
		"houses.csv",
		"--read-only",
		"-vv",
	])
	.unwrap();
	assert_eq!(args.verbose, 2);
	match args.command {
		Command::Predict(args) => {
			assert!(args.read_only);
			assert!(!args.update_model);
			assert_eq!(args.features, None);
		}
		Command::Train(_) => panic!("expected predict"),
	}
	let conflicting = Args::try_parse_from(&[
		"pricecast",
		"predict",
		"--model",
		"m",
		"--file",
		"f",
		"--read-only",
		"--update-model",
	]);
	assert!(conflicting.is_err());
	let conflicting = Args::try_parse_from(&[
		"pricecast", "train", "--file", "f", "--features", "3", "--target", "price",
	]);
	assert!(conflicting.is_err());
}

#[test]
fn test_predict_rows_match_trained_columns() {
	use pricecast_features::EncodeOptions;
	let csv = "price,rooms,district\n100,3,north\n180,5,south\n120,3,north\n260,7,east\n";
	let dataset = Dataset::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			target_column: TargetColumn::Named("price".to_owned()),
			..Default::default()
		},
	)
	.unwrap();
	let mut engine = Engine::new(
		LinearRegressor::new(pricecast_linear::TrainOptions::default()),
		EncodeOptions::default(),
	);
	engine.train(&dataset).unwrap();
	let model = Model::from_engine(engine).unwrap();
	let read_only = EncodeOptions {
		unseen_symbols: UnseenSymbols::Reject,
		..EncodeOptions::default()
	};
	let expected = model
		.clone()
		.into_engine(read_only)
		.predict(dataset.samples())
		.unwrap();

	let rows = read_predict_rows(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		&model.state,
		None,
	)
	.unwrap();
	assert_eq!(rows, dataset.samples());
	let mut engine = model.clone().into_engine(read_only);
	let predictions = engine.predict(&rows).unwrap();
	assert_eq!(predictions.len(), 4);
	assert!(predictions
		.iter()
		.zip(expected.iter())
		.all(|(prediction, expected)| prediction.to_bits() == expected.to_bits()));
	assert_eq!(engine.state(), Some(&model.state));

	let without_district = "price,rooms\n100,3\n";
	assert!(read_predict_rows(
		&mut csv::Reader::from_reader(std::io::Cursor::new(without_district)),
		&model.state,
		None,
	)
	.is_err());
}
