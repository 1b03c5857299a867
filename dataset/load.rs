use super::*;
use anyhow::{format_err, Context, Result};
use std::path::Path;

#[derive(Clone, Debug)]
pub struct FromCsvOptions<'a> {
	pub target_column: TargetColumn,
	pub invalid_values: &'a [&'a str],
}

impl<'a> Default for FromCsvOptions<'a> {
	fn default() -> Self {
		Self {
			target_column: TargetColumn::Last,
			invalid_values: DEFAULT_INVALID_VALUES,
		}
	}
}

/// This enum describes which csv column holds the targets. Every other column is a feature column.
#[derive(Clone, Debug, PartialEq)]
pub enum TargetColumn {
	/// The first `n` columns are features and the column right after them is the target. Any columns after the target are ignored.
	AfterFeatures(usize),
	/// The column with this header is the target.
	Named(String),
	/// The last column is the target.
	Last,
}

/// These values are the default values that are considered missing.
pub const DEFAULT_INVALID_VALUES: &[&str] = &[
	"", "null", "NULL", "n/a", "N/A", "nan", "-nan", "NaN", "-NaN", "?",
];

impl Dataset {
	pub fn from_path(path: &Path, options: FromCsvOptions) -> Result<Self> {
		let mut reader = csv::Reader::from_path(path)
			.with_context(|| format!("failed to open csv file {}", path.display()))?;
		Self::from_csv(&mut reader, options)
			.with_context(|| format!("failed to load dataset from {}", path.display()))
	}

	pub fn from_csv<R>(reader: &mut csv::Reader<R>, options: FromCsvOptions) -> Result<Self>
	where
		R: std::io::Read,
	{
		let headers: Vec<String> = reader
			.headers()?
			.iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		let target_index = match &options.target_column {
			TargetColumn::AfterFeatures(n_features) => *n_features,
			TargetColumn::Named(name) => headers
				.iter()
				.position(|column_name| column_name == name)
				.ok_or_else(|| {
					format_err!(
						"did not find target column \"{}\" among column names \"{}\"",
						name,
						headers.join(", ")
					)
				})?,
			TargetColumn::Last => headers
				.len()
				.checked_sub(1)
				.ok_or_else(|| format_err!("csv has no columns"))?,
		};
		if target_index >= headers.len() {
			return Err(format_err!(
				"target column index {} is out of range for {} columns",
				target_index,
				headers.len()
			));
		}
		// Columns past the target are only dropped when the feature count was declared.
		let is_feature = |index: usize| match options.target_column {
			TargetColumn::AfterFeatures(n_features) => index < n_features,
			_ => index != target_index,
		};
		let column_names = headers
			.iter()
			.enumerate()
			.filter(|(index, _)| is_feature(*index))
			.map(|(_, column_name)| column_name.clone())
			.collect();
		let mut samples = Vec::new();
		let mut targets = Vec::new();
		let mut record = csv::ByteRecord::new();
		while reader.read_byte_record(&mut record)? {
			let row = samples.len() + 1;
			let target = record
				.get(target_index)
				.ok_or_else(|| format_err!("row {} has no target value", row))?;
			let target = parse_finite(target).ok_or_else(|| {
				format_err!(
					"row {} has invalid target value \"{}\"",
					row,
					String::from_utf8_lossy(target)
				)
			})?;
			let sample = record
				.iter()
				.enumerate()
				.filter(|(index, _)| is_feature(*index))
				.map(|(_, value)| parse_value(value, options.invalid_values))
				.collect::<Result<Row>>()?;
			samples.push(sample);
			targets.push(target);
		}
		Ok(Dataset::new(column_names, samples, targets)?)
	}
}

/// Read the rows of a csv file that has no target column, or whose trailing columns should be ignored. If `n_features` is `Some(n)`, only the first `n` columns are read.
pub fn read_rows<R>(
	reader: &mut csv::Reader<R>,
	n_features: Option<usize>,
	invalid_values: &[&str],
) -> Result<(Vec<String>, Vec<Row>)>
where
	R: std::io::Read,
{
	let headers = reader.headers()?;
	let n_columns = n_features.unwrap_or_else(|| headers.len()).min(headers.len());
	let column_names = headers
		.iter()
		.take(n_columns)
		.map(|column_name| column_name.to_owned())
		.collect();
	let mut rows = Vec::new();
	let mut record = csv::ByteRecord::new();
	while reader.read_byte_record(&mut record)? {
		let row = record
			.iter()
			.take(n_columns)
			.map(|value| parse_value(value, invalid_values))
			.collect::<Result<Row>>()?;
		rows.push(row);
	}
	Ok((column_names, rows))
}

/// Read the columns named `column_names` from a csv file, in the order of `column_names`. Other columns, such as the target, are skipped. It is an error if the csv does not have one of the columns.
pub fn read_named_columns<R>(
	reader: &mut csv::Reader<R>,
	column_names: &[String],
	invalid_values: &[&str],
) -> Result<Vec<Row>>
where
	R: std::io::Read,
{
	let headers: Vec<String> = reader
		.headers()?
		.iter()
		.map(|column_name| column_name.to_owned())
		.collect();
	let indexes = column_names
		.iter()
		.map(|name| {
			headers
				.iter()
				.position(|column_name| column_name == name)
				.ok_or_else(|| {
					format_err!(
						"did not find column \"{}\" among column names \"{}\"",
						name,
						headers.join(", ")
					)
				})
		})
		.collect::<Result<Vec<usize>>>()?;
	let mut rows = Vec::new();
	let mut record = csv::ByteRecord::new();
	while reader.read_byte_record(&mut record)? {
		let row = rows.len() + 1;
		let values = indexes
			.iter()
			.map(|index| {
				let value = record
					.get(*index)
					.ok_or_else(|| format_err!("row {} has no value in column {}", row, index))?;
				parse_value(value, invalid_values)
			})
			.collect::<Result<Row>>()?;
		rows.push(values);
	}
	Ok(rows)
}

fn parse_value(value: &[u8], invalid_values: &[&str]) -> Result<Value> {
	let value = std::str::from_utf8(value)?;
	if invalid_values.contains(&value) {
		return Ok(Value::Missing);
	}
	Ok(match parse_finite(value.as_bytes()) {
		Some(value) => Value::Number(value),
		None => Value::Text(value.to_owned()),
	})
}

#[test]
fn test_from_csv() {
	let csv = r#"rooms,district,garage,price
3,north,,250000
2,south,yes,180000.5
4,north,n/a,320000
"#;
	let dataset = Dataset::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions::default(),
	)
	.unwrap();
	insta::assert_debug_snapshot!(dataset, @r###"
 Dataset {
     column_names: [
         "rooms",
         "district",
         "garage",
     ],
     samples: [
         [
             Number(
                 3.0,
             ),
             Text(
                 "north",
             ),
             Missing,
         ],
         [
             Number(
                 2.0,
             ),
             Text(
                 "south",
             ),
             Text(
                 "yes",
             ),
         ],
         [
             Number(
                 4.0,
             ),
             Text(
                 "north",
             ),
             Missing,
         ],
     ],
     targets: [
         250000.0,
         180000.5,
         320000.0,
     ],
 }
 "###);
}

#[test]
fn test_target_column() {
	let csv = r#"price,rooms,district,notes
100,3,north,x
200,2,south,y
"#;
	let named = Dataset::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			target_column: TargetColumn::Named("price".to_owned()),
			..Default::default()
		},
	)
	.unwrap();
	assert_eq!(named.column_names(), &["rooms", "district", "notes"]);
	assert_eq!(named.targets(), &[100.0, 200.0]);

	let declared = Dataset::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			target_column: TargetColumn::AfterFeatures(1),
			..Default::default()
		},
	)
	.unwrap();
	assert_eq!(declared.column_names(), &["price"]);
	assert_eq!(declared.targets(), &[3.0, 2.0]);

	let missing = Dataset::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			target_column: TargetColumn::Named("area".to_owned()),
			..Default::default()
		},
	);
	assert!(missing.is_err());
}

#[test]
fn test_invalid_target() {
	let csv = "rooms,price\n3,cheap\n";
	let result = Dataset::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions::default(),
	);
	let message = result.unwrap_err().to_string();
	assert_eq!(message, "row 1 has invalid target value \"cheap\"");
}

#[test]
fn test_read_rows() {
	let csv = "rooms,district,price\n3,north,100\n,south,200\n";
	let (column_names, rows) = read_rows(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		Some(2),
		DEFAULT_INVALID_VALUES,
	)
	.unwrap();
	assert_eq!(column_names, vec!["rooms", "district"]);
	assert_eq!(
		rows,
		vec![
			vec![Value::Number(3.0), Value::from("north")],
			vec![Value::Missing, Value::from("south")],
		]
	);
}

#[test]
fn test_read_named_columns() {
	let csv = "price,rooms,district\n100,3,north\n200,,south\n";
	let dataset = Dataset::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			target_column: TargetColumn::Named("price".to_owned()),
			..Default::default()
		},
	)
	.unwrap();
	let rows = read_named_columns(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		dataset.column_names(),
		DEFAULT_INVALID_VALUES,
	)
	.unwrap();
	assert_eq!(rows, dataset.samples());

	let reordered = "district,rooms\neast,5\n";
	let rows = read_named_columns(
		&mut csv::Reader::from_reader(std::io::Cursor::new(reordered)),
		dataset.column_names(),
		DEFAULT_INVALID_VALUES,
	)
	.unwrap();
	assert_eq!(rows, vec![vec![Value::Number(5.0), Value::from("east")]]);

	let missing = read_named_columns(
		&mut csv::Reader::from_reader(std::io::Cursor::new("price,rooms\n100,3\n")),
		dataset.column_names(),
		DEFAULT_INVALID_VALUES,
	);
	assert_eq!(
		missing.unwrap_err().to_string(),
		"did not find column \"district\" among column names \"price, rooms\""
	);
}
