/*!
This module decides what kind of feature a column is, from its [`ColumnStatistics`](../stats/struct.ColumnStatistics.html).

The uniqueness ratio approximates the average number of repeats per distinct value, divided by 100. A column whose values repeat a lot has few distinct classes and is categorical. A column whose values are nearly all distinct is continuous. Ties at a boundary go to the lower category.
*/

use crate::{
	policy::{CategorySplit, EncodingPolicy},
	stats::ColumnStatistics,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Category {
	#[serde(rename = "categorical")]
	Categorical,
	#[serde(rename = "short_variable")]
	ShortVariable,
	#[serde(rename = "continuous")]
	Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ValueKind {
	#[serde(rename = "numeric")]
	Numeric,
	#[serde(rename = "symbolic")]
	Symbolic,
}

impl std::fmt::Display for Category {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			Category::Categorical => "categorical",
			Category::ShortVariable => "short variable",
			Category::Continuous => "continuous",
		};
		write!(f, "{}", s)
	}
}

impl std::fmt::Display for ValueKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			ValueKind::Numeric => "numeric",
			ValueKind::Symbolic => "symbolic",
		};
		write!(f, "{}", s)
	}
}

/// Classify a column with the three-way split.
pub fn classify(
	stats: &ColumnStatistics,
	categorical_boundary: f64,
	limited_variable_boundary: f64,
) -> (Category, ValueKind) {
	let ratio = stats.uniqueness_ratio;
	let category = if ratio > categorical_boundary {
		Category::Categorical
	} else if ratio > limited_variable_boundary {
		Category::ShortVariable
	} else {
		Category::Continuous
	};
	(category, value_kind(stats))
}

fn value_kind(stats: &ColumnStatistics) -> ValueKind {
	if stats.is_all_numeric {
		ValueKind::Numeric
	} else {
		ValueKind::Symbolic
	}
}

impl EncodingPolicy {
	/// Classify a column with this policy's split and boundaries.
	pub fn classify(&self, stats: &ColumnStatistics) -> (Category, ValueKind) {
		match self.category_split {
			CategorySplit::ThreeWay => classify(
				stats,
				self.categorical_boundary,
				self.limited_variable_boundary,
			),
			CategorySplit::TwoWay => {
				let category = if stats.uniqueness_ratio > self.categorical_boundary {
					Category::Categorical
				} else {
					Category::Continuous
				};
				(category, value_kind(stats))
			}
		}
	}
}

#[cfg(test)]
fn stats_with_ratio(uniqueness_ratio: f64, is_all_numeric: bool) -> ColumnStatistics {
	ColumnStatistics {
		column_name: "column".to_owned(),
		value_frequency: Default::default(),
		first_appearance: Vec::new(),
		total_count: 0,
		unique_count: 0,
		uniqueness_ratio,
		is_all_numeric,
		median: None,
		correlation_with_target: 0.0,
	}
}

#[test]
fn test_three_way_split() {
	let category_of = |ratio| classify(&stats_with_ratio(ratio, true), 0.1, 0.05).0;
	assert_eq!(category_of(0.5), Category::Categorical);
	assert_eq!(category_of(0.11), Category::Categorical);
	assert_eq!(category_of(0.07), Category::ShortVariable);
	assert_eq!(category_of(0.02), Category::Continuous);
}

#[test]
fn test_boundary_ties_go_to_the_lower_category() {
	let policy = EncodingPolicy::default();
	assert_eq!(
		policy.classify(&stats_with_ratio(0.1, true)),
		(Category::ShortVariable, ValueKind::Numeric)
	);
	assert_eq!(
		policy.classify(&stats_with_ratio(0.05, false)),
		(Category::Continuous, ValueKind::Symbolic)
	);
	let legacy = EncodingPolicy::legacy();
	assert_eq!(
		legacy.classify(&stats_with_ratio(0.1, true)).0,
		Category::Continuous
	);
}

#[test]
fn test_two_way_split() {
	let policy = EncodingPolicy::legacy();
	assert_eq!(
		policy.classify(&stats_with_ratio(0.2, false)),
		(Category::Categorical, ValueKind::Symbolic)
	);
	assert_eq!(
		policy.classify(&stats_with_ratio(0.07, true)),
		(Category::Continuous, ValueKind::Numeric)
	);
}

#[cfg(test)]
proptest::proptest! {
	#[test]
	fn test_classification_is_deterministic(
		ratio in 0.0f64..2.0,
		categorical_boundary in 0.0f64..1.0,
		limited_variable_boundary in 0.0f64..1.0,
		is_all_numeric in proptest::bool::ANY,
	) {
		let stats = stats_with_ratio(ratio, is_all_numeric);
		let first = classify(&stats, categorical_boundary, limited_variable_boundary);
		for _ in 0..8 {
			proptest::prop_assert_eq!(
				classify(&stats, categorical_boundary, limited_variable_boundary),
				first
			);
		}
		if ratio > categorical_boundary {
			proptest::prop_assert_eq!(first.0, Category::Categorical);
		}
	}
}
