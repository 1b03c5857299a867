use super::Metric;

/// The median is the middle value of the sorted input, or the mean of the two middle values when the input has an even length.
pub struct Median;

impl<'a> Metric<'a> for Median {
	type Input = &'a [f64];
	type Output = Option<f64>;

	fn compute(input: Self::Input) -> Self::Output {
		if input.is_empty() {
			return None;
		}
		let mut values = input.to_owned();
		values.sort_by(|a, b| a.total_cmp(b));
		let middle = values.len() / 2;
		if values.len() % 2 == 0 {
			Some((values[middle - 1] + values[middle]) / 2.0)
		} else {
			Some(values[middle])
		}
	}
}

#[test]
fn test_median() {
	assert_eq!(Median::compute(&[]), None);
	assert_eq!(Median::compute(&[7.0]), Some(7.0));
	assert_eq!(Median::compute(&[0.0, 0.0, 0.0, 9.0]), Some(0.0));
	assert_eq!(Median::compute(&[10.0, -2.0, 4.0, 3.0, 8.0]), Some(4.0));
}
