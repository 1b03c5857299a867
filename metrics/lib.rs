/*!
This crate defines the [`Metric`](trait.Metric.html) and [`StreamingMetric`](trait.StreamingMetric.html) traits and the statistics the encoding engine consumes: [`Mean`](struct.Mean.html), [`Median`](struct.Median.html), [`Pearson`](struct.Pearson.html) and [`MeanSquaredError`](struct.MeanSquaredError.html).

The free functions [`mean`](fn.mean.html), [`median`](fn.median.html) and [`pearson`](fn.pearson.html) compute a statistic over a whole slice at once. They return `None` when the statistic is undefined for the input, for example the mean of an empty slice or the correlation of a constant column.
*/

mod mean;
mod mean_squared_error;
mod mean_variance;
mod median;
mod pearson;

pub use self::mean::Mean;
pub use self::mean_squared_error::MeanSquaredError;
pub use self::mean_variance::merge_mean_m2;
pub use self::median::Median;
pub use self::pearson::{Pearson, PearsonInput};

/**
The `Metric` trait defines a common interface to metrics that can be computed when the entire input is available at once.

The seemingly unused generic lifetime `'a` exists here to allow `Input`s and `Output`s to borrow from their enclosing scope.
*/
pub trait Metric<'a> {
	type Input;
	type Output;
	fn compute(input: Self::Input) -> Self::Output;
}

/**
The `StreamingMetric` trait defines a common interface to metrics that can be computed in a streaming manner, where the input is available in chunks, such as the mean or the Pearson correlation.

After being initialized, a value of type `T` implementing the `StreamingMetric` trait can have `update()` called on it with values of the associated type `Input`. Multiple values of `T` can be merged together by calling `merge()`. This is useful when computing a metric across multiple threads. When finished aggregating, you can call `finalize()` on the metric to produce the associated type `Output`.

# Examples

Here is a basic example implementation of a `Max` metric, which takes `f64`s as input and produces an `f64` as output that is the maximum of all the inputs.

```
use pricecast_metrics::StreamingMetric;

struct Max(f64);

impl StreamingMetric<'_> for Max {
	type Input = f64;
	type Output = f64;
	fn update(&mut self, input: Self::Input) {
		self.0 = self.0.max(input)
	}
	fn merge(&mut self, other: Self) { self.0 = self.0.max(other.0) }
	fn finalize(self) -> Self::Output { self.0 }
}
```
*/
pub trait StreamingMetric<'a> {
	/// `Input` is the type to aggregate in calls to `update()`.
	type Input;
	/// `Output` is the return type of `finalize()`.
	type Output;
	/// Update this streaming metric with the `Input` `input`.
	fn update(&mut self, input: Self::Input);
	/// Merge multiple independently computed streaming metrics.
	fn merge(&mut self, other: Self);
	/// When you are done aggregating `Input`s, call `finalize()` to produce an `Output`.
	fn finalize(self) -> Self::Output;
}

/// Compute the arithmetic mean of `values`. Returns `None` if `values` is empty.
pub fn mean(values: &[f64]) -> Option<f64> {
	let mut metric = Mean::default();
	for value in values.iter() {
		metric.update(*value);
	}
	metric.finalize()
}

/// Compute the median of `values`. For an even number of values, this is the mean of the two middle values. Returns `None` if `values` is empty.
pub fn median(values: &[f64]) -> Option<f64> {
	Median::compute(values)
}

/// Compute the Pearson correlation coefficient between `x` and `y`.
///
/// Returns `None` if the slices have different lengths, fewer than two pairs, or if either slice has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
	if x.len() != y.len() {
		return None;
	}
	let mut metric = Pearson::default();
	metric.update(PearsonInput { x, y });
	metric.finalize()
}

#[test]
fn test_free_functions() {
	assert_eq!(mean(&[1.0, 2.0, 3.0, 6.0]), Some(3.0));
	assert_eq!(mean(&[]), None);
	assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
	assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
	assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
}
