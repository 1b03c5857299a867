use super::{mean_variance::merge_mean_m2, StreamingMetric};
use itertools::izip;

/**
The Pearson correlation coefficient between two aligned sequences. [Learn more](https://en.wikipedia.org/wiki/Pearson_correlation_coefficient).

The means, the sums of squared deviations and the co-moment are updated in a single pass, so chunks of a pair of columns can be aggregated separately and merged.
*/
#[derive(Debug, Clone, Default)]
pub struct Pearson {
	n: u64,
	mean_x: f64,
	mean_y: f64,
	m2_x: f64,
	m2_y: f64,
	co_moment: f64,
}

/// A chunk of aligned `x` and `y` values. Values past the end of the shorter slice are ignored.
pub struct PearsonInput<'a> {
	pub x: &'a [f64],
	pub y: &'a [f64],
}

impl<'a> StreamingMetric<'a> for Pearson {
	type Input = PearsonInput<'a>;
	type Output = Option<f64>;

	fn update(&mut self, input: PearsonInput) {
		for (x, y) in izip!(input.x.iter(), input.y.iter()) {
			self.n += 1;
			let n = self.n as f64;
			let delta_x = x - self.mean_x;
			let delta_y = y - self.mean_y;
			self.mean_x += delta_x / n;
			self.mean_y += delta_y / n;
			self.m2_x += delta_x * (x - self.mean_x);
			self.m2_y += delta_y * (y - self.mean_y);
			self.co_moment += delta_x * (y - self.mean_y);
		}
	}

	fn merge(&mut self, other: Self) {
		if other.n == 0 {
			return;
		}
		let n_a = self.n as f64;
		let n_b = other.n as f64;
		let co_moment = self.co_moment
			+ other.co_moment
			+ (other.mean_x - self.mean_x) * (other.mean_y - self.mean_y) * (n_a * n_b / (n_a + n_b));
		let (mean_x, m2_x) =
			merge_mean_m2(self.n, self.mean_x, self.m2_x, other.n, other.mean_x, other.m2_x);
		let (mean_y, m2_y) =
			merge_mean_m2(self.n, self.mean_y, self.m2_y, other.n, other.mean_y, other.m2_y);
		self.n += other.n;
		self.mean_x = mean_x;
		self.mean_y = mean_y;
		self.m2_x = m2_x;
		self.m2_y = m2_y;
		self.co_moment = co_moment;
	}

	fn finalize(self) -> Self::Output {
		if self.n < 2 || self.m2_x <= 0.0 || self.m2_y <= 0.0 {
			return None;
		}
		let r = self.co_moment / (self.m2_x * self.m2_y).sqrt();
		if r.is_finite() {
			Some(r.max(-1.0).min(1.0))
		} else {
			None
		}
	}
}

#[test]
fn test_pearson() {
	let x = [1.0, 2.0, 3.0, 4.0, 5.0];
	let y = [2.0, 4.0, 6.0, 8.0, 10.0];
	let mut metric = Pearson::default();
	metric.update(PearsonInput { x: &x, y: &y });
	let r = metric.finalize().unwrap();
	assert!((r - 1.0).abs() < 1e-12);

	let y_reversed = [10.0, 8.0, 6.0, 4.0, 2.0];
	let mut metric = Pearson::default();
	metric.update(PearsonInput {
		x: &x,
		y: &y_reversed,
	});
	let r = metric.finalize().unwrap();
	assert!((r + 1.0).abs() < 1e-12);
}

#[test]
fn test_pearson_undefined() {
	let mut metric = Pearson::default();
	metric.update(PearsonInput {
		x: &[3.0, 3.0, 3.0],
		y: &[1.0, 2.0, 3.0],
	});
	assert_eq!(metric.finalize(), None);
	let mut metric = Pearson::default();
	metric.update(PearsonInput {
		x: &[1.0],
		y: &[1.0],
	});
	assert_eq!(metric.finalize(), None);
}

#[test]
fn test_pearson_merge() {
	let x = [1.0, 5.0, 2.0, 8.0, 3.0, 9.0];
	let y = [2.0, 3.0, 1.0, 7.0, 4.0, 8.0];
	let mut whole = Pearson::default();
	whole.update(PearsonInput { x: &x, y: &y });
	let mut left = Pearson::default();
	left.update(PearsonInput {
		x: &x[..2],
		y: &y[..2],
	});
	let mut right = Pearson::default();
	right.update(PearsonInput {
		x: &x[2..],
		y: &y[2..],
	});
	left.merge(right);
	let whole = whole.finalize().unwrap();
	let merged = left.finalize().unwrap();
	assert!((whole - merged).abs() < 1e-12);
}
