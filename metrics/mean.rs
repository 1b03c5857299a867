use super::StreamingMetric;

/// The arithmetic mean, computed incrementally so that partial means from separate chunks can be merged.
#[derive(Debug, Clone, Default)]
pub struct Mean {
	n: u64,
	mean: f64,
}

impl StreamingMetric<'_> for Mean {
	type Input = f64;
	type Output = Option<f64>;

	fn update(&mut self, value: f64) {
		self.n += 1;
		self.mean += (value - self.mean) / self.n as f64;
	}

	fn merge(&mut self, other: Self) {
		if other.n == 0 {
			return;
		}
		let n = self.n + other.n;
		self.mean = (self.mean * self.n as f64 + other.mean * other.n as f64) / n as f64;
		self.n = n;
	}

	fn finalize(self) -> Self::Output {
		if self.n > 0 {
			Some(self.mean)
		} else {
			None
		}
	}
}

#[test]
fn test_merge() {
	let mut a = Mean::default();
	a.update(1.0);
	a.update(2.0);
	let mut b = Mean::default();
	b.update(6.0);
	a.merge(b);
	assert_eq!(a.finalize(), Some(3.0));
	let mut empty = Mean::default();
	empty.merge(Mean::default());
	assert_eq!(empty.finalize(), None);
}
