//! https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance#Parallel_algorithm

/// Combine two separately computed means and sums of squared deviations (`m2`) into a single mean and `m2`. This is what makes the streaming metrics in this crate mergeable.
pub fn merge_mean_m2(n_a: u64, mean_a: f64, m2_a: f64, n_b: u64, mean_b: f64, m2_b: f64) -> (f64, f64) {
	if n_a + n_b == 0 {
		return (0.0, 0.0);
	}
	let n_a = n_a as f64;
	let n_b = n_b as f64;
	(
		((n_a * mean_a) + (n_b * mean_b)) / (n_a + n_b),
		m2_a + m2_b + (mean_b - mean_a) * (mean_b - mean_a) * (n_a * n_b / (n_a + n_b)),
	)
}

#[test]
fn test_merge_mean_m2() {
	// [1, 2] and [3, 4, 5] merged is [1, 2, 3, 4, 5], with mean 3 and m2 10.
	let (mean, m2) = merge_mean_m2(2, 1.5, 0.5, 3, 4.0, 2.0);
	assert!((mean - 3.0).abs() < 1e-12);
	assert!((m2 - 10.0).abs() < 1e-12);
}
