/*!
This crate is an implementation of a linear regressor trained with mini-batch gradient descent. Features are standardized with the means and standard deviations of the training set before training and prediction, so the learning rate does not depend on the scale of the encoded features.
*/

use ndarray::prelude::*;

mod regressor;

pub use regressor::LinearRegressor;

/// These are the options passed to `LinearRegressor::train`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
	/// Specify options for early stopping. If the value is `Some`, early stopping will be enabled. If it is `None`, early stopping will be disabled.
	pub early_stopping_options: Option<EarlyStoppingOptions>,
	/// This is the L2 regularization value to use when updating the model parameters.
	pub l2_regularization: f64,
	/// This is the learning rate to use when updating the model parameters.
	pub learning_rate: f64,
	/// This is the maximum number of epochs to train.
	pub max_epochs: usize,
	/// This is the number of examples to use for each batch of training.
	pub n_examples_per_batch: usize,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			l2_regularization: 0.0,
			learning_rate: 0.1,
			max_epochs: 100,
			n_examples_per_batch: 128,
			early_stopping_options: Some(EarlyStoppingOptions::default()),
		}
	}
}

/// The parameters in this struct control how to determine whether training should stop early after each epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EarlyStoppingOptions {
	/// This is the fraction of the dataset that is set aside to compute the early stopping metric.
	pub early_stopping_fraction: f64,
	/// If this many epochs pass by without a significant improvement in the early stopping metric over the previous epoch, training will be stopped early.
	pub n_epochs_without_improvement_to_stop: usize,
	/// This is the minimum decrease in the early stopping metric for an epoch to be considered a significant improvement over the previous epoch.
	pub min_decrease_in_loss_for_significant_change: f64,
}

impl Default for EarlyStoppingOptions {
	fn default() -> Self {
		Self {
			early_stopping_fraction: 0.1,
			n_epochs_without_improvement_to_stop: 3,
			min_decrease_in_loss_for_significant_change: 1e-3,
		}
	}
}

/// This function splits the `features` and `targets` arrays into training and early stopping arrays, where the size of the early stopping array will be `features.nrows() * early_stopping_fraction`.
fn train_early_stopping_split<'features, 'targets>(
	features: ArrayView2<'features, f64>,
	targets: ArrayView1<'targets, f64>,
	early_stopping_fraction: f64,
) -> (
	ArrayView2<'features, f64>,
	ArrayView1<'targets, f64>,
	ArrayView2<'features, f64>,
	ArrayView1<'targets, f64>,
) {
	let split_index = ((1.0 - early_stopping_fraction) * features.nrows() as f64) as usize;
	let split_index = split_index.min(features.nrows());
	let (features_train, features_early_stopping) = features.split_at(Axis(0), split_index);
	let (targets_train, targets_early_stopping) = targets.split_at(Axis(0), split_index);
	(
		features_train,
		targets_train,
		features_early_stopping,
		targets_early_stopping,
	)
}

/**
The `EarlyStoppingMonitor` keeps track of the values of an early stopping metric for each epoch, and if enough epochs have passed without a significant improvement in the metric, the `update()` function will return `true` to indicate that training should be stopped.
*/
struct EarlyStoppingMonitor {
	threshold: f64,
	epochs: usize,
	n_epochs_without_observed_improvement: usize,
	previous_epoch_metric_value: Option<f64>,
}

impl EarlyStoppingMonitor {
	pub fn new(threshold: f64, epochs: usize) -> Self {
		EarlyStoppingMonitor {
			threshold,
			epochs,
			previous_epoch_metric_value: None,
			n_epochs_without_observed_improvement: 0,
		}
	}

	/// This function updates the `EarlyStoppingMonitor` with the next epoch's early stopping metric. This function returns true if training should stop.
	pub fn update(&mut self, early_stopping_metric_value: f64) -> bool {
		let result = if let Some(previous_stopping_metric) = self.previous_epoch_metric_value {
			if early_stopping_metric_value > previous_stopping_metric
				|| f64::abs(early_stopping_metric_value - previous_stopping_metric) < self.threshold
			{
				self.n_epochs_without_observed_improvement += 1;
				self.n_epochs_without_observed_improvement >= self.epochs
			} else {
				self.n_epochs_without_observed_improvement = 0;
				false
			}
		} else {
			false
		};
		self.previous_epoch_metric_value = Some(early_stopping_metric_value);
		result
	}
}

#[test]
fn test_train_early_stopping_split() {
	let features = Array2::from_shape_fn((10, 2), |(row, column)| (row * 2 + column) as f64);
	let targets = Array1::from_iter((0..10).map(|row| row as f64));
	let (features_train, targets_train, features_early_stopping, targets_early_stopping) =
		train_early_stopping_split(features.view(), targets.view(), 0.2);
	assert_eq!(features_train.nrows(), 8);
	assert_eq!(targets_train.len(), 8);
	assert_eq!(features_early_stopping.nrows(), 2);
	assert_eq!(targets_early_stopping.to_vec(), vec![8.0, 9.0]);
	let (features_train, _, features_early_stopping, _) =
		train_early_stopping_split(features.view(), targets.view(), 0.0);
	assert_eq!(features_train.nrows(), 10);
	assert_eq!(features_early_stopping.nrows(), 0);
}

#[test]
fn test_early_stopping_monitor() {
	let mut monitor = EarlyStoppingMonitor::new(0.01, 2);
	assert!(!monitor.update(1.0));
	assert!(!monitor.update(0.5));
	assert!(!monitor.update(0.499));
	assert!(monitor.update(0.6));
}
