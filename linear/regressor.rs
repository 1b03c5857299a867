use super::{train_early_stopping_split, EarlyStoppingMonitor, TrainOptions};
use itertools::izip;
use ndarray::prelude::*;
use pricecast_metrics::{mean, MeanSquaredError, StreamingMetric};

/// This struct describes a linear regressor model. Create one with `LinearRegressor::new` and fit it by calling `LinearRegressor::fit`, or call `LinearRegressor::train` to do both.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LinearRegressor {
	pub bias: f64,
	pub weights: Array1<f64>,
	/// These are the mean values of each feature in the training set, which are subtracted from the features before training and prediction.
	pub means: Vec<f64>,
	/// These are the standard deviations of each feature in the training set. A feature with zero variance has a standard deviation of one here.
	pub stds: Vec<f64>,
	/// These are the loss values for each epoch.
	pub losses: Vec<f64>,
	/// The options used by `fit`. They are not persisted.
	#[serde(skip)]
	pub options: TrainOptions,
}

impl LinearRegressor {
	/// Create an untrained linear regressor that will be trained with `options`.
	pub fn new(options: TrainOptions) -> LinearRegressor {
		LinearRegressor {
			options,
			..Default::default()
		}
	}

	/// Train a linear regressor.
	pub fn train(
		features: ArrayView2<f64>,
		targets: ArrayView1<f64>,
		options: &TrainOptions,
	) -> LinearRegressor {
		let mut model = LinearRegressor::new(options.clone());
		model.fit(features, targets);
		model
	}

	/// Fit this regressor to `features` and `targets` with its options, replacing any previously learned parameters.
	pub fn fit(&mut self, features: ArrayView2<f64>, targets: ArrayView1<f64>) {
		let options = self.options.clone();
		let n_features = features.ncols();
		let (features_train, targets_train, features_early_stopping, targets_early_stopping) =
			train_early_stopping_split(
				features,
				targets,
				options
					.early_stopping_options
					.as_ref()
					.map(|o| o.early_stopping_fraction)
					.unwrap_or(0.0),
			);
		self.means = features_train
			.axis_iter(Axis(1))
			.map(|column| mean(&column.to_vec()).unwrap_or(0.0))
			.collect();
		self.stds = features_train
			.axis_iter(Axis(1))
			.map(|column| {
				let std = if column.is_empty() { 0.0 } else { column.std(0.0) };
				if std.is_finite() && std > 0.0 {
					std
				} else {
					1.0
				}
			})
			.collect();
		self.bias = 0.0;
		self.weights = Array1::zeros(n_features);
		self.losses = Vec::new();
		let features_train = self.standardize(features_train);
		let features_early_stopping = self.standardize(features_early_stopping);
		let mut early_stopping_monitor =
			if let Some(early_stopping_options) = &options.early_stopping_options {
				Some(EarlyStoppingMonitor::new(
					early_stopping_options.min_decrease_in_loss_for_significant_change,
					early_stopping_options.n_epochs_without_improvement_to_stop,
				))
			} else {
				None
			};
		let n_examples_per_batch = options.n_examples_per_batch.max(1);
		for epoch in 0..options.max_epochs {
			izip!(
				features_train.axis_chunks_iter(Axis(0), n_examples_per_batch),
				targets_train.axis_chunks_iter(Axis(0), n_examples_per_batch),
			)
			.for_each(|(features, targets)| {
				self.train_batch(features, targets, &options);
			});
			if let Some(loss) = self.compute_loss(features_train.view(), targets_train) {
				tracing::trace!(epoch, loss, "finished epoch");
				self.losses.push(loss);
			}
			if let Some(early_stopping_monitor) = early_stopping_monitor.as_mut() {
				let early_stopping_metric_value =
					match self.compute_loss(features_early_stopping.view(), targets_early_stopping) {
						Some(value) => value,
						None => continue,
					};
				let should_stop = early_stopping_monitor.update(early_stopping_metric_value);
				if should_stop {
					tracing::debug!(epoch, "stopping early");
					break;
				}
			}
		}
	}

	fn train_batch(
		&mut self,
		features: ArrayView2<f64>,
		targets: ArrayView1<f64>,
		options: &TrainOptions,
	) {
		let learning_rate = options.learning_rate;
		let predictions = features.dot(&self.weights) + self.bias;
		let py = (predictions - targets).insert_axis(Axis(1));
		let weight_gradients = match (&features * &py).mean_axis(Axis(0)) {
			Some(weight_gradients) => weight_gradients,
			None => return,
		};
		let bias_gradient: f64 = py.mean().unwrap_or(0.0);
		for (weight, weight_gradient) in izip!(self.weights.iter_mut(), weight_gradients.iter()) {
			*weight += -learning_rate * (weight_gradient + options.l2_regularization * *weight);
		}
		self.bias += -learning_rate * bias_gradient;
	}

	fn compute_loss(&self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Option<f64> {
		let predictions = features.dot(&self.weights) + self.bias;
		let mut metric = MeanSquaredError::default();
		for (prediction, target) in izip!(predictions.iter(), targets.iter()) {
			metric.update((*prediction, *target));
		}
		metric.finalize()
	}

	fn standardize(&self, features: ArrayView2<f64>) -> Array2<f64> {
		let mut features = features.to_owned();
		for (mut column, mean, std) in izip!(features.axis_iter_mut(Axis(1)), &self.means, &self.stds)
		{
			column.mapv_inplace(|value| (value - mean) / std);
		}
		features
	}

	/// Predict a target for each row of `features`. `features` must have as many columns as the features this regressor was trained on.
	pub fn predict(&self, features: ArrayView2<f64>) -> Array1<f64> {
		let features = self.standardize(features);
		features.dot(&self.weights) + self.bias
	}
}

#[test]
fn test_fit_line() {
	let features = Array2::from_shape_fn((20, 1), |(row, _)| row as f64);
	let targets = features.column(0).mapv(|x| 2.0 * x + 1.0);
	let options = TrainOptions {
		learning_rate: 0.1,
		max_epochs: 500,
		early_stopping_options: None,
		..Default::default()
	};
	let model = LinearRegressor::train(features.view(), targets.view(), &options);
	assert_eq!(model.losses.len(), 500);
	assert!(model.losses[499] < model.losses[0]);
	let predictions = model.predict(array![[3.0], [25.0]].view());
	assert!((predictions[0] - 7.0).abs() < 1e-6);
	assert!((predictions[1] - 51.0).abs() < 1e-6);
}

#[test]
fn test_constant_feature() {
	let features = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
	let targets = array![1.0, 3.0, 5.0, 7.0];
	let options = TrainOptions {
		max_epochs: 300,
		early_stopping_options: None,
		..Default::default()
	};
	let model = LinearRegressor::train(features.view(), targets.view(), &options);
	assert_eq!(model.stds[0], 1.0);
	assert_eq!(model.weights[0], 0.0);
	let predictions = model.predict(array![[1.0, 4.0]].view());
	assert!((predictions[0] - 9.0).abs() < 1e-6);
}

#[test]
fn test_early_stopping() {
	let features = Array2::from_shape_fn((50, 1), |(row, _)| (row % 10) as f64);
	let targets = features.column(0).mapv(|x| x * 0.5);
	let options = TrainOptions {
		max_epochs: 1000,
		..Default::default()
	};
	let model = LinearRegressor::train(features.view(), targets.view(), &options);
	assert!(model.losses.len() < 1000);
	assert!(model.losses[model.losses.len() - 1] < 0.05);
}

#[test]
fn test_serialization_skips_options() {
	let model = LinearRegressor {
		bias: 1.5,
		weights: array![0.25, -2.0],
		means: vec![0.0, 1.0],
		stds: vec![1.0, 2.0],
		losses: vec![3.0],
		options: TrainOptions {
			max_epochs: 7,
			..Default::default()
		},
	};
	let bytes = rmp_serde::to_vec_named(&model).unwrap();
	let restored: LinearRegressor = rmp_serde::from_slice(&bytes).unwrap();
	assert_eq!(restored.weights, model.weights);
	assert_eq!(restored.stds, model.stds);
	assert_eq!(restored.options, TrainOptions::default());
}
