/*!
This crate ties the workspace together. The [`Engine`](engine/struct.Engine.html) fits an encoder state to a dataset and trains a [`Regressor`](engine/trait.Regressor.html) on the encoded rows. A [`Model`](model/struct.Model.html) persists a trained engine that uses the linear regressor, and a [`Config`](config/struct.Config.html) configures both.
*/

pub mod config;
pub mod engine;
mod error;
pub mod model;

pub use self::{
	config::Config,
	engine::{Engine, Regressor},
	error::Error,
	model::Model,
};
