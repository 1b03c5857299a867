/*!
This crate turns raw columns into numeric features. Training computes [`ColumnStatistics`](stats/struct.ColumnStatistics.html) for every column, classifies it and derives a [`TransformSpec`](encoder/struct.TransformSpec.html). The specs are collected in an [`EncoderState`](state/struct.EncoderState.html), which encodes rows at train and predict time and can be persisted between processes.
*/

pub mod classify;
pub mod encoder;
mod error;
pub mod policy;
pub mod state;
pub mod stats;

pub use self::{
	classify::{Category, ValueKind},
	encoder::TransformSpec,
	error::Error,
	policy::{EncodeOptions, EncodingPolicy, InvalidValues, UnseenSymbols},
	state::EncoderState,
	stats::ColumnStatistics,
};
