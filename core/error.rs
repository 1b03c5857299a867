use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
	#[error("the engine has not been trained")]
	NotTrained,
	#[error(transparent)]
	Features(#[from] pricecast_features::Error),
}
