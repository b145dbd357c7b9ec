pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<dojo_storage::Error> for Error {
	fn from(err: dojo_storage::Error) -> Self {
		match err {
			dojo_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			dojo_storage::Error::NotFound(message) => Self::NotFound { message },
			err => Self::Storage { message: err.to_string() },
		}
	}
}
impl From<dojo_providers::Error> for Error {
	fn from(err: dojo_providers::Error) -> Self {
		match err {
			dojo_providers::Error::MissingApiKey
			| dojo_providers::Error::InvalidConfig { .. }
			| dojo_providers::Error::InvalidHeaderName(_)
			| dojo_providers::Error::InvalidHeaderValue(_) =>
				Self::Configuration { message: err.to_string() },
			err => Self::Provider { message: err.to_string() },
		}
	}
}
impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Storage { message: format!("Failed to encode cache payload: {err}") }
	}
}
