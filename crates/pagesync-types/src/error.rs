//! Error types
//!
//! Every failure the synchronizer can observe is locally recoverable, so the
//! taxonomy is flat: transport failures, server rejections, malformed bodies,
//! unidentifiable records and invalid configuration or query input.

use serde::Serialize;

pub type SyncResult<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// Transport failure, no response was received (includes timeouts)
	NetworkError(String),
	/// Non-success status with the server's message
	ServerError { status: u16, message: String },
	/// Response body is missing the expected fields
	MalformedResponse(String),
	/// A record carries none of the identifier aliases
	NoIdentifier,
	/// Rejected query or settings input
	ValidationError(String),
	/// Invalid environment or builder configuration
	ConfigError(String),
}

/// Coarse classification of an [`Error`], as recorded in collection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
	Network,
	Server,
	MalformedResponse,
	NoIdentifier,
	Validation,
	Config,
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::NetworkError(_) => ErrorKind::Network,
			Error::ServerError { .. } => ErrorKind::Server,
			Error::MalformedResponse(_) => ErrorKind::MalformedResponse,
			Error::NoIdentifier => ErrorKind::NoIdentifier,
			Error::ValidationError(_) => ErrorKind::Validation,
			Error::ConfigError(_) => ErrorKind::Config,
		}
	}

	/// HTTP status, if the server answered at all
	pub fn status(&self) -> Option<u16> {
		match self {
			Error::ServerError { status, .. } => Some(*status),
			_ => None,
		}
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::NetworkError(msg) => write!(f, "network error: {}", msg),
			Error::ServerError { status, message } => {
				write!(f, "server error ({}): {}", status, message)
			}
			Error::MalformedResponse(msg) => write!(f, "malformed response: {}", msg),
			Error::NoIdentifier => write!(f, "record has no resolvable identifier"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ConfigError(msg) => write!(f, "config error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::MalformedResponse(err.to_string())
	}
}

impl From<url::ParseError> for Error {
	fn from(err: url::ParseError) -> Self {
		Error::ConfigError(format!("invalid url: {}", err))
	}
}


// vim: ts=4
