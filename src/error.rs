//! Pipeline-level error types shared by transport, renewal, and dispatch.

// self
use crate::_prelude::*;

/// Pipeline-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error surfaced by [`ApiClient::dispatch`](crate::client::ApiClient::dispatch).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) while calling the backend.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Credential renewal failed and the session has been terminated.
	#[error(transparent)]
	Renewal(#[from] crate::refresh::RenewalError),

	/// Backend still rejected the call after its single allowed retry.
	#[error("Backend rejected the request as unauthorized{}.", retry_suffix(.retried))]
	Unauthorized {
		/// Whether the call had already been resubmitted with renewed credentials.
		retried: bool,
	},
	/// Backend answered with a non-success status that is not an authorization problem.
	#[error("Backend responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: Vec<u8>,
		/// Retry-After hint from the backend, if supplied.
		retry_after: Option<Duration>,
	},
	/// Response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns `true` when the failure ended the authenticated session.
	pub fn is_session_terminated(&self) -> bool {
		matches!(self, Self::Renewal(err) if !err.is_abandoned())
	}

	/// Returns the backend HTTP status attached to this error, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			Self::Renewal(err) => err.status(),
			_ => None,
		}
	}
}

fn retry_suffix(retried: &bool) -> &'static str {
	if *retried { " after credential renewal" } else { "" }
}

/// Configuration and request-building failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Request path could not be joined onto the configured base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Stored access token cannot be encoded as a header value.
	#[error("Stored access token is not a valid header value.")]
	InvalidAuthorizationHeader(#[from] http::header::InvalidHeaderValue),
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized to JSON.")]
	Serialize(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::refresh::RenewalError;

	#[test]
	fn unauthorized_message_mentions_renewal_only_after_retry() {
		assert_eq!(
			Error::Unauthorized { retried: true }.to_string(),
			"Backend rejected the request as unauthorized after credential renewal."
		);
		assert_eq!(
			Error::Unauthorized { retried: false }.to_string(),
			"Backend rejected the request as unauthorized."
		);
	}

	#[test]
	fn renewal_failures_report_session_termination() {
		let rejected: Error = RenewalError::Rejected { status: 400, message: "bad".into() }.into();
		let abandoned: Error = RenewalError::Abandoned.into();

		assert!(rejected.is_session_terminated());
		assert_eq!(rejected.status(), Some(400));
		assert!(!abandoned.is_session_terminated());
		assert!(!Error::Unauthorized { retried: true }.is_session_terminated());
	}

	#[test]
	fn transport_error_exposes_source() {
		let io = std::io::Error::other("socket closed");
		let err: Error = TransportError::network(io).into();
		let source = StdError::source(&err)
			.expect("Transport error should expose the original network error.");

		assert_eq!(source.to_string(), "socket closed");
	}
}
