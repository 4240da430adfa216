// crates.io
use http::{HeaderMap, StatusCode};
// self
use crate::{
	_prelude::*,
	dispatch::{ErrorDetail, Outcome, Rejection},
};

/// Classifies completed calls as recoverable-unauthorized.
///
/// Only [`ErrorDetail::Status`] outcomes are candidates; successes, transport failures, and
/// request-building failures always pass through unchanged.
pub trait UnauthorizedDetector
where
	Self: Send + Sync,
{
	/// Returns `true` when the response means the attached access token was not accepted.
	fn is_unauthorized(&self, status: StatusCode, headers: &HeaderMap, body: &[u8]) -> bool;

	/// Maps unauthorized status outcomes to [`Outcome::Unauthorized`].
	fn classify(&self, outcome: Outcome) -> Outcome {
		match outcome {
			Outcome::OtherError(ErrorDetail::Status { status, headers, body })
				if self.is_unauthorized(status, &headers, &body) =>
				Outcome::Unauthorized(Rejection { status, headers, body }),
			other => other,
		}
	}
}

/// Default detector keyed on a set of HTTP statuses (401 unless configured otherwise).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusDetector {
	statuses: BTreeSet<u16>,
}
impl StatusDetector {
	/// Creates a detector treating every status in `statuses` as unauthorized.
	pub fn new<I>(statuses: I) -> Self
	where
		I: IntoIterator<Item = u16>,
	{
		Self { statuses: statuses.into_iter().collect() }
	}
}
impl Default for StatusDetector {
	fn default() -> Self {
		Self::new([StatusCode::UNAUTHORIZED.as_u16()])
	}
}
impl UnauthorizedDetector for StatusDetector {
	fn is_unauthorized(&self, status: StatusCode, _headers: &HeaderMap, _body: &[u8]) -> bool {
		self.statuses.contains(&status.as_u16())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::TransportError, http::ApiResponse};

	fn status_outcome(status: StatusCode) -> Outcome {
		let detail = ErrorDetail::Status { status, headers: HeaderMap::new(), body: Vec::new() };

		Outcome::OtherError(detail)
	}

	#[test]
	fn maps_401_to_unauthorized() {
		let detector = StatusDetector::default();

		assert!(detector.classify(status_outcome(StatusCode::UNAUTHORIZED)).is_unauthorized());
		assert!(!detector.classify(status_outcome(StatusCode::FORBIDDEN)).is_unauthorized());
	}

	#[test]
	fn passes_success_and_transport_failures_through() {
		let detector = StatusDetector::default();
		let success = Outcome::Success(ApiResponse {
			status: StatusCode::UNAUTHORIZED,
			headers: HeaderMap::new(),
			body: Vec::new(),
		});
		let transport = Outcome::OtherError(ErrorDetail::Transport(TransportError::Io(
			std::io::Error::other("connection reset"),
		)));

		assert!(matches!(detector.classify(success), Outcome::Success(_)));
		assert!(matches!(
			detector.classify(transport),
			Outcome::OtherError(ErrorDetail::Transport(_))
		));
	}

	#[test]
	fn custom_statuses_cover_backend_specific_signals() {
		let detector = StatusDetector::new([401, 419]);
		let expired = StatusCode::from_u16(419).expect("419 should be a valid status code.");

		assert!(detector.classify(status_outcome(expired)).is_unauthorized());
	}

	#[test]
	fn custom_detectors_can_inspect_the_body() {
		struct BodyCodeDetector;
		impl UnauthorizedDetector for BodyCodeDetector {
			fn is_unauthorized(
				&self,
				_status: StatusCode,
				_headers: &HeaderMap,
				body: &[u8],
			) -> bool {
				body.windows(13).any(|window| window == b"token_expired")
			}
		}

		let outcome = Outcome::OtherError(ErrorDetail::Status {
			status: StatusCode::BAD_REQUEST,
			headers: HeaderMap::new(),
			body: br#"{"code":"token_expired"}"#.to_vec(),
		});

		assert!(BodyCodeDetector.classify(outcome).is_unauthorized());
	}
}
