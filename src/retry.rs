//! Per-call retry bookkeeping that bounds renewal-driven resubmissions to one.

// self
use crate::{_prelude::*, http::ApiRequest};

/// A request travelling through the pipeline together with its retry marker.
#[derive(Clone, Debug)]
pub struct OutboundCall {
	/// Request to send.
	pub request: ApiRequest,
	/// Set once the call has been resubmitted after a renewal.
	pub retried: bool,
}
impl OutboundCall {
	/// Wraps a fresh request that has not been retried.
	pub fn new(request: ApiRequest) -> Self {
		Self { request, retried: false }
	}
}

/// Decides whether an unauthorized call may be resubmitted.
#[derive(Clone, Copy, Debug, Default)]
pub struct RetryGuard;
impl RetryGuard {
	/// Returns `true` only if `call` has not been retried yet.
	pub fn should_retry(call: &OutboundCall) -> bool {
		!call.retried
	}

	/// Marks `call` as retried; must happen before it is resubmitted.
	pub fn mark_retried(call: &mut OutboundCall) {
		call.retried = true;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn fresh_calls_may_retry_once() {
		let mut call = OutboundCall::new(ApiRequest::get("tenants"));

		assert!(RetryGuard::should_retry(&call));

		RetryGuard::mark_retried(&mut call);

		assert!(!RetryGuard::should_retry(&call));

		RetryGuard::mark_retried(&mut call);

		assert!(call.retried);
	}

	#[test]
	fn retry_state_is_per_call() {
		let mut first = OutboundCall::new(ApiRequest::get("tenants"));
		let second = first.clone();

		RetryGuard::mark_retried(&mut first);

		assert!(!RetryGuard::should_retry(&first));
		assert!(RetryGuard::should_retry(&second));
	}
}
