//! Optional observability helpers for the request pipeline.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_session.pipeline` with the `stage`
//!   and `call` (call site) fields, plus debug events at every renewal state transition.
//! - Enable `metrics` to increment the `bearer_session_stage_total` counter for every
//!   attempt/success/failure/coalesced/retried outcome, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pipeline stages observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineStage {
	/// Outbound backend call issued through the dispatcher.
	Dispatch,
	/// Credential renewal coordinated by the refresh coordinator.
	Renewal,
	/// Forced sign-out after a failed renewal.
	Termination,
}
impl PipelineStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PipelineStage::Dispatch => "dispatch",
			PipelineStage::Renewal => "renewal",
			PipelineStage::Termination => "termination",
		}
	}
}
impl Display for PipelineStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Caller joined an in-flight renewal instead of starting one.
	Coalesced,
	/// Call was resubmitted after a renewal.
	Retried,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
			StageOutcome::Coalesced => "coalesced",
			StageOutcome::Retried => "retried",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
