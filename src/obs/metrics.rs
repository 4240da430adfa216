// self
use crate::{
	obs::{PipelineStage, StageOutcome},
	store::StoreError,
};

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_stage_outcome(stage: PipelineStage, outcome: StageOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_session_stage_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

/// Reports a storage backend failure through the enabled observability layers.
pub fn record_store_failure(err: &StoreError) {
	#[cfg(feature = "metrics")]
	{
		let kind = match err {
			StoreError::Serialization { .. } => "serialization",
			StoreError::Backend { .. } => "backend",
		};

		metrics::counter!("bearer_session_store_failure_total", "kind" => kind).increment(1);
	}
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %err, "credential storage write did not persist");
	}

	#[cfg(not(any(feature = "metrics", feature = "tracing")))]
	{
		let _ = err;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_features() {
		record_stage_outcome(PipelineStage::Renewal, StageOutcome::Coalesced);
		record_store_failure(&StoreError::Backend { message: "read-only filesystem".into() });
	}
}
