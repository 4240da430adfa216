// self
use crate::{_prelude::*, obs::PipelineStage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// A span builder used by pipeline stages.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage + call site.
	pub fn new(stage: PipelineStage, call: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("bearer_session.pipeline", stage = stage.as_str(), call);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, call);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event for a pipeline state transition.
pub(crate) fn note(stage: PipelineStage, event: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(stage = stage.as_str(), "{event}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, event);
	}
}

/// Emits a debug event carrying the number of affected waiters.
pub(crate) fn note_waiters(stage: PipelineStage, event: &'static str, waiters: usize) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(stage = stage.as_str(), waiters, "{event}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, event, waiters);
	}
}
