//! Single-flight credential renewal shared by every client in the process.
//!
//! [`RefreshCoordinator::obtain_fresh_token`] guarantees that at most one renewal call is
//! outstanding at any time. The first caller to ask while the coordinator is idle becomes the
//! *driver*: it reads the refresh token, performs the renewal through the injected [`Renewer`],
//! and settles the outcome. Every caller that asks while the driver is still working becomes a
//! *waiter*: it queues a pending result handle and suspends without touching the network. When
//! the driver settles, waiters are resumed in enqueue order with either the new access token or
//! the shared [`RenewalError`].
//!
//! The idle/refreshing check and the transition into refreshing happen under one lock with no
//! suspension point in between, which keeps the invariant intact on multi-threaded executors.
//! A driver future dropped before it settles releases its waiters with
//! [`RenewalError::Abandoned`] rather than stranding them.

mod metrics;
mod renewer;

pub use metrics::RefreshMetrics;
pub use renewer::*;

// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{CredentialStore, TokenSecret},
	obs::{self, PipelineStage, StageOutcome, StageSpan},
	session::SessionTerminator,
};

/// Result fanned out to the driver and every waiter of one renewal.
pub type TokenResult = Result<TokenSecret, RenewalError>;

/// Renewal failure shared with every caller that waited on it.
///
/// The coordinator treats all variants the same way (terminate the session, fail every
/// waiter); the variant only tells the caller why.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RenewalError {
	/// No refresh token is stored, so there is nothing to renew with.
	#[error("No refresh token is stored; the session cannot be renewed.")]
	MissingRefreshToken,
	/// Renewal endpoint rejected the refresh token.
	#[error("Renewal endpoint rejected the refresh token with HTTP {status}: {message}.")]
	Rejected {
		/// HTTP status returned by the renewal endpoint.
		status: u16,
		/// Response body preview.
		message: String,
	},
	/// Renewal call never produced an HTTP response.
	#[error("Renewal call failed in transport: {message}.")]
	Transport {
		/// Transport error summary.
		message: String,
	},
	/// Renewal endpoint answered 2xx with an unusable payload.
	#[error("Renewal endpoint returned a malformed response: {message}.")]
	MalformedResponse {
		/// Parsing failure summary.
		message: String,
	},
	/// Renewal driver was dropped before it settled.
	#[error("Credential renewal was abandoned before it completed.")]
	Abandoned,
}
impl RenewalError {
	/// Returns `true` for [`RenewalError::Abandoned`], the only variant that does not end the
	/// session.
	pub fn is_abandoned(&self) -> bool {
		matches!(self, Self::Abandoned)
	}

	/// Returns the renewal endpoint's HTTP status, when it answered.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Externally observable coordinator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPhase {
	/// No renewal is outstanding.
	Idle,
	/// Exactly one renewal call is outstanding.
	Refreshing,
}

#[derive(Debug, Default)]
struct RefreshState {
	in_progress: bool,
	waiters: VecDeque<oneshot::Sender<TokenResult>>,
}

enum Role<'a> {
	Driver(DriverGuard<'a>),
	Waiter(oneshot::Receiver<TokenResult>),
}

/// Settles the renewal exactly once, even if the driver future is dropped mid-flight.
struct DriverGuard<'a> {
	coordinator: &'a RefreshCoordinator,
	settled: bool,
}
impl DriverGuard<'_> {
	fn settle(mut self, result: &TokenResult) {
		self.settled = true;
		self.coordinator.release(result);
	}
}
impl Drop for DriverGuard<'_> {
	fn drop(&mut self) {
		if !self.settled {
			obs::note(PipelineStage::Renewal, "renewal driver dropped before settling");
			self.coordinator.release(&Err(RenewalError::Abandoned));
		}
	}
}

/// Explicitly constructed single-flight coordinator owned by the composition root and shared
/// (behind [`Arc`]) by every [`ApiClient`](crate::client::ApiClient).
pub struct RefreshCoordinator {
	credentials: Arc<CredentialStore>,
	renewer: Arc<dyn Renewer>,
	terminator: Arc<SessionTerminator>,
	state: Mutex<RefreshState>,
	metrics: RefreshMetrics,
}
impl RefreshCoordinator {
	/// Creates an idle coordinator.
	pub fn new(
		credentials: Arc<CredentialStore>,
		renewer: Arc<dyn Renewer>,
		terminator: Arc<SessionTerminator>,
	) -> Self {
		Self {
			credentials,
			renewer,
			terminator,
			state: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Returns the credential store renewals read from and write to.
	pub fn credentials(&self) -> &Arc<CredentialStore> {
		&self.credentials
	}

	/// Returns the terminator run when a renewal fails.
	pub fn terminator(&self) -> &Arc<SessionTerminator> {
		&self.terminator
	}

	/// Returns the renewal counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Returns whether a renewal is currently outstanding.
	pub fn phase(&self) -> RefreshPhase {
		if self.state.lock().in_progress { RefreshPhase::Refreshing } else { RefreshPhase::Idle }
	}

	/// Returns how many callers are queued behind the current renewal.
	pub fn waiting(&self) -> usize {
		self.state.lock().waiters.len()
	}

	/// Returns a freshly renewed access token, driving the renewal or joining the one already
	/// in flight.
	///
	/// On failure the session has already been terminated (unless the error is
	/// [`RenewalError::Abandoned`]) by the time this resolves.
	pub async fn obtain_fresh_token(&self) -> TokenResult {
		match self.enroll() {
			Role::Driver(guard) => {
				let span = StageSpan::new(PipelineStage::Renewal, "obtain_fresh_token");

				span.instrument(self.drive(guard)).await
			},
			Role::Waiter(pending) => pending.await.unwrap_or(Err(RenewalError::Abandoned)),
		}
	}

	fn enroll(&self) -> Role<'_> {
		let mut state = self.state.lock();

		if state.in_progress {
			let (resolve, pending) = oneshot::channel();

			state.waiters.push_back(resolve);
			drop(state);

			self.metrics.record_coalesced();
			obs::record_stage_outcome(PipelineStage::Renewal, StageOutcome::Coalesced);
			obs::note(PipelineStage::Renewal, "joined in-flight renewal");

			Role::Waiter(pending)
		} else {
			state.in_progress = true;
			drop(state);

			obs::note(PipelineStage::Renewal, "elected renewal driver");

			Role::Driver(DriverGuard { coordinator: self, settled: false })
		}
	}

	async fn drive(&self, guard: DriverGuard<'_>) -> TokenResult {
		// Each round may sign the user out once, whoever stored the session being renewed.
		self.terminator.rearm();
		self.metrics.record_attempt();
		obs::record_stage_outcome(PipelineStage::Renewal, StageOutcome::Attempt);

		let result = match self.credentials.get_refresh_token() {
			Some(refresh_token) => {
				self.metrics.record_call();

				self.renewer.renew(&refresh_token).await.map(|renewed| {
					self.credentials.set(&renewed.access_token, renewed.refresh_token.as_ref());

					renewed.access_token
				})
			},
			None => Err(RenewalError::MissingRefreshToken),
		};

		match &result {
			Ok(_) => {
				self.metrics.record_success();
				obs::record_stage_outcome(PipelineStage::Renewal, StageOutcome::Success);
			},
			Err(_) => {
				self.metrics.record_failure();
				obs::record_stage_outcome(PipelineStage::Renewal, StageOutcome::Failure);
				self.terminator.terminate();
			},
		}

		guard.settle(&result);

		result
	}

	fn release(&self, result: &TokenResult) {
		let waiters = {
			let mut state = self.state.lock();

			state.in_progress = false;

			std::mem::take(&mut state.waiters)
		};

		obs::note_waiters(PipelineStage::Renewal, "renewal settled", waiters.len());

		for waiter in waiters {
			// A waiter whose caller went away has nothing left to resume.
			let _ = waiter.send(result.clone());
		}
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("phase", &self.phase())
			.field("waiting", &self.waiting())
			.field("metrics", &self.metrics)
			.finish()
	}
}
