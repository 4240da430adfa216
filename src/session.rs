//! Forced sign-out when the session can no longer be renewed.

// self
use crate::{
	_prelude::*,
	auth::CredentialStore,
	obs::{self, PipelineStage, StageOutcome},
};

/// Navigation collaborator that takes the user out of the authenticated area.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Leaves the authenticated area (for example by routing to the login screen).
	fn go_to_login(&self);
}
impl<F> Navigator for F
where
	F: Fn() + Send + Sync,
{
	fn go_to_login(&self) {
		self()
	}
}

/// Ends the session after a failed renewal: wipes stored credentials and navigates away once.
///
/// Credential removal runs on every call. Navigation fires only on the first termination after
/// construction or [`SessionTerminator::rearm`], so a renewal failure observed by several
/// clients produces a single redirect. The coordinator re-arms at the start of every renewal
/// round and [`ApiClient::sign_in`](crate::client::ApiClient::sign_in) re-arms on login.
pub struct SessionTerminator {
	credentials: Arc<CredentialStore>,
	navigator: Arc<dyn Navigator>,
	terminated: AtomicBool,
}
impl SessionTerminator {
	/// Creates an armed terminator.
	pub fn new(credentials: Arc<CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
		Self { credentials, navigator, terminated: AtomicBool::new(false) }
	}

	/// Clears both credentials and, if this is the first termination, navigates to login.
	///
	/// Returns `true` when this call triggered navigation.
	pub fn terminate(&self) -> bool {
		self.credentials.clear();

		let first = !self.terminated.swap(true, Ordering::AcqRel);

		if first {
			obs::record_stage_outcome(PipelineStage::Termination, StageOutcome::Success);
			obs::note(PipelineStage::Termination, "credentials cleared, navigating to login");
			self.navigator.go_to_login();
		} else {
			obs::note(PipelineStage::Termination, "credentials cleared, already signed out");
		}

		first
	}

	/// Re-enables navigation for the next termination.
	pub fn rearm(&self) {
		self.terminated.store(false, Ordering::Release);
	}

	/// Returns whether the session has been terminated since the last (re)arm.
	pub fn is_terminated(&self) -> bool {
		self.terminated.load(Ordering::Acquire)
	}
}
impl Debug for SessionTerminator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionTerminator").field("terminated", &self.is_terminated()).finish()
	}
}
