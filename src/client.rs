//! Public entry point composing dispatch, classification, renewal, and termination.

// crates.io
use http::Method;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{CredentialStore, Credentials},
	config::ClientConfig,
	dispatch::{RequestDispatcher, StatusDetector, UnauthorizedDetector},
	http::{ApiHttpClient, ApiRequest, ApiResponse},
	obs::{self, PipelineStage, StageOutcome, StageSpan},
	refresh::RefreshCoordinator,
	retry::{OutboundCall, RetryGuard},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient>;

/// Authenticated REST client.
///
/// Every call carries the stored access token. A call the [`UnauthorizedDetector`] flags is
/// routed through the shared [`RefreshCoordinator`] and resubmitted once with the renewed
/// token; a second rejection, or a failed renewal, is terminal. Several clients built around
/// the same coordinator share one renewal at a time and one credential store.
pub struct ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	dispatcher: RequestDispatcher<C>,
	detector: Arc<dyn UnauthorizedDetector>,
	coordinator: Arc<RefreshCoordinator>,
}
impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a client that reads and renews credentials through `coordinator`.
	///
	/// Unauthorized responses are detected from `config.unauthorized_statuses`; use
	/// [`ApiClient::with_detector`] for backend-specific signals.
	pub fn new(
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
		coordinator: Arc<RefreshCoordinator>,
	) -> Self {
		let detector = Arc::new(StatusDetector::new(config.unauthorized_statuses.iter().copied()));
		let dispatcher = RequestDispatcher::new(
			http_client.into(),
			coordinator.credentials().clone(),
			Arc::new(config),
		);

		Self { dispatcher, detector, coordinator }
	}

	/// Replaces the unauthorized detector.
	pub fn with_detector(mut self, detector: Arc<dyn UnauthorizedDetector>) -> Self {
		self.detector = detector;

		self
	}

	/// Returns the client configuration.
	pub fn config(&self) -> &ClientConfig {
		self.dispatcher.config()
	}

	/// Returns the credential store shared with the coordinator.
	pub fn credentials(&self) -> &Arc<CredentialStore> {
		self.coordinator.credentials()
	}

	/// Returns the shared refresh coordinator.
	pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
		&self.coordinator
	}

	/// Sends `request`, renewing credentials and retrying once if the backend rejects the
	/// access token.
	///
	/// Terminal outcomes:
	/// - [`Error::Renewal`]: renewal failed and the session has been terminated,
	/// - [`Error::Unauthorized`]: the call was rejected again after its one retry,
	/// - [`Error::Status`], [`Error::Transport`], [`Error::Config`]: passed through untouched.
	pub async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
		let span = StageSpan::new(PipelineStage::Dispatch, "dispatch");

		span.instrument(self.run(OutboundCall::new(request))).await
	}

	/// Sends a `GET` to `path` and decodes the JSON response.
	pub async fn get_json<T>(&self, path: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.dispatch(ApiRequest::get(path)).await?.json()
	}

	/// Sends `payload` as JSON with `method` to `path` and decodes the JSON response.
	pub async fn send_json<B, T>(&self, method: Method, path: &str, payload: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		let request = ApiRequest::new(method, path).json(payload)?;

		self.dispatch(request).await?.json()
	}

	/// Persists `credentials` after a successful login and re-arms the session terminator.
	pub fn sign_in(&self, credentials: &Credentials) {
		self.credentials().store(credentials);
		self.coordinator.terminator().rearm();
		obs::note(PipelineStage::Dispatch, "signed in");
	}

	/// Ends the session on request: clears credentials and navigates to login.
	pub fn sign_out(&self) {
		self.coordinator.terminator().terminate();
	}

	/// Returns `true` while an access token is stored.
	pub fn is_signed_in(&self) -> bool {
		self.credentials().get_access_token().is_some()
	}

	async fn run(&self, mut call: OutboundCall) -> Result<ApiResponse> {
		let credentials = self.coordinator.credentials();
		let mut token = credentials.get_access_token();

		loop {
			obs::record_stage_outcome(PipelineStage::Dispatch, StageOutcome::Attempt);

			let sent = self.dispatcher.send_with(&call.request, token.as_ref()).await;
			let outcome = self.detector.classify(sent);

			if !outcome.is_unauthorized() || !RetryGuard::should_retry(&call) {
				let result = outcome.into_result(call.retried);
				let stage_outcome =
					if result.is_ok() { StageOutcome::Success } else { StageOutcome::Failure };

				obs::record_stage_outcome(PipelineStage::Dispatch, stage_outcome);

				return result;
			}

			RetryGuard::mark_retried(&mut call);

			let renewed = match credentials.get_access_token() {
				// Another caller renewed after this call went out.
				Some(current) if token.as_ref() != Some(&current) => {
					obs::note(PipelineStage::Dispatch, "retrying with already renewed token");

					current
				},
				_ => match self.coordinator.obtain_fresh_token().await {
					Ok(renewed) => renewed,
					Err(e) => {
						obs::record_stage_outcome(PipelineStage::Dispatch, StageOutcome::Failure);

						return Err(e.into());
					},
				},
			};

			obs::record_stage_outcome(PipelineStage::Dispatch, StageOutcome::Retried);

			token = Some(renewed);
		}
	}
}
impl<C> Debug for ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("dispatcher", &self.dispatcher)
			.field("coordinator", &self.coordinator)
			.finish()
	}
}
