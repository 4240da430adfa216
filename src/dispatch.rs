//! Outbound transport with credential attachment, plus outcome classification.
//!
//! [`RequestDispatcher::send`] performs exactly one backend call with whatever access token is
//! currently stored and reports an [`Outcome`]. It never retries. The
//! [`UnauthorizedDetector`] then decides which non-success outcomes mean "the access token is
//! no longer accepted" so the client can route them into renewal.

mod detect;

pub use detect::*;

// crates.io
use http::{HeaderMap, HeaderValue, StatusCode};
// self
use crate::{
	_prelude::*,
	auth::{CredentialStore, TokenSecret},
	config::ClientConfig,
	error::{ConfigError, TransportError},
	http::{ApiHttpClient, ApiRequest, ApiResponse, parse_retry_after},
};

/// Result of a single backend call.
#[derive(Debug)]
pub enum Outcome {
	/// Backend answered with a 2xx status.
	Success(ApiResponse),
	/// Backend rejected the attached credentials.
	Unauthorized(Rejection),
	/// Any other failure, passed through without interpretation.
	OtherError(ErrorDetail),
}
impl Outcome {
	/// Returns `true` for [`Outcome::Unauthorized`].
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Unauthorized(_))
	}

	/// Converts the outcome into the public result, tagging unauthorized rejections with
	/// whether the call had already been retried.
	pub fn into_result(self, retried: bool) -> Result<ApiResponse> {
		match self {
			Self::Success(response) => Ok(response),
			Self::Unauthorized(_) => Err(Error::Unauthorized { retried }),
			Self::OtherError(detail) => Err(detail.into()),
		}
	}
}

/// Backend response classified as unauthorized.
#[derive(Clone, Debug)]
pub struct Rejection {
	/// Status the backend answered with.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}

/// Failure detail for [`Outcome::OtherError`].
#[derive(Debug)]
pub enum ErrorDetail {
	/// Backend answered with a non-2xx status.
	Status {
		/// HTTP status code.
		status: StatusCode,
		/// Response headers.
		headers: HeaderMap,
		/// Raw response body.
		body: Vec<u8>,
	},
	/// The call never produced an HTTP response.
	Transport(TransportError),
	/// The request could not be built.
	Config(ConfigError),
}
impl From<ErrorDetail> for Error {
	fn from(detail: ErrorDetail) -> Self {
		match detail {
			ErrorDetail::Status { status, headers, body } => Error::Status {
				status: status.as_u16(),
				retry_after: parse_retry_after(&headers),
				body,
			},
			ErrorDetail::Transport(err) => Error::Transport(err),
			ErrorDetail::Config(err) => Error::Config(err),
		}
	}
}

/// Pure transport that attaches the stored access token to each call.
pub struct RequestDispatcher<C>
where
	C: ?Sized + ApiHttpClient,
{
	http_client: Arc<C>,
	credentials: Arc<CredentialStore>,
	config: Arc<ClientConfig>,
}
impl<C> RequestDispatcher<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a dispatcher sending through `http_client` with tokens from `credentials`.
	pub fn new(
		http_client: Arc<C>,
		credentials: Arc<CredentialStore>,
		config: Arc<ClientConfig>,
	) -> Self {
		Self { http_client, credentials, config }
	}

	/// Returns the configuration used to resolve request URLs.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Sends `request` with the currently stored access token (or no `Authorization` header
	/// when none is stored).
	pub async fn send(&self, request: &ApiRequest) -> Outcome {
		let token = self.credentials.get_access_token();

		self.send_with(request, token.as_ref()).await
	}

	/// Sends `request` with an explicit access token.
	pub async fn send_with(&self, request: &ApiRequest, token: Option<&TokenSecret>) -> Outcome {
		let wire = match self.build(request, token) {
			Ok(wire) => wire,
			Err(err) => return Outcome::OtherError(ErrorDetail::Config(err)),
		};

		match self.http_client.execute(wire).await {
			Ok(response) if response.status().is_success() => Outcome::Success(response.into()),
			Ok(response) => {
				let (parts, body) = response.into_parts();

				Outcome::OtherError(ErrorDetail::Status {
					status: parts.status,
					headers: parts.headers,
					body,
				})
			},
			Err(err) => Outcome::OtherError(ErrorDetail::Transport(err)),
		}
	}

	fn build(
		&self,
		request: &ApiRequest,
		token: Option<&TokenSecret>,
	) -> Result<crate::http::HttpRequest, ConfigError> {
		let url = self.config.resolve(&request.path)?;
		let authorization = token
			.map(|token| HeaderValue::try_from(self.config.authorization_value(token.expose())))
			.transpose()?;

		request.to_http(&url, authorization)
	}
}
impl<C> Debug for RequestDispatcher<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestDispatcher")
			.field("base_url", &self.config.base_url.as_str())
			.field("credentials", &self.credentials)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::header::AUTHORIZATION;
	// self
	use super::*;
	use crate::{
		auth::{CredentialKeys, Credentials},
		http::{HttpRequest, HttpResponse, TransportFuture},
		store::MemoryStore,
	};

	#[derive(Default)]
	struct EchoHttpClient {
		seen: Mutex<Vec<(String, Option<String>)>>,
	}
	impl ApiHttpClient for EchoHttpClient {
		fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
			let authorization = request
				.headers()
				.get(AUTHORIZATION)
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned);
			let status = if request.uri().path().ends_with("/missing") {
				StatusCode::NOT_FOUND
			} else {
				StatusCode::OK
			};

			self.seen.lock().push((request.uri().to_string(), authorization));

			Box::pin(async move {
				let mut response = HttpResponse::new(b"{}".to_vec());

				*response.status_mut() = status;

				Ok(response)
			})
		}
	}

	fn build_dispatcher(
		seed: Option<Credentials>,
	) -> (RequestDispatcher<EchoHttpClient>, Arc<EchoHttpClient>) {
		let config = ClientConfig::builder(
			Url::parse("https://api.example.com/v1/").expect("Base URL fixture should parse."),
		)
		.build()
		.expect("Configuration fixture should build.");
		let credentials = Arc::new(CredentialStore::new(
			Arc::new(MemoryStore::default()),
			CredentialKeys::default(),
		));

		if let Some(seed) = seed {
			credentials.store(&seed);
		}

		let http_client = Arc::new(EchoHttpClient::default());

		(RequestDispatcher::new(http_client.clone(), credentials, Arc::new(config)), http_client)
	}

	#[tokio::test]
	async fn send_attaches_stored_bearer_token() {
		let (dispatcher, http_client) = build_dispatcher(Some(Credentials::new("access-1")));
		let outcome = dispatcher.send(&ApiRequest::get("/tenants")).await;

		assert!(matches!(outcome, Outcome::Success(_)));
		assert_eq!(
			http_client.seen.lock().clone(),
			vec![(
				"https://api.example.com/v1/tenants".to_owned(),
				Some("Bearer access-1".to_owned())
			)]
		);
	}

	#[tokio::test]
	async fn send_without_token_omits_header() {
		let (dispatcher, http_client) = build_dispatcher(None);

		dispatcher.send(&ApiRequest::get("plans")).await;

		assert_eq!(http_client.seen.lock()[0].1, None);
	}

	#[tokio::test]
	async fn send_with_overrides_stored_token() {
		let (dispatcher, http_client) = build_dispatcher(Some(Credentials::new("stale")));

		dispatcher.send_with(&ApiRequest::get("plans"), Some(&"fresh".into())).await;

		assert_eq!(http_client.seen.lock()[0].1.as_deref(), Some("Bearer fresh"));
	}

	#[tokio::test]
	async fn non_success_status_passes_through_as_other_error() {
		let (dispatcher, _) = build_dispatcher(None);
		let outcome = dispatcher.send(&ApiRequest::get("missing")).await;

		match outcome {
			Outcome::OtherError(ErrorDetail::Status { status, .. }) =>
				assert_eq!(status, StatusCode::NOT_FOUND),
			other => panic!("Unexpected outcome: {other:?}."),
		}
	}

	#[tokio::test]
	async fn invalid_token_characters_surface_as_config_error() {
		let (dispatcher, http_client) = build_dispatcher(Some(Credentials::new("bad\ntoken")));
		let outcome = dispatcher.send(&ApiRequest::get("plans")).await;

		assert!(matches!(outcome, Outcome::OtherError(ErrorDetail::Config(_))));
		assert!(http_client.seen.lock().is_empty());
	}

	#[test]
	fn status_detail_converts_with_retry_after() {
		let mut headers = HeaderMap::new();

		headers.insert(http::header::RETRY_AFTER, HeaderValue::from_static("30"));

		let detail = ErrorDetail::Status {
			status: StatusCode::SERVICE_UNAVAILABLE,
			headers,
			body: Vec::new(),
		};
		let err = Error::from(detail);

		match err {
			Error::Status { status, retry_after, .. } => {
				assert_eq!(status, 503);
				assert_eq!(retry_after, Some(Duration::seconds(30)));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
