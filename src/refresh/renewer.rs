// crates.io
use http::{
	HeaderValue, StatusCode,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenSecret},
	http::{ApiHttpClient, HttpRequest, decode_json},
	refresh::RenewalError,
};

/// Boxed future returned by [`Renewer::renew`].
pub type RenewFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Credentials, RenewalError>> + 'a + Send>>;

/// Performs the renewal network call on behalf of the driver.
pub trait Renewer
where
	Self: Send + Sync,
{
	/// Exchanges `refresh_token` for new credentials. A `None` refresh token in the result
	/// means the backend did not rotate it.
	fn renew<'a>(&'a self, refresh_token: &'a TokenSecret) -> RenewFuture<'a>;
}

#[derive(Serialize)]
struct RenewalRequest<'a> {
	refresh_token: &'a str,
}

/// Renewer that POSTs `{"refresh_token": ...}` as JSON to the configured renewal endpoint and
/// expects `{"access_token": ..., "refresh_token"?: ...}` back.
pub struct HttpRenewer<C>
where
	C: ?Sized + ApiHttpClient,
{
	http_client: Arc<C>,
	endpoint: Url,
}
impl<C> HttpRenewer<C>
where
	C: ?Sized + ApiHttpClient,
{
	const MESSAGE_PREVIEW_LIMIT: usize = 256;

	/// Creates a renewer calling `endpoint` through `http_client`.
	pub fn new(http_client: Arc<C>, endpoint: Url) -> Self {
		Self { http_client, endpoint }
	}

	/// Returns the renewal endpoint.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	fn build_request(&self, refresh_token: &TokenSecret) -> Result<HttpRequest, RenewalError> {
		let body = serde_json::to_vec(&RenewalRequest { refresh_token: refresh_token.expose() })
			.map_err(|e| RenewalError::Transport { message: e.to_string() })?;

		http::Request::post(self.endpoint.as_str())
			.header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
			.header(ACCEPT, HeaderValue::from_static("application/json"))
			.body(body)
			.map_err(|e| RenewalError::Transport { message: e.to_string() })
	}

	fn interpret(status: StatusCode, body: &[u8]) -> Result<Credentials, RenewalError> {
		if !status.is_success() {
			return Err(RenewalError::Rejected {
				status: status.as_u16(),
				message: Self::preview(body),
			});
		}

		let credentials: Credentials = decode_json(body).map_err(|e| {
			RenewalError::MalformedResponse { message: format!("{} at `{}`", e.inner(), e.path()) }
		})?;

		if credentials.access_token.is_empty() {
			return Err(RenewalError::MalformedResponse {
				message: "access_token is empty".into(),
			});
		}

		Ok(credentials)
	}

	fn preview(body: &[u8]) -> String {
		let text = String::from_utf8_lossy(body);
		let trimmed = text.trim();

		match trimmed.char_indices().nth(Self::MESSAGE_PREVIEW_LIMIT) {
			Some((cut, _)) => format!("{}...", &trimmed[..cut]),
			None => trimmed.to_owned(),
		}
	}
}
impl<C> Renewer for HttpRenewer<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn renew<'a>(&'a self, refresh_token: &'a TokenSecret) -> RenewFuture<'a> {
		Box::pin(async move {
			let request = self.build_request(refresh_token)?;
			let response = self
				.http_client
				.execute(request)
				.await
				.map_err(|e| RenewalError::Transport { message: e.to_string() })?;

			Self::interpret(response.status(), response.body())
		})
	}
}
impl<C> Debug for HttpRenewer<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpRenewer").field("endpoint", &self.endpoint.as_str()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::TransportError, http::{HttpResponse, TransportFuture}};

	struct ScriptedHttpClient {
		status: StatusCode,
		body: &'static str,
		requests: Mutex<Vec<(String, Vec<u8>)>>,
	}
	impl ScriptedHttpClient {
		fn answering(status: StatusCode, body: &'static str) -> Arc<Self> {
			Arc::new(Self { status, body, requests: Mutex::new(Vec::new()) })
		}
	}
	impl ApiHttpClient for ScriptedHttpClient {
		fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
			self.requests.lock().push((request.uri().to_string(), request.body().clone()));

			let mut response = HttpResponse::new(self.body.as_bytes().to_vec());

			*response.status_mut() = self.status;

			Box::pin(async move { Ok(response) })
		}
	}

	struct UnreachableHttpClient;
	impl ApiHttpClient for UnreachableHttpClient {
		fn execute(&self, _request: HttpRequest) -> TransportFuture<'_> {
			Box::pin(async {
				Err(TransportError::Io(std::io::Error::other("connection refused")))
			})
		}
	}

	fn endpoint() -> Url {
		Url::parse("https://api.example.com/auth/refresh").expect("Endpoint fixture should parse.")
	}

	#[tokio::test]
	async fn posts_refresh_token_and_parses_rotation() {
		let http_client = ScriptedHttpClient::answering(
			StatusCode::OK,
			r#"{"access_token":"access-new","refresh_token":"refresh-new"}"#,
		);
		let renewer = HttpRenewer::new(http_client.clone(), endpoint());
		let credentials = renewer
			.renew(&TokenSecret::new("refresh-old"))
			.await
			.expect("Renewal should succeed.");

		assert_eq!(credentials.access_token.expose(), "access-new");
		assert_eq!(
			credentials.refresh_token.as_ref().map(TokenSecret::expose),
			Some("refresh-new")
		);

		let requests = http_client.requests.lock().clone();

		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].0, "https://api.example.com/auth/refresh");
		assert_eq!(requests[0].1, br#"{"refresh_token":"refresh-old"}"#.to_vec());
	}

	#[tokio::test]
	async fn non_success_status_is_rejection() {
		let http_client = ScriptedHttpClient::answering(StatusCode::BAD_REQUEST, "invalid refresh");
		let err = HttpRenewer::new(http_client, endpoint())
			.renew(&TokenSecret::new("refresh-old"))
			.await
			.expect_err("HTTP 400 should reject the renewal.");

		assert_eq!(err, RenewalError::Rejected { status: 400, message: "invalid refresh".into() });
	}

	#[tokio::test]
	async fn malformed_payload_is_reported_with_path() {
		let http_client = ScriptedHttpClient::answering(StatusCode::OK, r#"{"token":"x"}"#);
		let err = HttpRenewer::new(http_client, endpoint())
			.renew(&TokenSecret::new("refresh-old"))
			.await
			.expect_err("Payload without access_token should fail.");

		assert!(matches!(err, RenewalError::MalformedResponse { .. }));
	}

	#[tokio::test]
	async fn empty_access_token_is_malformed() {
		let http_client = ScriptedHttpClient::answering(StatusCode::OK, r#"{"access_token":""}"#);
		let err = HttpRenewer::new(http_client, endpoint())
			.renew(&TokenSecret::new("refresh-old"))
			.await
			.expect_err("Empty access_token should fail.");

		assert!(matches!(err, RenewalError::MalformedResponse { .. }));
	}

	#[tokio::test]
	async fn transport_failures_map_to_transport_errors() {
		let err = HttpRenewer::new(Arc::new(UnreachableHttpClient), endpoint())
			.renew(&TokenSecret::new("refresh-old"))
			.await
			.expect_err("Unreachable endpoint should fail.");

		assert!(matches!(err, RenewalError::Transport { .. }));
	}

	#[test]
	fn long_rejection_bodies_are_truncated() {
		let body = "x".repeat(1024);
		let preview = <HttpRenewer<UnreachableHttpClient>>::preview(body.as_bytes());

		assert_eq!(preview.len(), 259);
		assert!(preview.ends_with("..."));
	}
}
