//! Transport primitives for backend calls.
//!
//! [`ApiHttpClient`] is the pipeline's only dependency on an HTTP stack: it executes an
//! [`HttpRequest`] exactly once and hands back whatever the backend answered. Retry policy,
//! credential attachment, and status classification all live above it, so custom transports
//! (test doubles, proxies, non-reqwest stacks) only need to move bytes.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
	header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Request type handed to [`ApiHttpClient::execute`].
pub type HttpRequest = http::Request<Vec<u8>>;
/// Response type returned by [`ApiHttpClient::execute`].
pub type HttpResponse = http::Response<Vec<u8>>;
/// Boxed future returned by [`ApiHttpClient::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports that perform a single backend call.
///
/// Implementations must not retry, follow authentication challenges, or interpret status
/// codes; any HTTP response (including 4xx/5xx) is a successful transport result.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` once.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Transport-agnostic description of a backend call, resolved against the configured base URL
/// at dispatch time.
///
/// The request is cheap to clone so it can be resubmitted after a credential renewal. It never
/// carries the `Authorization` header; the dispatcher attaches the current token per attempt.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the base URL (or an absolute URL).
	pub path: String,
	/// Additional request headers.
	pub headers: HeaderMap,
	/// Raw request body.
	pub body: Vec<u8>,
}
impl ApiRequest {
	/// Creates a body-less request.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), headers: HeaderMap::new(), body: Vec::new() }
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Replaces the raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}

	/// Serializes `payload` as the JSON body and sets matching content headers.
	pub fn json<T>(mut self, payload: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body = serde_json::to_vec(payload)?;
		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Builds the wire request for `url`, attaching `authorization` when present.
	pub(crate) fn to_http(
		&self,
		url: &Url,
		authorization: Option<HeaderValue>,
	) -> Result<HttpRequest, ConfigError> {
		let mut request = http::Request::builder()
			.method(self.method.clone())
			.uri(url.as_str())
			.body(self.body.clone())?;

		request.headers_mut().extend(self.headers.clone());

		if let Some(mut value) = authorization {
			value.set_sensitive(true);
			request.headers_mut().insert(http::header::AUTHORIZATION, value);
		}

		Ok(request)
	}
}

/// Successful (2xx) backend response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Decodes the body as JSON, reporting the failing field path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: serde::de::DeserializeOwned,
	{
		decode_json(&self.body).map_err(|source| Error::Decode { source })
	}

	/// Returns the body as UTF-8 text, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}
impl From<HttpResponse> for ApiResponse {
	fn from(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status, headers: parts.headers, body }
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Backend calls should not follow redirects: a redirect to a login page would otherwise
/// surface as a successful response instead of an unauthorized one. [`ReqwestHttpClient::new`]
/// disables redirect following; configure custom clients passed to
/// [`ReqwestHttpClient::with_client`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client that never follows redirects.
	pub fn new() -> Result<Self, ConfigError> {
		let client =
			ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request)?;
			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

pub(crate) fn decode_json<T>(
	body: &[u8],
) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: serde::de::DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
}

pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(i64::from(secs)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize, PartialEq)]
	struct Tenant {
		id: u32,
		name: String,
	}

	#[test]
	fn json_request_sets_content_headers() {
		let request = ApiRequest::post("tenants")
			.json(&serde_json::json!({ "name": "acme" }))
			.expect("JSON payload should serialize.");

		assert_eq!(request.method, Method::POST);
		assert_eq!(
			request.headers.get(CONTENT_TYPE).map(HeaderValue::as_bytes),
			Some(&b"application/json"[..])
		);
		assert_eq!(request.body, br#"{"name":"acme"}"#.to_vec());
	}

	#[test]
	fn to_http_attaches_sensitive_authorization() {
		let url = Url::parse("https://api.example.com/plans").expect("URL fixture should parse.");
		let request = ApiRequest::get("plans")
			.with_header(ACCEPT, HeaderValue::from_static("application/json"))
			.to_http(&url, Some(HeaderValue::from_static("Bearer abc")))
			.expect("Wire request should build.");
		let authorization = request
			.headers()
			.get(http::header::AUTHORIZATION)
			.expect("Authorization header should be attached.");

		assert_eq!(authorization, "Bearer abc");
		assert!(authorization.is_sensitive());
		assert_eq!(request.uri(), "https://api.example.com/plans");
		assert!(request.headers().contains_key(ACCEPT));
	}

	#[test]
	fn to_http_without_token_omits_authorization() {
		let url = Url::parse("https://api.example.com/plans").expect("URL fixture should parse.");
		let request =
			ApiRequest::get("plans").to_http(&url, None).expect("Wire request should build.");

		assert!(!request.headers().contains_key(http::header::AUTHORIZATION));
	}

	#[test]
	fn response_json_reports_field_path() {
		let response = ApiResponse {
			status: StatusCode::OK,
			headers: HeaderMap::new(),
			body: br#"{"id":"seven","name":"acme"}"#.to_vec(),
		};
		let err = response.json::<Tenant>().expect_err("Mistyped id should fail to decode.");

		match err {
			Error::Decode { source } => assert_eq!(source.path().to_string(), "id"),
			other => panic!("Unexpected error variant: {other:?}."),
		}

		let ok = ApiResponse { body: br#"{"id":7,"name":"acme"}"#.to_vec(), ..response };

		assert_eq!(
			ok.json::<Tenant>().expect("Well-formed body should decode."),
			Tenant { id: 7, name: "acme".into() }
		);
	}

	#[test]
	fn retry_after_accepts_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("120"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(120)));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
	}
}
