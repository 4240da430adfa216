//! Client configuration: backend location, renewal endpoint, storage keys, and the
//! backend-specific unauthorized signal.

// self
use crate::{_prelude::*, auth::CredentialKeys, error::ConfigError};

/// Errors raised while constructing or validating a [`ClientConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Base URL must use HTTP or HTTPS.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Renewal path cannot be resolved against the base URL.
	#[error("Renewal path `{path}` cannot be resolved against the base URL.")]
	InvalidRenewalPath {
		/// Offending path.
		path: String,
	},
	/// At least one status must signal an unauthorized response.
	#[error("At least one unauthorized status code is required.")]
	NoUnauthorizedStatus,
	/// Unauthorized statuses must be valid HTTP error codes.
	#[error("Status {status} cannot signal an unauthorized response.")]
	InvalidUnauthorizedStatus {
		/// Rejected status code.
		status: u16,
	},
	/// Authorization scheme must be a single non-empty token.
	#[error("Authorization scheme must be a single non-empty token.")]
	InvalidAuthScheme,
}

/// Immutable configuration consumed by [`ApiClient`](crate::client::ApiClient) and
/// [`HttpRenewer`](crate::refresh::HttpRenewer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Backend base URL; always ends with `/`.
	pub base_url: Url,
	/// Fully resolved renewal endpoint.
	pub renewal_endpoint: Url,
	/// Storage keys for the credential pair.
	pub credential_keys: CredentialKeys,
	/// Response statuses classified as recoverable-unauthorized.
	pub unauthorized_statuses: BTreeSet<u16>,
	/// Scheme placed before the access token in the `Authorization` header.
	pub auth_scheme: String,
}
impl ClientConfig {
	/// Creates a new builder for the provided backend base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Returns the renewal endpoint URL.
	pub fn renewal_url(&self) -> Url {
		self.renewal_endpoint.clone()
	}

	/// Resolves a request path against the base URL.
	///
	/// Leading slashes are ignored so `/tenants` and `tenants` both land under the base path;
	/// absolute URLs are returned unchanged.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		join_under(&self.base_url, path)
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	/// Formats the `Authorization` header value for `token`.
	pub fn authorization_value(&self, token: &str) -> String {
		format!("{} {token}", self.auth_scheme)
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Backend base URL.
	pub base_url: Url,
	/// Renewal endpoint path relative to the base URL.
	pub renewal_path: String,
	/// Storage keys for the credential pair.
	pub credential_keys: CredentialKeys,
	/// Statuses classified as recoverable-unauthorized.
	pub unauthorized_statuses: BTreeSet<u16>,
	/// Authorization header scheme.
	pub auth_scheme: String,
}
impl ClientConfigBuilder {
	const DEFAULT_AUTH_SCHEME: &'static str = "Bearer";
	const DEFAULT_RENEWAL_PATH: &'static str = "auth/refresh";

	/// Creates a new builder seeded with defaults.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			renewal_path: Self::DEFAULT_RENEWAL_PATH.into(),
			credential_keys: CredentialKeys::default(),
			unauthorized_statuses: BTreeSet::from([401]),
			auth_scheme: Self::DEFAULT_AUTH_SCHEME.into(),
		}
	}

	/// Overrides the renewal endpoint path.
	pub fn renewal_path(mut self, path: impl Into<String>) -> Self {
		self.renewal_path = path.into();

		self
	}

	/// Overrides the storage key names.
	pub fn credential_keys(mut self, keys: CredentialKeys) -> Self {
		self.credential_keys = keys;

		self
	}

	/// Replaces the set of statuses that signal an expired or invalid access token.
	pub fn unauthorized_statuses<I>(mut self, statuses: I) -> Self
	where
		I: IntoIterator<Item = u16>,
	{
		self.unauthorized_statuses = statuses.into_iter().collect();

		self
	}

	/// Overrides the authorization header scheme.
	pub fn auth_scheme(mut self, scheme: impl Into<String>) -> Self {
		self.auth_scheme = scheme.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") || self.base_url.cannot_be_a_base() {
			return Err(ClientConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.unauthorized_statuses.is_empty() {
			return Err(ClientConfigError::NoUnauthorizedStatus);
		}
		if let Some(status) =
			self.unauthorized_statuses.iter().copied().find(|status| !(400..=599).contains(status))
		{
			return Err(ClientConfigError::InvalidUnauthorizedStatus { status });
		}
		if self.auth_scheme.is_empty() || self.auth_scheme.contains(char::is_whitespace) {
			return Err(ClientConfigError::InvalidAuthScheme);
		}

		let mut base_url = self.base_url;

		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		let renewal_endpoint = join_under(&base_url, &self.renewal_path)
			.map_err(|_| ClientConfigError::InvalidRenewalPath { path: self.renewal_path })?;

		Ok(ClientConfig {
			base_url,
			renewal_endpoint,
			credential_keys: self.credential_keys,
			unauthorized_statuses: self.unauthorized_statuses,
			auth_scheme: self.auth_scheme,
		})
	}
}

fn join_under(base: &Url, path: &str) -> Result<Url, url::ParseError> {
	base.join(path.trim_start_matches('/'))
}
