//! Credential store wrapping the injected key-value capability.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenSecret},
	store::KeyValueStore,
};

/// Storage key names used for the access and refresh tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialKeys {
	/// Key holding the access token.
	pub access: String,
	/// Key holding the refresh token.
	pub refresh: String,
}
impl CredentialKeys {
	/// Creates a key pair with custom names.
	pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self { access: access.into(), refresh: refresh.into() }
	}
}
impl Default for CredentialKeys {
	fn default() -> Self {
		Self::new("access_token", "refresh_token")
	}
}

/// Sole owner of the persisted [`Credentials`].
///
/// Credentials change only on sign-in, on a successful renewal, and when the session is
/// terminated. Empty stored values read back as absent.
pub struct CredentialStore {
	backend: Arc<dyn KeyValueStore>,
	keys: CredentialKeys,
}
impl CredentialStore {
	/// Wraps `backend`, reading and writing under `keys`.
	pub fn new(backend: Arc<dyn KeyValueStore>, keys: CredentialKeys) -> Self {
		Self { backend, keys }
	}

	/// Returns the storage key names in use.
	pub fn keys(&self) -> &CredentialKeys {
		&self.keys
	}

	/// Returns the stored access token, if any.
	pub fn get_access_token(&self) -> Option<TokenSecret> {
		self.read(&self.keys.access)
	}

	/// Returns the stored refresh token, if any.
	pub fn get_refresh_token(&self) -> Option<TokenSecret> {
		self.read(&self.keys.refresh)
	}

	/// Returns both tokens when an access token is stored.
	pub fn credentials(&self) -> Option<Credentials> {
		let access_token = self.get_access_token()?;

		Some(Credentials { access_token, refresh_token: self.get_refresh_token() })
	}

	/// Persists a new access token and, when supplied, a rotated refresh token.
	///
	/// A `None` refresh token leaves the previously stored one untouched.
	pub fn set(&self, access: &TokenSecret, refresh: Option<&TokenSecret>) {
		if let Some(refresh) = refresh {
			self.backend.set(&self.keys.refresh, refresh.expose());
		}

		self.backend.set(&self.keys.access, access.expose());
	}

	/// Persists a full [`Credentials`] value with [`CredentialStore::set`] semantics.
	pub fn store(&self, credentials: &Credentials) {
		self.set(&credentials.access_token, credentials.refresh_token.as_ref());
	}

	/// Removes both tokens.
	pub fn clear(&self) {
		self.backend.remove(&self.keys.access);
		self.backend.remove(&self.keys.refresh);
	}

	fn read(&self, key: &str) -> Option<TokenSecret> {
		self.backend.get(key).filter(|value| !value.is_empty()).map(TokenSecret::from)
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore")
			.field("keys", &self.keys)
			.field("access_token_set", &self.get_access_token().is_some())
			.field("refresh_token_set", &self.get_refresh_token().is_some())
			.finish()
	}
}
