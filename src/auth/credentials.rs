//! Access/refresh token pair issued at sign-in and replaced on every renewal.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Token pair owned by [`CredentialStore`](crate::auth::CredentialStore).
///
/// Deserializes from the backend's login and renewal payloads
/// (`{"access_token": "...", "refresh_token": "..."}`); `refresh_token` may be omitted when
/// the backend does not rotate it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Bearer token attached to every outbound call.
	pub access_token: TokenSecret,
	/// Long-lived token exchanged for a new access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
}
impl Credentials {
	/// Creates credentials carrying only an access token.
	pub fn new(access_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: None }
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(refresh_token.into());

		self
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn renewal_payload_without_refresh_token_parses() {
		let credentials: Credentials = serde_json::from_str("{\"access_token\":\"a-1\"}")
			.expect("Payload without refresh_token should parse.");

		assert_eq!(credentials.access_token.expose(), "a-1");
		assert_eq!(credentials.refresh_token, None);
	}

	#[test]
	fn debug_output_redacts_both_tokens() {
		let credentials = Credentials::new("a-secret").with_refresh_token("r-secret");
		let rendered = format!("{credentials:?}");

		assert!(!rendered.contains("a-secret"));
		assert!(!rendered.contains("r-secret"));
	}
}
