//! Bearer and refresh token values that never render in logs.

// self
use crate::_prelude::*;

/// One half of the stored credential pair.
///
/// `Debug` and `Display` print `<redacted>`; the raw value is only reachable through
/// [`TokenSecret::expose`], which the dispatcher uses to build the `Authorization` header and the
/// renewer uses for the renewal body. On the wire and in storage it is a bare JSON string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a token value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw token for header or body construction.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` for an empty token, which the credential store treats as absent.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::Credentials;

	#[test]
	fn credential_pair_debug_output_hides_both_tokens() {
		let credentials = Credentials::new("access-abc").with_refresh_token("refresh-xyz");
		let rendered = format!("{credentials:?}");

		assert!(!rendered.contains("access-abc"));
		assert!(!rendered.contains("refresh-xyz"));
		assert_eq!(format!("{}", credentials.access_token), "<redacted>");
	}

	#[test]
	fn renewal_body_field_is_a_bare_string() {
		let renewed: Credentials = serde_json::from_str(r#"{"access_token":"access-abc"}"#)
			.expect("Renewal payload should decode.");

		assert_eq!(renewed.access_token.expose(), "access-abc");
		assert!(!renewed.access_token.is_empty());
		assert_eq!(
			serde_json::to_string(&renewed.access_token).expect("Token should serialize."),
			"\"access-abc\""
		);
	}
}
