//! OAuth 1.0a credential payloads handed over by credential providers.

// self
use crate::{_prelude::*, auth::Secret};

/// Errors produced while decoding a raw provider credential payload.
#[derive(Debug, ThisError)]
pub enum CredentialsParseError {
	/// Payload is not a valid credential document.
	#[error("Credential payload is malformed.")]
	Malformed {
		/// Structured parsing failure pointing at the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A required key or secret was present but empty.
	#[error("Credential payload field `{field}` cannot be empty.")]
	EmptyField {
		/// Name of the empty field.
		field: &'static str,
	},
}

/// Consumer and token credentials used to compute OAuth 1.0a signatures.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCredentials {
	/// Consumer key identifying the client.
	pub consumer_key: String,
	/// Consumer secret; never logged.
	pub consumer_secret: Secret,
	/// Token key identifying the user grant.
	pub token_key: String,
	/// Token secret; never logged.
	pub token_secret: Secret,
	/// Human-readable token label assigned by the provider, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_name: Option<String>,
}
impl TokenCredentials {
	/// Creates credentials from their four components.
	pub fn new(
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<Secret>,
		token_key: impl Into<String>,
		token_secret: impl Into<Secret>,
	) -> Self {
		Self {
			consumer_key: consumer_key.into(),
			consumer_secret: consumer_secret.into(),
			token_key: token_key.into(),
			token_secret: token_secret.into(),
			token_name: None,
		}
	}

	/// Attaches the provider-assigned token label.
	pub fn with_token_name(mut self, name: impl Into<String>) -> Self {
		self.token_name = Some(name.into());

		self
	}

	/// Decodes a JSON credential payload received from a provider.
	///
	/// Expected keys are `consumer_key`, `consumer_secret`, `token_key`, `token_secret`, and the
	/// optional `token_name`. Keys and secrets must be non-empty.
	pub fn from_json(payload: &[u8]) -> Result<Self, CredentialsParseError> {
		let mut deserializer = serde_json::Deserializer::from_slice(payload);
		let credentials: Self = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| CredentialsParseError::Malformed { source })?;

		credentials.validate()?;

		Ok(credentials)
	}

	fn validate(&self) -> Result<(), CredentialsParseError> {
		let fields = [
			("consumer_key", self.consumer_key.is_empty()),
			("consumer_secret", self.consumer_secret.is_empty()),
			("token_key", self.token_key.is_empty()),
			("token_secret", self.token_secret.is_empty()),
		];

		match fields.into_iter().find(|(_, empty)| *empty) {
			Some((field, _)) => Err(CredentialsParseError::EmptyField { field }),
			None => Ok(()),
		}
	}
}
impl Debug for TokenCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCredentials")
			.field("consumer_key", &self.consumer_key)
			.field("consumer_secret", &"<redacted>")
			.field("token_key", &self.token_key)
			.field("token_secret", &"<redacted>")
			.field("token_name", &self.token_name)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn from_json_accepts_provider_payload() {
		let payload = br#"{
			"consumer_key": "ck",
			"consumer_secret": "cs",
			"token_key": "tk",
			"token_secret": "ts",
			"token_name": "Ubuntu One @ phone"
		}"#;
		let credentials =
			TokenCredentials::from_json(payload).expect("Provider payload should decode.");

		assert_eq!(credentials.consumer_key, "ck");
		assert_eq!(credentials.consumer_secret.expose(), "cs");
		assert_eq!(credentials.token_key, "tk");
		assert_eq!(credentials.token_secret.expose(), "ts");
		assert_eq!(credentials.token_name.as_deref(), Some("Ubuntu One @ phone"));
	}

	#[test]
	fn from_json_reports_offending_path() {
		let payload = br#"{"consumer_key": "ck", "consumer_secret": 7}"#;
		let err = TokenCredentials::from_json(payload)
			.expect_err("Numeric secrets should be rejected.");

		match err {
			CredentialsParseError::Malformed { source } =>
				assert_eq!(source.path().to_string(), "consumer_secret"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn from_json_rejects_empty_secrets() {
		let payload =
			br#"{"consumer_key": "ck", "consumer_secret": "cs", "token_key": "tk", "token_secret": ""}"#;
		let err =
			TokenCredentials::from_json(payload).expect_err("Empty token secret should fail.");

		assert!(matches!(err, CredentialsParseError::EmptyField { field: "token_secret" }));
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let credentials = TokenCredentials::new("ck", "consumer-secret", "tk", "token-secret");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("ck"));
		assert!(!rendered.contains("consumer-secret"));
		assert!(!rendered.contains("token-secret"));
	}
}
