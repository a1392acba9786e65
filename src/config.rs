//! Broker and signer configuration.
//!
//! Configuration is plain data with builder-style setters so it can be assembled in code or
//! loaded from a JSON document:
//!
//! ```json
//! { "timeout_ms": 30000, "violation_policy": "poison", "signing": { "method": "HMAC-SHA1" } }
//! ```

// crates.io
use serde::{Deserializer, de::Error as DeError};
// self
use crate::{_prelude::*, auth::SignatureMethod, error::ConfigError};

/// How the broker reacts when a provider delivers more than one signal for a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationPolicy {
	/// Reject every later request with the recorded violation.
	#[default]
	Poison,
	/// Log and count the violation, then keep serving requests.
	Ignore,
	/// Log the violation and abort the process.
	Abort,
}

/// Signature settings applied to every token a broker hands out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
	/// Signature method used for `oauth_signature`.
	pub method: SignatureMethod,
	/// Optional `realm` emitted first in header signatures.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub realm: Option<String>,
}

/// Broker configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
	/// Deadline applied to blocking requests; `None` waits indefinitely.
	#[serde(rename = "timeout_ms", deserialize_with = "deserialize_timeout_ms")]
	pub timeout: Option<Duration>,
	/// Reaction to duplicate provider signals.
	pub violation_policy: ViolationPolicy,
	/// Settings for issued signing tokens.
	pub signing: SigningConfig,
}
impl BrokerConfig {
	/// Parses and validates a JSON configuration document.
	pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(document);
		let config: Self = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ConfigError::Parse { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Sets the blocking request deadline.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Overrides the duplicate-signal policy.
	pub fn with_violation_policy(mut self, policy: ViolationPolicy) -> Self {
		self.violation_policy = policy;

		self
	}

	/// Overrides the signature method.
	pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
		self.signing.method = method;

		self
	}

	/// Sets the realm emitted in header signatures.
	pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
		self.signing.realm = Some(realm.into());

		self
	}

	/// Checks value ranges that serde cannot express.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.timeout.is_some_and(|timeout| !timeout.is_positive()) {
			return Err(ConfigError::NonPositiveTimeout);
		}
		if self.signing.realm.as_deref().is_some_and(str::is_empty) {
			return Err(ConfigError::EmptyRealm);
		}

		Ok(())
	}
}

fn deserialize_timeout_ms<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
	D: Deserializer<'de>,
{
	let Some(millis) = <Option<u64>>::deserialize(deserializer)? else {
		return Ok(None);
	};
	let millis = i64::try_from(millis).map_err(DeError::custom)?;

	Ok(Some(Duration::milliseconds(millis)))
}
