//! Broker-level error types shared across the bridge, signer, and configuration.

// self
use crate::{_prelude::*, bridge::SignalKind};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The provider has no credentials registered for the current user.
	#[error("Credentials not found.")]
	NoCredentials,
	/// The provider demands a second factor this client cannot supply.
	#[error("Two-factor authentication required.")]
	TwoFactorRequired,
	/// Transport or provider-side failure reported by the credential provider.
	#[error("Credential request failed: {reason}.")]
	RequestFailed {
		/// Normalized provider message.
		reason: String,
	},
	/// The provider broke the exactly-once reply contract.
	#[error(transparent)]
	ProtocolViolation(#[from] ProtocolViolation),
	/// No outcome arrived before the configured deadline.
	#[error("Credential request timed out after {after}.")]
	Timeout {
		/// Deadline that elapsed.
		after: Duration,
	},
	/// The broker has been closed and no longer accepts requests.
	#[error("Broker has been closed.")]
	BrokerClosed,
	/// The signing token was used after being released.
	#[error("Signing token has been released.")]
	UseAfterRelease,
	/// The URL handed to the signer cannot be parsed.
	#[error("Request URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The signature cannot be carried in an HTTP header (non-visible-ASCII realm).
	#[cfg(feature = "reqwest")]
	#[error("Signature is not a valid header value.")]
	InvalidHeader {
		/// Underlying header validation failure.
		#[source]
		source: reqwest::header::InvalidHeaderValue,
	},
}
impl Error {
	/// Returns `true` for the terminal outcome kinds a provider can report.
	pub fn is_provider_outcome(&self) -> bool {
		matches!(self, Self::NoCredentials | Self::TwoFactorRequired | Self::RequestFailed { .. })
	}
}

/// Details of a duplicate or unexpected provider signal.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Provider delivered {signal} after request {request_id} was already resolved.")]
pub struct ProtocolViolation {
	/// Broker-scoped identifier of the affected request.
	pub request_id: u64,
	/// Kind of the offending signal.
	pub signal: SignalKind,
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configuration document cannot be parsed.
	#[error("Broker configuration is malformed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Timeout must be a positive duration.
	#[error("The timeout must be positive.")]
	NonPositiveTimeout,
	/// Signing realm was configured but left empty.
	#[error("The signing realm cannot be empty.")]
	EmptyRealm,
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn provider_outcomes_are_classified() {
		assert!(Error::NoCredentials.is_provider_outcome());
		assert!(Error::TwoFactorRequired.is_provider_outcome());
		assert!(Error::RequestFailed { reason: "boom".into() }.is_provider_outcome());
		assert!(!Error::UseAfterRelease.is_provider_outcome());
		assert!(!Error::BrokerClosed.is_provider_outcome());
	}

	#[test]
	fn protocol_violation_renders_request_and_signal() {
		let violation =
			ProtocolViolation { request_id: 7, signal: SignalKind::CredentialsNotFound };
		let err = Error::from(violation.clone());

		assert_eq!(
			err.to_string(),
			"Provider delivered credentials_not_found after request 7 was already resolved."
		);
		assert!(matches!(err, Error::ProtocolViolation(ref inner) if inner == &violation));
	}

	#[test]
	fn invalid_url_exposes_source() {
		let source = Url::parse("not a url").expect_err("Fixture URL should fail to parse.");
		let err = Error::InvalidUrl { source };

		assert!(StdError::source(&err).is_some());
	}
}
