//! Bridge between callback-driven credential providers and a single typed reply.
//!
//! Each broker request owns a [`ReplySlot`]; the provider receives the matching [`ReplySink`]
//! and reports exactly one [`CredentialSignal`] through it, from whichever thread its event loop
//! runs on. The slot can be awaited by blocking the calling thread (optionally with a deadline) or
//! by polling it as a future. A second signal for the same request never reaches the waiter: it is
//! handed to the shared [`ProtocolMonitor`] instead.

mod monitor;
mod response;
mod slot;

pub use monitor::*;
pub use response::*;
pub use slot::*;

// self
use crate::{_prelude::*, auth::TokenCredentials};

/// Terminal outcome reported by a credential provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSignal {
	/// Credentials were found; the payload becomes a signing token.
	CredentialsFound(TokenCredentials),
	/// No credentials are registered for the current user.
	CredentialsNotFound,
	/// The provider requires a second authentication factor.
	TwoFactorAuthRequired,
	/// The lookup failed upstream.
	RequestFailed(ErrorResponse),
}
impl CredentialSignal {
	/// Returns the payload-free kind of this signal.
	pub fn kind(&self) -> SignalKind {
		match self {
			CredentialSignal::CredentialsFound(_) => SignalKind::CredentialsFound,
			CredentialSignal::CredentialsNotFound => SignalKind::CredentialsNotFound,
			CredentialSignal::TwoFactorAuthRequired => SignalKind::TwoFactorAuthRequired,
			CredentialSignal::RequestFailed(_) => SignalKind::RequestFailed,
		}
	}

	/// Converts a non-success signal into the matching broker error.
	///
	/// Returns the credentials unchanged for [`CredentialSignal::CredentialsFound`].
	pub fn into_credentials(self) -> Result<TokenCredentials> {
		match self {
			CredentialSignal::CredentialsFound(credentials) => Ok(credentials),
			CredentialSignal::CredentialsNotFound => Err(Error::NoCredentials),
			CredentialSignal::TwoFactorAuthRequired => Err(Error::TwoFactorRequired),
			CredentialSignal::RequestFailed(response) =>
				Err(Error::RequestFailed { reason: response.reason() }),
		}
	}
}

/// Payload-free label for a [`CredentialSignal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalKind {
	/// `credentialsFound`.
	CredentialsFound,
	/// `credentialsNotFound`.
	CredentialsNotFound,
	/// `twoFactorAuthRequired`.
	TwoFactorAuthRequired,
	/// `requestFailed`.
	RequestFailed,
}
impl SignalKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SignalKind::CredentialsFound => "credentials_found",
			SignalKind::CredentialsNotFound => "credentials_not_found",
			SignalKind::TwoFactorAuthRequired => "two_factor_auth_required",
			SignalKind::RequestFailed => "request_failed",
		}
	}
}
impl Display for SignalKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn signals_map_to_typed_outcomes() {
		let credentials = TokenCredentials::new("ck", "cs", "tk", "ts");

		assert_eq!(
			CredentialSignal::CredentialsFound(credentials.clone())
				.into_credentials()
				.expect("Found credentials should pass through."),
			credentials
		);
		assert!(matches!(
			CredentialSignal::CredentialsNotFound.into_credentials(),
			Err(Error::NoCredentials)
		));
		assert!(matches!(
			CredentialSignal::TwoFactorAuthRequired.into_credentials(),
			Err(Error::TwoFactorRequired)
		));

		let err = CredentialSignal::RequestFailed(ErrorResponse::new(
			"Network::OnReply: Connection refused",
		))
		.into_credentials()
		.expect_err("Failures should map to errors.");

		assert!(matches!(err, Error::RequestFailed { ref reason } if reason == "connection refused"));
	}
}
