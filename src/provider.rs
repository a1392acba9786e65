//! Credential provider contract and the built-in scripted provider.

pub mod scripted;

pub use scripted::*;

// self
use crate::{
	_prelude::*,
	auth::Secret,
	bridge::{ErrorResponse, ReplySink},
};

/// External credential source consulted by the broker.
///
/// Implementations start an out-of-process lookup (IPC to a system credential agent, a keyring
/// daemon, an SSO service) and report exactly one signal through the [`ReplySink`], from any
/// thread and at any later time. They must not block the caller waiting for the lookup: the
/// broker does the waiting. The broker only calls into the provider while it holds its session
/// lock, so at most one request is in flight per broker.
pub trait CredentialProvider
where
	Self: Send + Sync,
{
	/// Looks up the credentials registered for the current user.
	fn request_credentials(&self, reply: ReplySink);

	/// Authenticates with explicit user input.
	///
	/// Providers without an interactive login report a request failure.
	fn login(&self, request: &LoginRequest, reply: ReplySink) {
		let _ = request;
		let _ = reply.request_failed(ErrorResponse::new("login is not supported by this provider"));
	}

	/// Releases the provider connection; called once when the broker closes.
	fn release(&self) {}
}

/// Interactive login parameters forwarded to [`CredentialProvider::login`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginRequest {
	/// Account email address.
	pub email: String,
	/// Account password.
	pub password: Secret,
	/// One-time second-factor code, when the provider asked for one.
	pub two_factor: Option<Secret>,
}
impl LoginRequest {
	/// Creates a login request without a second factor.
	pub fn new(email: impl Into<String>, password: impl Into<Secret>) -> Self {
		Self { email: email.into(), password: password.into(), two_factor: None }
	}

	/// Attaches a one-time second-factor code.
	pub fn with_two_factor(mut self, code: impl Into<Secret>) -> Self {
		self.two_factor = Some(code.into());

		self
	}
}
