//! Signing tokens handed out by the broker.

// self
use crate::{
	_prelude::*,
	auth::{Presentation, SignatureMethod, SignatureRequest, TokenCredentials, signature},
	config::SigningConfig,
	obs,
};

struct TokenState {
	credentials: RwLock<Option<TokenCredentials>>,
	signing: SigningConfig,
}
impl Drop for TokenState {
	fn drop(&mut self) {
		if let Some(credentials) = self.credentials.get_mut().take() {
			obs::record_unreleased_token(&credentials.consumer_key);
		}
	}
}

/// Capability that signs outbound requests without contacting the credential provider again.
///
/// Clones share the same credentials. [`SigningToken::close`] releases them for every clone;
/// signing afterwards fails with [`Error::UseAfterRelease`]. Dropping the last clone releases
/// the credentials as well. Signing only takes a read lock, so one token can sign from many
/// threads at once.
#[derive(Clone)]
pub struct SigningToken {
	state: Arc<TokenState>,
}
impl SigningToken {
	/// Wraps provider credentials with the signature settings to apply.
	pub fn new(credentials: TokenCredentials, signing: SigningConfig) -> Self {
		Self {
			state: Arc::new(TokenState { credentials: RwLock::new(Some(credentials)), signing }),
		}
	}

	/// Returns an `Authorization` header value for `method` + `url`.
	///
	/// The value has the form `OAuth oauth_consumer_key="...", ..., oauth_signature="..."`.
	pub fn header_signature(&self, method: &str, url: &str) -> Result<String> {
		self.sign(&SignatureRequest::new(method, url), Presentation::Header)
	}

	/// Returns a URL query fragment (`oauth_consumer_key=...&...&oauth_signature=...`) for
	/// `method` + `url`, ready to be appended to the request's query string.
	pub fn query_signature(&self, method: &str, url: &str) -> Result<String> {
		self.sign(&SignatureRequest::new(method, url), Presentation::Query)
	}

	/// Signs an arbitrary request, including form body parameters.
	pub fn sign(&self, request: &SignatureRequest, presentation: Presentation) -> Result<String> {
		let credentials = self.state.credentials.read();
		let credentials = credentials.as_ref().ok_or(Error::UseAfterRelease)?;

		signature::sign(credentials, &self.state.signing, request, presentation)
	}

	/// Consumer key of the underlying credentials.
	pub fn consumer_key(&self) -> Result<String> {
		self.with_credentials(|credentials| credentials.consumer_key.clone())
	}

	/// Provider-assigned token label, if any.
	pub fn token_name(&self) -> Result<Option<String>> {
		self.with_credentials(|credentials| credentials.token_name.clone())
	}

	/// Signature method applied by this token.
	pub fn signature_method(&self) -> SignatureMethod {
		self.state.signing.method
	}

	/// Releases the credentials for this token and all of its clones.
	///
	/// Closing an already released token is a no-op.
	pub fn close(&self) {
		self.state.credentials.write().take();
	}

	/// Returns `true` once [`SigningToken::close`] has been called on any clone.
	pub fn is_released(&self) -> bool {
		self.state.credentials.read().is_none()
	}

	fn with_credentials<T>(&self, f: impl FnOnce(&TokenCredentials) -> T) -> Result<T> {
		self.state.credentials.read().as_ref().map(f).ok_or(Error::UseAfterRelease)
	}
}
impl Debug for SigningToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let credentials = self.state.credentials.read();

		f.debug_struct("SigningToken")
			.field("consumer_key", &credentials.as_ref().map(|c| c.consumer_key.as_str()))
			.field("method", &self.state.signing.method)
			.field("released", &credentials.is_none())
			.finish()
	}
}
