//! Request signing contracts that let callers attach signing tokens to arbitrary HTTP clients.
//!
//! With the `reqwest` feature, [`SigningToken`](crate::auth::SigningToken) signs
//! [`reqwest::Request`] values by inserting an `Authorization` header computed from the request's
//! method and URL. Bodies are opaque to the signer, so form parameters are not covered; use
//! [`SigningToken::sign`](crate::auth::SigningToken::sign) for form posts.

// self
#[cfg(feature = "reqwest")]
use crate::{
	_prelude::*,
	auth::{Presentation, SignatureRequest, SigningToken},
};

/// Describes how to attach a signing token's signature to an outbound request without
/// constraining the HTTP client type.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the provided request and returns it with authentication attached.
	fn sign_request(&self, request: Request) -> Result<Request, Error>;
}

#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::Request, Error> for SigningToken {
	fn sign_request(&self, mut request: reqwest::Request) -> Result<reqwest::Request> {
		let signature = self.sign(
			&SignatureRequest::new(request.method().as_str(), request.url().as_str()),
			Presentation::Header,
		)?;
		let value = reqwest::header::HeaderValue::from_str(&signature)
			.map_err(|source| Error::InvalidHeader { source })?;

		request.headers_mut().insert(reqwest::header::AUTHORIZATION, value);

		Ok(request)
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use reqwest::{Method, header::AUTHORIZATION};
	// self
	use super::*;
	use crate::{auth::TokenCredentials, config::SigningConfig};

	fn token() -> SigningToken {
		SigningToken::new(TokenCredentials::new("ck", "cs", "tk", "ts"), SigningConfig::default())
	}

	#[test]
	fn sign_request_sets_authorization_header() {
		let url = Url::parse("https://example.com/files?page=2").expect("Fixture URL should parse.");
		let request = token()
			.sign_request(reqwest::Request::new(Method::PUT, url))
			.expect("Request should be signed.");
		let header = request
			.headers()
			.get(AUTHORIZATION)
			.expect("Authorization header should be present.")
			.to_str()
			.expect("Authorization header should be ASCII.");

		assert!(header.starts_with("OAuth oauth_consumer_key=\"ck\", "));
		assert!(header.contains(", oauth_signature=\""));
		assert_eq!(request.url().query(), Some("page=2"));
	}

	#[test]
	fn sign_request_fails_after_release() {
		let token = token();

		token.close();

		let url = Url::parse("https://example.com").expect("Fixture URL should parse.");
		let err = token
			.sign_request(reqwest::Request::new(Method::GET, url))
			.expect_err("Released tokens must not sign.");

		assert!(matches!(err, Error::UseAfterRelease));
	}
}
