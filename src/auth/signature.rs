//! OAuth 1.0a (RFC 5849) signature computation in header and query presentation.
//!
//! Every call draws a fresh nonce and timestamp, so two signatures for the same request differ
//! while both verify against the same credentials. The signature base string covers the
//! upper-cased method, the normalized base URI, and every URL query and form parameter together
//! with the protocol parameters, RFC 3986 encoded and sorted by name then value.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac, digest::KeyInit};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, distr::Alphanumeric};
use sha1::Sha1;
use sha2::Sha256;
// self
use crate::{_prelude::*, auth::TokenCredentials, config::SigningConfig};

const NONCE_LEN: usize = 32;
const OAUTH_VERSION: &str = "1.0";
// RFC 3986 unreserved characters stay literal; everything else is percent-encoded.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Signature methods supported by the signer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureMethod {
	/// HMAC over SHA-1, the OAuth 1.0a default.
	#[default]
	#[serde(rename = "HMAC-SHA1")]
	HmacSha1,
	/// HMAC over SHA-256.
	#[serde(rename = "HMAC-SHA256")]
	HmacSha256,
	/// Signing key sent verbatim; only safe over TLS.
	#[serde(rename = "PLAINTEXT")]
	Plaintext,
}
impl SignatureMethod {
	/// Returns the `oauth_signature_method` identifier.
	pub const fn as_str(self) -> &'static str {
		match self {
			SignatureMethod::HmacSha1 => "HMAC-SHA1",
			SignatureMethod::HmacSha256 => "HMAC-SHA256",
			SignatureMethod::Plaintext => "PLAINTEXT",
		}
	}
}
impl Display for SignatureMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Where the signature parameters are meant to travel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Presentation {
	/// `Authorization` header value (`OAuth key="value", ...`).
	Header,
	/// URL query fragment (`key=value&...`).
	Query,
}

/// Request description fed to the signer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureRequest {
	/// HTTP method; upper-cased before signing.
	pub method: String,
	/// Absolute request URL including any query string.
	pub url: String,
	/// Decoded `application/x-www-form-urlencoded` body parameters covered by the signature.
	pub form: Vec<(String, String)>,
}
impl SignatureRequest {
	/// Creates a request for the provided method and URL.
	pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
		Self { method: method.into(), url: url.into(), form: Vec::new() }
	}

	/// Adds one form body parameter.
	pub fn with_form_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.form.push((name.into(), value.into()));

		self
	}

	/// Adds several form body parameters.
	pub fn with_form_params<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.form.extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}
}

/// Signs `request` with a fresh nonce and the current timestamp.
pub(crate) fn sign(
	credentials: &TokenCredentials,
	config: &SigningConfig,
	request: &SignatureRequest,
	presentation: Presentation,
) -> Result<String> {
	let nonce = random_nonce();
	let timestamp = OffsetDateTime::now_utc().unix_timestamp();

	sign_with(credentials, config, request, presentation, &nonce, timestamp)
}

pub(crate) fn sign_with(
	credentials: &TokenCredentials,
	config: &SigningConfig,
	request: &SignatureRequest,
	presentation: Presentation,
	nonce: &str,
	timestamp: i64,
) -> Result<String> {
	let url = Url::parse(&request.url).map_err(|source| Error::InvalidUrl { source })?;
	let method = request.method.to_ascii_uppercase();
	let timestamp = timestamp.to_string();
	let protocol = [
		("oauth_consumer_key", credentials.consumer_key.as_str()),
		("oauth_nonce", nonce),
		("oauth_signature_method", config.method.as_str()),
		("oauth_timestamp", timestamp.as_str()),
		("oauth_token", credentials.token_key.as_str()),
		("oauth_version", OAUTH_VERSION),
	];
	let key = signing_key(credentials);
	let signature = match config.method {
		SignatureMethod::HmacSha1 => {
			let base = base_string(&method, &url, &protocol, &request.form);

			mac_base64::<Hmac<Sha1>>(key.as_bytes(), base.as_bytes())
		},
		SignatureMethod::HmacSha256 => {
			let base = base_string(&method, &url, &protocol, &request.form);

			mac_base64::<Hmac<Sha256>>(key.as_bytes(), base.as_bytes())
		},
		SignatureMethod::Plaintext => key,
	};

	Ok(render(presentation, config.realm.as_deref(), &protocol, &signature))
}

fn random_nonce() -> String {
	rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}

fn encode(value: &str) -> String {
	utf8_percent_encode(value, UNRESERVED).to_string()
}

fn signing_key(credentials: &TokenCredentials) -> String {
	format!(
		"{}&{}",
		encode(credentials.consumer_secret.expose()),
		encode(credentials.token_secret.expose())
	)
}

fn base_uri(url: &Url) -> String {
	let host = url.host_str().unwrap_or_default();

	match url.port() {
		Some(port) => format!("{}://{host}:{port}{}", url.scheme(), url.path()),
		None => format!("{}://{host}{}", url.scheme(), url.path()),
	}
}

fn base_string(
	method: &str,
	url: &Url,
	protocol: &[(&str, &str)],
	form: &[(String, String)],
) -> String {
	let mut params = url
		.query_pairs()
		.map(|(k, v)| (encode(&k), encode(&v)))
		.chain(form.iter().map(|(k, v)| (encode(k), encode(v))))
		.chain(protocol.iter().map(|(k, v)| (encode(k), encode(v))))
		.collect::<Vec<_>>();

	params.sort();

	let normalized = params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");

	format!("{method}&{}&{}", encode(&base_uri(url)), encode(&normalized))
}

fn mac_base64<M>(key: &[u8], message: &[u8]) -> String
where
	M: Mac + KeyInit,
{
	let mut mac = <M as Mac>::new_from_slice(key).expect("HMAC accepts keys of any length.");

	mac.update(message);

	STANDARD.encode(mac.finalize().into_bytes())
}

// RFC 7230 quoted-string escaping; realm is the only unencoded header value.
fn quote(value: &str) -> String {
	let mut quoted = String::with_capacity(value.len());

	for c in value.chars() {
		if matches!(c, '"' | '\\') {
			quoted.push('\\');
		}

		quoted.push(c);
	}

	quoted
}

fn render(
	presentation: Presentation,
	realm: Option<&str>,
	protocol: &[(&str, &str)],
	signature: &str,
) -> String {
	match presentation {
		Presentation::Header => {
			let mut parts = Vec::with_capacity(protocol.len() + 2);

			if let Some(realm) = realm {
				parts.push(format!("realm=\"{}\"", quote(realm)));
			}

			parts.extend(protocol.iter().map(|(k, v)| format!("{k}=\"{}\"", encode(v))));
			parts.push(format!("oauth_signature=\"{}\"", encode(signature)));

			format!("OAuth {}", parts.join(", "))
		},
		Presentation::Query => {
			let mut parts = protocol
				.iter()
				.map(|(k, v)| format!("{k}={}", encode(v)))
				.collect::<Vec<_>>();

			parts.push(format!("oauth_signature={}", encode(signature)));

			parts.join("&")
		},
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
	const TIMESTAMP: i64 = 1_318_622_958;

	fn reference_credentials() -> TokenCredentials {
		TokenCredentials::new(
			"xvz1evFS4wEEPTGEFPHBog",
			"kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
			"370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
			"LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
		)
	}

	fn reference_request() -> SignatureRequest {
		SignatureRequest::new(
			"post",
			"https://api.twitter.com/1/statuses/update.json?include_entities=true",
		)
		.with_form_param("status", "Hello Ladies + Gentlemen, a signed OAuth request!")
	}

	#[test]
	fn hmac_sha1_matches_reference_vector() {
		let header = sign_with(
			&reference_credentials(),
			&SigningConfig::default(),
			&reference_request(),
			Presentation::Header,
			NONCE,
			TIMESTAMP,
		)
		.expect("Reference request should sign.");

		assert_eq!(
			header,
			"OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\", \
			 oauth_nonce=\"kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg\", \
			 oauth_signature_method=\"HMAC-SHA1\", oauth_timestamp=\"1318622958\", \
			 oauth_token=\"370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb\", \
			 oauth_version=\"1.0\", oauth_signature=\"tnnArxj06cWHq44gCs1OSKk%2FjLY%3D\""
		);
	}

	#[test]
	fn query_presentation_carries_same_signature() {
		let query = sign_with(
			&reference_credentials(),
			&SigningConfig::default(),
			&reference_request(),
			Presentation::Query,
			NONCE,
			TIMESTAMP,
		)
		.expect("Reference request should sign.");

		assert!(query.starts_with("oauth_consumer_key=xvz1evFS4wEEPTGEFPHBog&"));
		assert!(query.ends_with("&oauth_signature=tnnArxj06cWHq44gCs1OSKk%2FjLY%3D"));
	}

	#[test]
	fn base_string_normalizes_uri_and_sorts_params() {
		let url = Url::parse("HTTP://Example.COM:80/r%20v/X?b=2&a=3&a=1")
			.expect("Fixture URL should parse.");
		let base = base_string("GET", &url, &[("oauth_token", "t")], &[]);

		assert_eq!(
			base,
			"GET&http%3A%2F%2Fexample.com%2Fr%2520v%2FX&a%3D1%26a%3D3%26b%3D2%26oauth_token%3Dt"
		);
	}

	#[test]
	fn base_uri_keeps_non_default_port() {
		let url = Url::parse("https://example.com:8443/path?q=1").expect("URL should parse.");

		assert_eq!(base_uri(&url), "https://example.com:8443/path");
	}

	#[test]
	fn plaintext_uses_encoded_signing_key() {
		let credentials = TokenCredentials::new("ck", "c&s", "tk", "t s");
		let config = SigningConfig { method: SignatureMethod::Plaintext, realm: None };
		let query = sign_with(
			&credentials,
			&config,
			&SignatureRequest::new("GET", "http://example.com"),
			Presentation::Query,
			"nonce",
			1,
		)
		.expect("Plaintext signature should render.");

		assert!(query.contains("oauth_signature_method=PLAINTEXT"));
		assert!(query.ends_with("&oauth_signature=c%2526s%26t%2520s"));
	}

	#[test]
	fn hmac_sha256_differs_from_sha1() {
		let request = SignatureRequest::new("GET", "http://example.com");
		let sha1 = sign_with(
			&reference_credentials(),
			&SigningConfig::default(),
			&request,
			Presentation::Query,
			NONCE,
			TIMESTAMP,
		)
		.expect("SHA-1 signature should render.");
		let sha256 = sign_with(
			&reference_credentials(),
			&SigningConfig { method: SignatureMethod::HmacSha256, realm: None },
			&request,
			Presentation::Query,
			NONCE,
			TIMESTAMP,
		)
		.expect("SHA-256 signature should render.");

		assert!(sha256.contains("oauth_signature_method=HMAC-SHA256"));
		assert_ne!(sha1, sha256);
	}

	#[test]
	fn header_places_realm_first() {
		let config =
			SigningConfig { method: SignatureMethod::HmacSha1, realm: Some("Photos".into()) };
		let header = sign_with(
			&reference_credentials(),
			&config,
			&SignatureRequest::new("GET", "http://example.com"),
			Presentation::Header,
			NONCE,
			TIMESTAMP,
		)
		.expect("Header should render.");

		assert!(header.starts_with("OAuth realm=\"Photos\", oauth_consumer_key="));
	}

	#[test]
	fn header_realm_is_quoted() {
		let config = SigningConfig {
			method: SignatureMethod::HmacSha1,
			realm: Some(r#"My "Photos" \ Co"#.into()),
		};
		let header = sign_with(
			&reference_credentials(),
			&config,
			&SignatureRequest::new("GET", "http://example.com"),
			Presentation::Header,
			NONCE,
			TIMESTAMP,
		)
		.expect("Header should render.");

		assert!(header.starts_with(r#"OAuth realm="My \"Photos\" \\ Co", oauth_consumer_key="#));
	}

	#[test]
	fn invalid_url_is_rejected() {
		let err = sign(
			&reference_credentials(),
			&SigningConfig::default(),
			&SignatureRequest::new("GET", "example.com/no-scheme"),
			Presentation::Header,
		)
		.expect_err("Relative URLs cannot be signed.");

		assert!(matches!(err, Error::InvalidUrl { .. }));
	}

	#[test]
	fn nonces_vary_per_call() {
		let first = random_nonce();
		let second = random_nonce();

		assert_eq!(first.len(), NONCE_LEN);
		assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(first, second);
	}

	#[test]
	fn signature_method_serde_uses_wire_names() {
		let encoded = serde_json::to_string(&SignatureMethod::HmacSha256)
			.expect("Signature method should serialize.");

		assert_eq!(encoded, "\"HMAC-SHA256\"");
		assert_eq!(
			serde_json::from_str::<SignatureMethod>("\"PLAINTEXT\"")
				.expect("Wire name should deserialize."),
			SignatureMethod::Plaintext
		);
	}
}
