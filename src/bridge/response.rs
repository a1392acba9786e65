//! Provider failure payloads and their message normalization.

// self
use crate::_prelude::*;

const ON_REPLY_PREFIX: &str = "Network::OnReply:";
const FALLBACK_REASON: &str = "request failed";

/// Failure payload attached to a `requestFailed` signal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
	/// Provider-supplied error message.
	pub message: String,
	/// HTTP reason phrase of the failed upstream call, if any.
	pub http_reason: String,
}
impl ErrorResponse {
	/// Creates a response carrying only a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into(), http_reason: String::new() }
	}

	/// Attaches the HTTP reason phrase.
	pub fn with_http_reason(mut self, reason: impl Into<String>) -> Self {
		self.http_reason = reason.into();

		self
	}

	/// Raw description: the message, else the HTTP reason, else a generic fallback.
	pub fn describe(&self) -> &str {
		if !self.message.is_empty() {
			&self.message
		} else if !self.http_reason.is_empty() {
			&self.http_reason
		} else {
			FALLBACK_REASON
		}
	}

	/// Normalized description surfaced through [`Error::RequestFailed`].
	pub fn reason(&self) -> String {
		normalize_error_message(self.describe())
	}
}

/// Cosmetic normalization applied to provider failure messages.
///
/// Drops the provider library's `Network::OnReply:` prefix (and the spaces after it), then
/// lowercases the first character when it is uppercase and followed by a lowercase letter or
/// whitespace. Acronyms such as `HTTP error` and single-character messages are left alone; the
/// remainder is passed through verbatim.
pub fn normalize_error_message(message: &str) -> String {
	let message = match message.strip_prefix(ON_REPLY_PREFIX) {
		Some(rest) => rest.trim_start_matches(' '),
		None => message,
	};
	let mut chars = message.chars();

	match (chars.next(), chars.next()) {
		(Some(first), Some(second))
			if first.is_uppercase() && (second.is_lowercase() || second.is_whitespace()) =>
		{
			let mut normalized = first.to_lowercase().collect::<String>();

			normalized.push_str(&message[first.len_utf8()..]);

			normalized
		},
		_ => message.to_owned(),
	}
}
