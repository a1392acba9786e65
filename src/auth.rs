//! Credential payloads, redacted secrets, OAuth 1.0a signatures, and signing tokens.

pub mod credentials;
pub mod secret;
pub mod signature;
pub mod token;

pub use credentials::*;
pub use secret::*;
pub use signature::*;
pub use token::*;
