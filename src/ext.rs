//! Public extension contracts that attach signing tokens to HTTP clients.

pub mod request_signer;

pub use request_signer::*;
