//! Single-sign-on credential broker: bridge a callback-driven credential provider into one typed
//! call and sign outbound requests with the resulting OAuth 1.0a token.
//!
//! ```no_run
//! use sso_broker::{
//! 	auth::TokenCredentials,
//! 	broker::Broker,
//! 	provider::{ScriptedProvider, SignalScript},
//! };
//!
//! let provider = ScriptedProvider::default();
//!
//! provider.push(SignalScript::found(TokenCredentials::new("ck", "cs", "tk", "ts")));
//!
//! let broker = Broker::new(provider);
//! let token = broker.request_token()?;
//! let header = token.header_signature("GET", "https://example.com/api")?;
//!
//! assert!(header.starts_with("OAuth "));
//! # Ok::<(), sso_broker::error::Error>(())
//! ```

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod bridge;
pub mod broker;
pub mod config;
pub mod error;
pub mod ext;
pub mod obs;
pub mod provider;

mod _prelude {
	pub use std::{
		collections::VecDeque,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		task::{Context, Poll, Waker},
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Condvar, Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {httpmock as _, tokio as _};
