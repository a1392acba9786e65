//! Optional observability helpers for broker exchanges.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `sso_broker.exchange` with the `exchange` (request kind),
//!   `stage` (call site), `request_id`, `signal` (first delivered signal kind), and `outcome`
//!   fields, warn events for protocol violations, and debug events for absorbed late signals.
//! - Enable `metrics` to increment `sso_broker_exchange_total` for every attempt/success/failure,
//!   labeled by `exchange` + `outcome`, plus `sso_broker_protocol_violation_total` and
//!   `sso_broker_late_signal_total` labeled by `signal`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Kinds of provider exchanges performed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
	/// Lookup of the credentials already registered on the system.
	Credentials,
	/// Interactive login with email, password, and optional second factor.
	Login,
}
impl ExchangeKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ExchangeKind::Credentials => "credentials",
			ExchangeKind::Login => "login",
		}
	}
}
impl Display for ExchangeKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeOutcome {
	/// Entry to a broker request.
	Attempt,
	/// A signing token was produced.
	Success,
	/// An error was returned to the caller.
	Failure,
}
impl ExchangeOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ExchangeOutcome::Attempt => "attempt",
			ExchangeOutcome::Success => "success",
			ExchangeOutcome::Failure => "failure",
		}
	}
}
impl Display for ExchangeOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
