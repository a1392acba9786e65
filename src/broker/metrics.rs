// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for broker exchanges.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	timeouts: AtomicU64,
}
impl BrokerMetrics {
	/// Returns the total number of token requests and logins.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of exchanges that produced a signing token.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of exchanges that returned an error, timeouts included.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of exchanges that hit the configured deadline.
	pub fn timeouts(&self) -> u64 {
		self.timeouts.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_timeout(&self) {
		self.timeouts.fetch_add(1, Ordering::Relaxed);
	}
}
