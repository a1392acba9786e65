// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{_prelude::*, config::ViolationPolicy, error::ProtocolViolation, obs};

/// Shared record of exactly-once violations observed on a broker's reply slots.
#[derive(Debug, Default)]
pub struct ProtocolMonitor {
	policy: ViolationPolicy,
	violations: AtomicU64,
	poisoned: Mutex<Option<ProtocolViolation>>,
}
impl ProtocolMonitor {
	/// Creates a monitor applying `policy` to every reported violation.
	pub fn new(policy: ViolationPolicy) -> Self {
		Self { policy, violations: AtomicU64::new(0), poisoned: Mutex::new(None) }
	}

	/// Number of violations reported so far.
	pub fn violations(&self) -> u64 {
		self.violations.load(Ordering::Relaxed)
	}

	/// First violation that poisoned the broker, if any.
	pub fn poisoned(&self) -> Option<ProtocolViolation> {
		self.poisoned.lock().clone()
	}

	/// Active policy.
	pub fn policy(&self) -> ViolationPolicy {
		self.policy
	}

	pub(crate) fn report(&self, violation: &ProtocolViolation) {
		self.violations.fetch_add(1, Ordering::Relaxed);
		obs::record_protocol_violation(violation);

		match self.policy {
			ViolationPolicy::Poison => {
				self.poisoned.lock().get_or_insert_with(|| violation.clone());
			},
			ViolationPolicy::Ignore => {},
			ViolationPolicy::Abort => {
				// Without tracing the warn event above is a no-op.
				#[cfg(not(feature = "tracing"))]
				eprintln!("sso-broker: {violation}");

				std::process::abort();
			},
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::bridge::SignalKind;

	fn violation(request_id: u64) -> ProtocolViolation {
		ProtocolViolation { request_id, signal: SignalKind::TwoFactorAuthRequired }
	}

	#[test]
	fn poison_keeps_first_violation() {
		let monitor = ProtocolMonitor::new(ViolationPolicy::Poison);

		monitor.report(&violation(1));
		monitor.report(&violation(2));

		assert_eq!(monitor.violations(), 2);
		assert_eq!(monitor.poisoned(), Some(violation(1)));
	}

	#[test]
	fn ignore_only_counts() {
		let monitor = ProtocolMonitor::new(ViolationPolicy::Ignore);

		monitor.report(&violation(3));

		assert_eq!(monitor.violations(), 1);
		assert_eq!(monitor.poisoned(), None);
	}

	#[test]
	fn policy_is_exposed() {
		assert_eq!(ProtocolMonitor::new(ViolationPolicy::Abort).policy(), ViolationPolicy::Abort);
		assert_eq!(ProtocolMonitor::default().policy(), ViolationPolicy::Poison);
	}
}
