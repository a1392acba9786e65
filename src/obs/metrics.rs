// self
use crate::{
	bridge::SignalKind,
	error::ProtocolViolation,
	obs::{ExchangeKind, ExchangeOutcome},
};

/// Records an exchange outcome via the global metrics recorder (when enabled).
pub fn record_exchange_outcome(kind: ExchangeKind, outcome: ExchangeOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"sso_broker_exchange_total",
			"exchange" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a duplicate provider signal.
pub fn record_protocol_violation(violation: &ProtocolViolation) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		request_id = violation.request_id,
		signal = violation.signal.as_str(),
		"Credential provider delivered more than one signal."
	);

	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"sso_broker_protocol_violation_total",
			"signal" => violation.signal.as_str()
		)
		.increment(1);
	}

	#[cfg(not(any(feature = "tracing", feature = "metrics")))]
	{
		let _ = violation;
	}
}

/// Records a first signal that arrived after its waiter gave up.
pub fn record_late_signal(request_id: u64, signal: SignalKind) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		request_id,
		signal = signal.as_str(),
		"Discarded signal for an abandoned credential request."
	);

	#[cfg(feature = "metrics")]
	{
		metrics::counter!("sso_broker_late_signal_total", "signal" => signal.as_str()).increment(1);
	}

	#[cfg(not(any(feature = "tracing", feature = "metrics")))]
	{
		let _ = (request_id, signal);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_are_noops_without_features() {
		record_exchange_outcome(ExchangeKind::Login, ExchangeOutcome::Failure);
		record_protocol_violation(&ProtocolViolation {
			request_id: 1,
			signal: SignalKind::CredentialsFound,
		});
		record_late_signal(2, SignalKind::RequestFailed);
	}
}
