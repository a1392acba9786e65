// self
use crate::{
	_prelude::*,
	bridge::SignalKind,
	obs::{ExchangeKind, ExchangeOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedExchange<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedExchange<F> = F;

/// Span covering one provider exchange.
///
/// `request_id`, `signal`, and `outcome` start empty and are filled in as the exchange
/// progresses; a cancelled async exchange leaves `signal` and `outcome` unset.
#[derive(Clone, Debug)]
pub struct ExchangeSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ExchangeSpan {
	/// Creates a new span tagged with the provided exchange kind + stage.
	pub fn new(kind: ExchangeKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"sso_broker.exchange",
				exchange = kind.as_str(),
				stage,
				request_id = tracing::field::Empty,
				signal = tracing::field::Empty,
				outcome = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Records the broker-scoped request id once it is assigned.
	pub fn record_request_id(&self, request_id: u64) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("request_id", request_id);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = request_id;
		}
	}

	/// Records the kind of the first signal the provider delivered.
	pub fn record_signal(&self, signal: SignalKind) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("signal", signal.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = signal;
		}
	}

	/// Records how the exchange ended for the caller.
	pub fn record_outcome(&self, outcome: ExchangeOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> ExchangeSpanGuard {
		#[cfg(feature = "tracing")]
		{
			ExchangeSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			ExchangeSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedExchange<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`ExchangeSpan::entered`].
pub struct ExchangeSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for ExchangeSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ExchangeSpanGuard(..)")
	}
}

/// Flags a signing token that was dropped without an explicit close (debug builds only).
pub fn record_unreleased_token(consumer_key: &str) {
	#[cfg(all(feature = "tracing", debug_assertions))]
	tracing::debug!(consumer_key, "Signing token dropped without an explicit close.");

	#[cfg(not(all(feature = "tracing", debug_assertions)))]
	{
		let _ = consumer_key;
	}
}
