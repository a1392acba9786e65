//! Credential broker: one provider exchange per call, exactly one typed outcome per exchange.
//!
//! [`Broker::request_token`] asks the provider for the credentials registered on the system and
//! blocks until the provider reports its single outcome (or the configured deadline passes).
//! The broker's session lock is held for the entire exchange, not only while the provider is
//! invoked, so concurrent callers queue up and never interleave provider lookups. Outcomes map
//! onto [`Result`]: found credentials become a [`SigningToken`], every other signal becomes the
//! matching [`Error`]. Nothing is retried automatically.

mod metrics;

pub use metrics::BrokerMetrics;

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	auth::SigningToken,
	bridge::{CredentialSignal, ProtocolMonitor, ReplySink, ReplySlot},
	config::BrokerConfig,
	obs::{self, ExchangeKind, ExchangeOutcome, ExchangeSpan},
	provider::{CredentialProvider, LoginRequest},
};

#[derive(Debug, Default)]
struct Session {
	last_request_id: u64,
}

/// Serializes credential exchanges against a single [`CredentialProvider`].
pub struct Broker<P>
where
	P: ?Sized + CredentialProvider,
{
	provider: Arc<P>,
	config: BrokerConfig,
	monitor: Arc<ProtocolMonitor>,
	metrics: BrokerMetrics,
	session: AsyncMutex<Session>,
	closed: AtomicBool,
}
impl<P> Broker<P>
where
	P: CredentialProvider,
{
	/// Creates a broker with the default configuration.
	pub fn new(provider: P) -> Self {
		Self::build(Arc::new(provider), BrokerConfig::default())
	}

	/// Creates a broker after validating `config`.
	pub fn with_config(provider: P, config: BrokerConfig) -> Result<Self> {
		Self::with_shared_provider(Arc::new(provider), config)
	}
}
impl<P> Broker<P>
where
	P: ?Sized + CredentialProvider,
{
	/// Creates a broker around an already shared (possibly type-erased) provider.
	pub fn with_shared_provider(provider: Arc<P>, config: BrokerConfig) -> Result<Self> {
		config.validate()?;

		Ok(Self::build(provider, config))
	}

	fn build(provider: Arc<P>, config: BrokerConfig) -> Self {
		let monitor = Arc::new(ProtocolMonitor::new(config.violation_policy));

		Self {
			provider,
			config,
			monitor,
			metrics: Default::default(),
			session: Default::default(),
			closed: AtomicBool::new(false),
		}
	}

	/// Requests the credentials registered on the system and returns a signing token.
	///
	/// Blocks the calling thread until the provider answers or the configured deadline passes;
	/// do not call it from an async executor thread, use [`Broker::request_token_async`] there.
	pub fn request_token(&self) -> Result<SigningToken> {
		self.exchange_blocking(ExchangeKind::Credentials, |provider, reply| {
			provider.request_credentials(reply)
		})
	}

	/// Logs in with explicit user input and returns a signing token.
	///
	/// Typically used after [`Error::TwoFactorRequired`] to resubmit with a second factor.
	pub fn login(&self, request: &LoginRequest) -> Result<SigningToken> {
		self.exchange_blocking(ExchangeKind::Login, |provider, reply| provider.login(request, reply))
	}

	/// Async variant of [`Broker::request_token`].
	///
	/// The configured deadline does not apply here; wrap the future in the runtime's timeout.
	/// Dropping the future before it resolves abandons the request and absorbs the late signal.
	pub async fn request_token_async(&self) -> Result<SigningToken> {
		self.exchange_async(ExchangeKind::Credentials, |provider, reply| {
			provider.request_credentials(reply)
		})
		.await
	}

	/// Async variant of [`Broker::login`].
	pub async fn login_async(&self, request: &LoginRequest) -> Result<SigningToken> {
		self.exchange_async(ExchangeKind::Login, |provider, reply| provider.login(request, reply))
			.await
	}

	/// Releases the provider connection.
	///
	/// Waits for an in-flight exchange to finish first. Later requests fail with
	/// [`Error::BrokerClosed`]; closing twice is a no-op.
	pub fn close(&self) {
		let _session = self.session.lock_blocking();

		if !self.closed.swap(true, Ordering::SeqCst) {
			self.provider.release();
		}
	}

	/// Returns `true` once the broker has been closed.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Number of duplicate provider signals observed so far.
	pub fn protocol_violations(&self) -> u64 {
		self.monitor.violations()
	}

	/// Exchange counters.
	pub fn metrics(&self) -> &BrokerMetrics {
		&self.metrics
	}

	/// Active configuration.
	pub fn config(&self) -> &BrokerConfig {
		&self.config
	}

	/// Provider consulted by this broker.
	pub fn provider(&self) -> &Arc<P> {
		&self.provider
	}

	fn exchange_blocking<F>(&self, kind: ExchangeKind, start: F) -> Result<SigningToken>
	where
		F: FnOnce(&P, ReplySink),
	{
		let span = ExchangeSpan::new(kind, "exchange_blocking");
		let _guard = span.clone().entered();

		self.record_attempt(kind);

		let result = self.exchange_locked(&span, start);

		self.record_result(kind, &span, &result);

		result
	}

	fn exchange_locked<F>(&self, span: &ExchangeSpan, start: F) -> Result<SigningToken>
	where
		F: FnOnce(&P, ReplySink),
	{
		let mut session = self.session.lock_blocking();
		let slot = self.begin(&mut session, span, start)?;

		self.complete(span, slot.wait(self.config.timeout))
	}

	async fn exchange_async<F>(&self, kind: ExchangeKind, start: F) -> Result<SigningToken>
	where
		F: FnOnce(&P, ReplySink),
	{
		let span = ExchangeSpan::new(kind, "exchange_async");

		self.record_attempt(kind);

		let result = span
			.instrument(async {
				let mut session = self.session.lock().await;
				let slot = self.begin(&mut session, &span, start)?;
				let signal = slot.into_future().await;

				drop(session);

				self.complete(&span, Ok(signal))
			})
			.await;

		self.record_result(kind, &span, &result);

		result
	}

	fn begin<F>(&self, session: &mut Session, span: &ExchangeSpan, start: F) -> Result<ReplySlot>
	where
		F: FnOnce(&P, ReplySink),
	{
		if self.is_closed() {
			return Err(Error::BrokerClosed);
		}
		if let Some(violation) = self.monitor.poisoned() {
			return Err(violation.into());
		}

		session.last_request_id += 1;

		let slot = ReplySlot::new(session.last_request_id, self.monitor.clone());

		span.record_request_id(slot.request_id());
		start(self.provider.as_ref(), slot.sink());

		Ok(slot)
	}

	fn complete(
		&self,
		span: &ExchangeSpan,
		signal: Result<CredentialSignal>,
	) -> Result<SigningToken> {
		let signal = signal?;

		span.record_signal(signal.kind());

		let credentials = signal.into_credentials()?;

		Ok(SigningToken::new(credentials, self.config.signing.clone()))
	}

	fn record_attempt(&self, kind: ExchangeKind) {
		obs::record_exchange_outcome(kind, ExchangeOutcome::Attempt);
		self.metrics.record_attempt();
	}

	fn record_result(
		&self,
		kind: ExchangeKind,
		span: &ExchangeSpan,
		result: &Result<SigningToken>,
	) {
		match result {
			Ok(_) => {
				span.record_outcome(ExchangeOutcome::Success);
				obs::record_exchange_outcome(kind, ExchangeOutcome::Success);
				self.metrics.record_success();
			},
			Err(err) => {
				span.record_outcome(ExchangeOutcome::Failure);
				obs::record_exchange_outcome(kind, ExchangeOutcome::Failure);
				self.metrics.record_failure();

				if matches!(err, Error::Timeout { .. }) {
					self.metrics.record_timeout();
				}
			},
		}
	}
}
impl<P> Drop for Broker<P>
where
	P: ?Sized + CredentialProvider,
{
	fn drop(&mut self) {
		if !self.closed.swap(true, Ordering::SeqCst) {
			self.provider.release();
		}
	}
}
impl<P> Debug for Broker<P>
where
	P: ?Sized + CredentialProvider,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("config", &self.config)
			.field("closed", &self.is_closed())
			.field("protocol_violations", &self.protocol_violations())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::TokenCredentials,
		bridge::ErrorResponse,
		config::ViolationPolicy,
		provider::{ScriptedProvider, SignalScript},
	};

	fn credentials() -> TokenCredentials {
		TokenCredentials::new("ck", "cs", "tk", "ts")
	}

	#[test]
	fn each_signal_maps_to_its_outcome() {
		let provider = ScriptedProvider::default();

		provider
			.push(SignalScript::found(credentials()))
			.push(SignalScript::not_found())
			.push(SignalScript::two_factor_required())
			.push(SignalScript::failed(ErrorResponse::new("Network::OnReply: Host unreachable")));

		let broker = Broker::new(provider.clone());
		let token = broker.request_token().expect("Found credentials should yield a token.");

		assert_eq!(token.consumer_key().expect("Fresh token should expose its key."), "ck");
		assert!(matches!(broker.request_token(), Err(Error::NoCredentials)));
		assert!(matches!(broker.request_token(), Err(Error::TwoFactorRequired)));
		assert!(matches!(
			broker.request_token(),
			Err(Error::RequestFailed { reason }) if reason == "host unreachable"
		));
		assert_eq!(broker.metrics().attempts(), 4);
		assert_eq!(broker.metrics().successes(), 1);
		assert_eq!(broker.metrics().failures(), 3);
	}

	#[test]
	fn tokens_inherit_signing_config() {
		let provider = ScriptedProvider::default();

		provider.push(SignalScript::found(credentials()));

		let config = BrokerConfig::default().with_realm("Photos");
		let broker = Broker::with_config(provider, config).expect("Config should be valid.");
		let token = broker.request_token().expect("Token request should succeed.");
		let header =
			token.header_signature("GET", "http://example.com").expect("Header should render.");

		assert!(header.starts_with("OAuth realm=\"Photos\", "));
	}

	#[test]
	fn invalid_config_is_rejected() {
		let config = BrokerConfig::default().with_timeout(Duration::ZERO);
		let err = Broker::with_config(ScriptedProvider::default(), config)
			.expect_err("Zero timeout should be rejected.");

		assert!(matches!(err, Error::Config(_)));
	}

	#[test]
	fn close_releases_once_and_rejects_requests() {
		let provider = ScriptedProvider::default();
		let broker = Broker::new(provider.clone());

		broker.close();
		broker.close();

		assert!(broker.is_closed());
		assert_eq!(provider.releases(), 1);
		assert!(matches!(broker.request_token(), Err(Error::BrokerClosed)));
		assert_eq!(provider.requests(), 0);

		drop(broker);

		assert_eq!(provider.releases(), 1);
	}

	#[test]
	fn drop_releases_unclosed_broker() {
		let provider = ScriptedProvider::default();

		drop(Broker::new(provider.clone()));

		assert_eq!(provider.releases(), 1);
	}

	#[test]
	fn type_erased_providers_are_supported() {
		let provider = ScriptedProvider::default();

		provider.push(SignalScript::not_found());

		let shared: Arc<dyn CredentialProvider> = Arc::new(provider);
		let broker = Broker::with_shared_provider(
			shared,
			BrokerConfig::default().with_violation_policy(ViolationPolicy::Ignore),
		)
		.expect("Default config should be valid.");

		assert!(matches!(broker.request_token(), Err(Error::NoCredentials)));
	}
}
