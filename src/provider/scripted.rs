//! Thread-backed [`CredentialProvider`] that replays queued replies, for local development and
//! tests.

// std
use std::{
	sync::atomic::{AtomicU64, AtomicUsize, Ordering},
	thread::{self, JoinHandle},
};
// self
use crate::{
	_prelude::*,
	auth::TokenCredentials,
	bridge::{CredentialSignal, ErrorResponse, ReplySink},
	provider::{CredentialProvider, LoginRequest},
};

/// Signals delivered for one request, in order, after an optional delay.
///
/// A script with more than one signal models a provider that double-fires; a script with none
/// models a provider that never answers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignalScript {
	/// Signals to deliver; only the first one is legal.
	pub signals: Vec<CredentialSignal>,
	/// Time to wait before the first delivery.
	pub delay: Duration,
}
impl SignalScript {
	/// Replies with `credentialsFound`.
	pub fn found(credentials: TokenCredentials) -> Self {
		Self::signal(CredentialSignal::CredentialsFound(credentials))
	}

	/// Replies with `credentialsNotFound`.
	pub fn not_found() -> Self {
		Self::signal(CredentialSignal::CredentialsNotFound)
	}

	/// Replies with `twoFactorAuthRequired`.
	pub fn two_factor_required() -> Self {
		Self::signal(CredentialSignal::TwoFactorAuthRequired)
	}

	/// Replies with `requestFailed`.
	pub fn failed(response: ErrorResponse) -> Self {
		Self::signal(CredentialSignal::RequestFailed(response))
	}

	/// Never replies.
	pub fn silent() -> Self {
		Self::default()
	}

	/// Replies with a single arbitrary signal.
	pub fn signal(signal: CredentialSignal) -> Self {
		Self { signals: vec![signal], delay: Duration::ZERO }
	}

	/// Appends another signal, delivered right after the previous one.
	pub fn then(mut self, signal: CredentialSignal) -> Self {
		self.signals.push(signal);

		self
	}

	/// Delays the first delivery.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;

		self
	}
}

#[derive(Debug, Default)]
struct ScriptedState {
	scripts: Mutex<VecDeque<SignalScript>>,
	logins: Mutex<Vec<LoginRequest>>,
	workers: Mutex<Vec<JoinHandle<()>>>,
	requests: AtomicU64,
	in_flight: AtomicUsize,
	peak_in_flight: AtomicUsize,
	rejected: AtomicUsize,
	releases: AtomicUsize,
	worker_panics: AtomicUsize,
}
impl ScriptedState {
	fn reap(&self, worker: JoinHandle<()>) {
		if worker.join().is_err() {
			self.worker_panics.fetch_add(1, Ordering::Relaxed);
		}
	}
}

/// Provider that answers each request with the next queued [`SignalScript`] from a background
/// thread.
///
/// When the queue is empty the provider reports `requestFailed`. Clones share the queue and the
/// counters, so a test can keep one clone while the broker owns another.
#[derive(Clone, Debug, Default)]
pub struct ScriptedProvider(Arc<ScriptedState>);
impl ScriptedProvider {
	const EXHAUSTED: &'static str = "no scripted reply is queued";

	/// Queues a script for the next request.
	pub fn push(&self, script: SignalScript) -> &Self {
		self.0.scripts.lock().push_back(script);

		self
	}

	/// Total number of lookups and logins received.
	pub fn requests(&self) -> u64 {
		self.0.requests.load(Ordering::Relaxed)
	}

	/// Highest number of requests that were awaiting their first signal at the same time.
	pub fn peak_in_flight(&self) -> usize {
		self.0.peak_in_flight.load(Ordering::SeqCst)
	}

	/// Number of deliveries the reply sink rejected as protocol violations.
	pub fn rejected_deliveries(&self) -> usize {
		self.0.rejected.load(Ordering::Relaxed)
	}

	/// Number of times the provider was released.
	pub fn releases(&self) -> usize {
		self.0.releases.load(Ordering::Relaxed)
	}

	/// Login requests received so far.
	pub fn logins(&self) -> Vec<LoginRequest> {
		self.0.logins.lock().clone()
	}

	/// Number of delivery threads that panicked, counted once they are reaped.
	pub fn worker_panics(&self) -> usize {
		self.0.worker_panics.load(Ordering::Relaxed)
	}

	/// Blocks until every background delivery started so far has finished.
	pub fn join(&self) {
		let workers = std::mem::take(&mut *self.0.workers.lock());

		for worker in workers {
			self.0.reap(worker);
		}
	}

	fn dispatch(&self, reply: ReplySink) {
		let script = self.0.scripts.lock().pop_front().unwrap_or_else(|| {
			SignalScript::failed(ErrorResponse::new(Self::EXHAUSTED))
		});
		let state = self.0.clone();

		state.requests.fetch_add(1, Ordering::Relaxed);

		let in_flight = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

		state.peak_in_flight.fetch_max(in_flight, Ordering::SeqCst);

		let worker = thread::spawn(move || {
			if script.delay.is_positive() {
				thread::sleep(script.delay.unsigned_abs());
			}

			// Leave the in-flight count before the first delivery: the broker may start its next
			// request as soon as the waiter wakes.
			state.in_flight.fetch_sub(1, Ordering::SeqCst);

			for signal in script.signals {
				if reply.deliver(signal).is_err() {
					state.rejected.fetch_add(1, Ordering::Relaxed);
				}
			}
		});

		let finished = {
			let mut workers = self.0.workers.lock();
			let (finished, running) = std::mem::take(&mut *workers)
				.into_iter()
				.partition::<Vec<_>, _>(JoinHandle::is_finished);

			*workers = running;
			workers.push(worker);

			finished
		};

		for worker in finished {
			self.0.reap(worker);
		}
	}
}
impl CredentialProvider for ScriptedProvider {
	fn request_credentials(&self, reply: ReplySink) {
		self.dispatch(reply);
	}

	fn login(&self, request: &LoginRequest, reply: ReplySink) {
		self.0.logins.lock().push(request.clone());
		self.dispatch(reply);
	}

	fn release(&self) {
		self.0.releases.fetch_add(1, Ordering::Relaxed);
	}
}
