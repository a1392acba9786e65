// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	auth::TokenCredentials,
	bridge::{CredentialSignal, ErrorResponse, ProtocolMonitor},
	error::ProtocolViolation,
	obs,
};

#[derive(Debug, Default)]
struct SlotState {
	delivered: bool,
	abandoned: bool,
	signal: Option<CredentialSignal>,
	waker: Option<Waker>,
}

#[derive(Debug)]
struct SlotShared {
	request_id: u64,
	state: Mutex<SlotState>,
	ready: Condvar,
	monitor: Arc<ProtocolMonitor>,
}

/// Waiting half of a single-result reply bridge.
///
/// The slot transitions from pending to resolved exactly once. Dropping it before the signal
/// arrives (deadline expiry, cancelled future) marks it abandoned so a late signal is absorbed
/// instead of leaking into another request.
#[derive(Debug)]
pub struct ReplySlot {
	shared: Arc<SlotShared>,
}
impl ReplySlot {
	/// Creates a pending slot for `request_id` reporting violations to `monitor`.
	pub fn new(request_id: u64, monitor: Arc<ProtocolMonitor>) -> Self {
		Self {
			shared: Arc::new(SlotShared {
				request_id,
				state: Default::default(),
				ready: Condvar::new(),
				monitor,
			}),
		}
	}

	/// Broker-scoped identifier of the request this slot belongs to.
	pub fn request_id(&self) -> u64 {
		self.shared.request_id
	}

	/// Returns a provider-facing handle that resolves this slot.
	pub fn sink(&self) -> ReplySink {
		ReplySink { shared: self.shared.clone() }
	}

	/// Blocks the calling thread until the signal arrives or `timeout` elapses.
	///
	/// A timeout too large to represent as an [`Instant`] waits without a deadline.
	pub fn wait(self, timeout: Option<Duration>) -> Result<CredentialSignal> {
		let deadline = timeout.and_then(|after| {
			Instant::now().checked_add(after.unsigned_abs()).map(|deadline| (deadline, after))
		});
		let mut state = self.shared.state.lock();

		loop {
			if let Some(signal) = state.signal.take() {
				return Ok(signal);
			}

			match deadline {
				Some((deadline, after)) =>
					if self.shared.ready.wait_until(&mut state, deadline).timed_out()
						&& state.signal.is_none()
					{
						state.abandoned = true;

						return Err(Error::Timeout { after });
					},
				None => self.shared.ready.wait(&mut state),
			}
		}
	}

	/// Converts the slot into a future resolving with the signal.
	///
	/// The future has no deadline of its own; wrap it in the runtime's timeout and drop it to
	/// abandon the request.
	pub fn into_future(self) -> ReplyFuture {
		ReplyFuture { slot: self }
	}
}
impl Drop for ReplySlot {
	fn drop(&mut self) {
		let mut state = self.shared.state.lock();

		state.abandoned = true;
		state.signal = None;
		state.waker = None;
	}
}

/// Future returned by [`ReplySlot::into_future`].
#[derive(Debug)]
pub struct ReplyFuture {
	slot: ReplySlot,
}
impl Future for ReplyFuture {
	type Output = CredentialSignal;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let mut state = self.slot.shared.state.lock();

		if let Some(signal) = state.signal.take() {
			return Poll::Ready(signal);
		}

		match &state.waker {
			Some(waker) if waker.will_wake(cx.waker()) => {},
			_ => state.waker = Some(cx.waker().clone()),
		}

		Poll::Pending
	}
}

/// Provider-facing half of a reply bridge.
///
/// Safe to clone and to call from any thread. The first signal resolves the request; every
/// further signal is a protocol violation, reported to the broker's monitor and returned as
/// [`Error::ProtocolViolation`].
#[derive(Clone, Debug)]
pub struct ReplySink {
	shared: Arc<SlotShared>,
}
impl ReplySink {
	/// Broker-scoped identifier of the request this sink resolves.
	pub fn request_id(&self) -> u64 {
		self.shared.request_id
	}

	/// Reports that credentials were found.
	pub fn credentials_found(&self, credentials: TokenCredentials) -> Result<()> {
		self.deliver(CredentialSignal::CredentialsFound(credentials))
	}

	/// Reports that no credentials are registered for the current user.
	pub fn credentials_not_found(&self) -> Result<()> {
		self.deliver(CredentialSignal::CredentialsNotFound)
	}

	/// Reports that the provider requires a second factor.
	pub fn two_factor_auth_required(&self) -> Result<()> {
		self.deliver(CredentialSignal::TwoFactorAuthRequired)
	}

	/// Reports a transport or provider-side failure.
	pub fn request_failed(&self, response: ErrorResponse) -> Result<()> {
		self.deliver(CredentialSignal::RequestFailed(response))
	}

	/// Delivers an arbitrary signal.
	pub fn deliver(&self, signal: CredentialSignal) -> Result<()> {
		let kind = signal.kind();
		let mut state = self.shared.state.lock();

		if state.delivered {
			drop(state);

			let violation = ProtocolViolation { request_id: self.shared.request_id, signal: kind };

			self.shared.monitor.report(&violation);

			return Err(violation.into());
		}

		state.delivered = true;

		if state.abandoned {
			drop(state);
			obs::record_late_signal(self.shared.request_id, kind);

			return Ok(());
		}

		state.signal = Some(signal);

		let waker = state.waker.take();

		drop(state);
		self.shared.ready.notify_all();

		if let Some(waker) = waker {
			waker.wake();
		}

		Ok(())
	}
}
