use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// How a completed request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Exactly one message was transferred.
    Delivered,
    /// A channel in the request's set was closed.
    Closed,
}

/// The final word on a request. Written exactly once, under the request
/// lock, by whichever agent serves or cancels it; that agent is also the
/// one that notifies the owner.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Verdict {
    pub(crate) outcome: Outcome,
    /// Operation-list index of the channel that acted. 0 for
    /// single-channel callers.
    pub(crate) index: usize,
}

/// Payload slot for one proposed operation. The serving side moves the
/// message through here while the owner sleeps.
pub(crate) enum OpSlot<T> {
    /// Value waiting to be deposited, taken by the serving channel.
    Send(Option<T>),
    /// Slot the serving channel stores the retrieved value into.
    Recv(Option<T>),
}

/// What the blocking caller proposed.
pub(crate) enum Payload<T> {
    Send(Option<T>),
    Recv(Option<T>),
    Select(Vec<OpSlot<T>>),
}

pub(crate) struct ReqState<T> {
    pub(crate) payload: Payload<T>,
    /// `None` while the request is still eligible for service.
    pub(crate) verdict: Option<Verdict>,
    /// Queue entries still referencing this request. Memory is `Arc`'s
    /// problem; this counter exists for the liveness rule in
    /// [`Request::unregister`].
    pub(crate) registered: usize,
}

impl<T> ReqState<T> {
    #[inline]
    pub(crate) fn is_decided(&self) -> bool {
        self.verdict.is_some()
    }

    /// Takes the value to deposit for the operation at `index`.
    pub(crate) fn take_outgoing(&mut self, index: usize) -> T {
        let slot = match &mut self.payload {
            Payload::Send(slot) => slot,
            Payload::Select(slots) => match &mut slots[index] {
                OpSlot::Send(slot) => slot,
                OpSlot::Recv(_) => unreachable!("send service on a receive slot"),
            },
            Payload::Recv(_) => unreachable!("send service on a receive request"),
        };
        slot.take().expect("send payload already taken")
    }

    /// Stores a retrieved value for the operation at `index`.
    pub(crate) fn store_incoming(&mut self, index: usize, value: T) {
        let slot = match &mut self.payload {
            Payload::Recv(slot) => slot,
            Payload::Select(slots) => match &mut slots[index] {
                OpSlot::Recv(slot) => slot,
                OpSlot::Send(_) => unreachable!("receive service on a send slot"),
            },
            Payload::Send(_) => unreachable!("receive service on a send request"),
        };
        debug_assert!(slot.is_none());
        *slot = Some(value);
    }

    /// Takes the value a serving channel stored for the operation at
    /// `index`. Owner side, after a `Delivered` verdict on a receive.
    pub(crate) fn take_incoming(&mut self, index: usize) -> T {
        let slot = match &mut self.payload {
            Payload::Recv(slot) => slot,
            Payload::Select(slots) => match &mut slots[index] {
                OpSlot::Recv(slot) => slot,
                OpSlot::Send(_) => unreachable!("delivered receive points at a send slot"),
            },
            Payload::Send(_) => unreachable!("delivered receive on a send request"),
        };
        slot.take().expect("delivered receive with an empty slot")
    }
}

/// The shared record coordinating one blocking call, single-channel or
/// select. Shared between the owning caller and one queue entry per
/// channel it registered with; the last `Arc` release frees it.
///
/// The condvar stands in for a one-shot semaphore: it is notified exactly
/// once, in the same critical section that writes the verdict.
pub(crate) struct Request<T> {
    state: Mutex<ReqState<T>>,
    cond: Condvar,
}

impl<T> Request<T> {
    pub(crate) fn new(payload: Payload<T>) -> Self {
        Self {
            state: Mutex::new(ReqState {
                payload,
                verdict: None,
                registered: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// A panicking client thread must not wedge every other user of the
    /// record, so poisoning is ignored.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ReqState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes the verdict and wakes the owner. The caller has checked
    /// `is_decided` under the same guard, so this is the single writer.
    pub(crate) fn complete(&self, state: &mut ReqState<T>, outcome: Outcome, index: usize) {
        debug_assert!(state.verdict.is_none());
        state.verdict = Some(Verdict { outcome, index });
        self.cond.notify_one();
    }

    /// Drops one queue entry's claim on this request, after the entry's
    /// pop has been handled (service or discard). If that was the last
    /// registration and the request is still undecided, no channel can
    /// ever serve it again, so it fails as closed rather than leaving the
    /// owner asleep.
    pub(crate) fn unregister(&self, state: &mut ReqState<T>) {
        state.registered -= 1;
        if state.registered == 0 && state.verdict.is_none() {
            self.complete(state, Outcome::Closed, 0);
        }
    }

    /// Blocks the owner until some agent writes the verdict. Returns
    /// immediately if it is already in.
    pub(crate) fn wait(&self) -> Verdict {
        let mut state = self.lock();
        loop {
            if let Some(verdict) = state.verdict {
                return verdict;
            }
            state = self
                .cond
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
