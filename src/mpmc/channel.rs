use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_utils::CachePadded;

use crate::mpmc::error::{CloseError, DestroyError, RecvError, SendError, TryRecvError, TrySendErr};
use crate::mpmc::request::{Outcome, Payload, Request};
use crate::mpmc::waiters::WaiterQueue;
use crate::ring::RingBuffer;

/// A cheaply cloneable handle to one bounded channel. Any thread may
/// send or receive through any clone; all clones share the same buffer,
/// waiter queues, and closed flag.
pub struct Channel<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    /// One lock guards the entire channel state. Padded so neighboring
    /// allocations do not share its cache line.
    state: CachePadded<Mutex<State<T>>>,
}

/// Everything behind the channel lock.
pub(crate) struct State<T> {
    pub(crate) ring: RingBuffer<T>,
    /// Monotonic: flips false to true once, never back.
    pub(crate) closed: bool,
    pub(crate) send_waiters: WaiterQueue<T>,
    pub(crate) recv_waiters: WaiterQueue<T>,
}

impl<T> State<T> {
    /// After a successful send: hands the freshly buffered item to the
    /// first receiver still waiting. Entries whose request was already
    /// served elsewhere are discarded along the way, so FIFO order holds
    /// among live waiters.
    pub(crate) fn wake_receiver(&mut self) {
        while let Some(waiter) = self.recv_waiters.pop() {
            let mut req = waiter.request.lock();
            if req.is_decided() {
                waiter.request.unregister(&mut req);
                continue;
            }
            let value = self
                .ring
                .pop()
                .expect("serving a queued receiver from an empty buffer");
            req.store_incoming(waiter.index, value);
            waiter.request.complete(&mut req, Outcome::Delivered, waiter.index);
            waiter.request.unregister(&mut req);
            return;
        }
    }

    /// After a successful receive: lets the first live queued sender
    /// deposit its value into the slot that just freed up.
    pub(crate) fn wake_sender(&mut self) {
        while let Some(waiter) = self.send_waiters.pop() {
            let mut req = waiter.request.lock();
            if req.is_decided() {
                waiter.request.unregister(&mut req);
                continue;
            }
            let value = req.take_outgoing(waiter.index);
            self.ring.push(value);
            waiter.request.complete(&mut req, Outcome::Delivered, waiter.index);
            waiter.request.unregister(&mut req);
            return;
        }
    }

    /// Close-time drain: every waiter in both queues learns that the
    /// channel closed. No buffer operation takes place.
    fn fail_waiters(&mut self) {
        for waiter in self.send_waiters.drain().chain(self.recv_waiters.drain()) {
            let mut req = waiter.request.lock();
            if !req.is_decided() {
                waiter.request.complete(&mut req, Outcome::Closed, waiter.index);
            }
            waiter.request.unregister(&mut req);
        }
    }
}

impl<T> Channel<T> {
    /// Creates a channel with a buffer of exactly `capacity` slots.
    ///
    /// Panics if `capacity` is zero: this channel is buffered only, there
    /// are no rendezvous semantics.
    pub fn with_capacity(capacity: usize) -> Self {
        let state = State {
            ring: RingBuffer::with_capacity(capacity),
            closed: false,
            send_waiters: WaiterQueue::new(),
            recv_waiters: WaiterQueue::new(),
        };
        Self {
            shared: Arc::new(Shared {
                state: CachePadded::new(Mutex::new(state)),
            }),
        }
    }

    /// A panicking client thread must not wedge the channel for everyone
    /// else, so poisoning is ignored.
    pub(crate) fn state(&self) -> MutexGuard<'_, State<T>> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Deposits `value` if the channel is open and the buffer has room,
    /// without ever blocking.
    pub fn try_send(&self, value: T) -> Result<(), TrySendErr<T>> {
        let mut state = self.state();
        if state.closed {
            return Err(TrySendErr::Closed(value));
        }
        if state.ring.is_full() {
            return Err(TrySendErr::Full(value));
        }
        state.ring.push(value);
        state.wake_receiver();
        Ok(())
    }

    /// Retrieves the oldest buffered value if the channel is open and the
    /// buffer holds one, without ever blocking.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut state = self.state();
        if state.closed {
            return Err(TryRecvError::Closed);
        }
        match state.ring.pop() {
            Some(value) => {
                state.wake_sender();
                Ok(value)
            }
            None => Err(TryRecvError::Empty),
        }
    }

    /// Deposits `value`, blocking while the buffer is full. Returns the
    /// value inside the error if the channel closes first.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        let request;
        {
            let mut state = self.state();
            if state.closed {
                return Err(SendError(value));
            }
            if !state.ring.is_full() {
                state.ring.push(value);
                state.wake_receiver();
                return Ok(());
            }
            request = Arc::new(Request::new(Payload::Send(Some(value))));
            let mut req = request.lock();
            state.send_waiters.register(0, &request, &mut req);
        }
        match request.wait().outcome {
            Outcome::Delivered => Ok(()),
            Outcome::Closed => {
                let mut req = request.lock();
                Err(SendError(req.take_outgoing(0)))
            }
        }
    }

    /// Retrieves the oldest buffered value, blocking while the buffer is
    /// empty. Fails once the channel closes.
    pub fn recv(&self) -> Result<T, RecvError> {
        let request;
        {
            let mut state = self.state();
            if state.closed {
                return Err(RecvError);
            }
            if let Some(value) = state.ring.pop() {
                state.wake_sender();
                return Ok(value);
            }
            request = Arc::new(Request::new(Payload::Recv(None)));
            let mut req = request.lock();
            state.recv_waiters.register(0, &request, &mut req);
        }
        match request.wait().outcome {
            Outcome::Delivered => {
                let mut req = request.lock();
                Ok(req.take_incoming(0))
            }
            Outcome::Closed => Err(RecvError),
        }
    }

    /// Closes the channel: every queued sender and receiver wakes with a
    /// closed error, and every future operation fails the same way.
    /// Values still buffered are dropped with the channel, not delivered.
    pub fn close(&self) -> Result<(), CloseError> {
        let mut state = self.state();
        if state.closed {
            return Err(CloseError);
        }
        state.closed = true;
        state.fail_waiters();
        Ok(())
    }

    /// Consumes this handle, validating that the channel was closed
    /// first. On an open channel the handle comes back inside the error
    /// and the channel stays usable. The backing storage is freed when
    /// the last clone drops.
    pub fn destroy(self) -> Result<(), DestroyError<T>> {
        if !self.state().closed {
            return Err(DestroyError(self));
        }
        // close() already emptied both waiter queues
        debug_assert!(self.state().send_waiters.is_empty());
        debug_assert!(self.state().recv_waiters.is_empty());
        Ok(())
    }

    /// Returns the channel capacity.
    pub fn capacity(&self) -> usize {
        self.state().ring.capacity()
    }

    /// Returns the number of buffered values.
    pub fn len(&self) -> usize {
        self.state().ring.len()
    }

    /// Returns true if no value is buffered.
    pub fn is_empty(&self) -> bool {
        self.state().ring.is_empty()
    }

    /// Returns true if the buffer has no free slot.
    pub fn is_full(&self) -> bool {
        self.state().ring.is_full()
    }

    /// Returns true once the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Channel")
            .field("capacity", &state.ring.capacity())
            .field("len", &state.ring.len())
            .field("closed", &state.closed)
            .finish()
    }
}
