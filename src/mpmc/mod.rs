//! Blocking bounded MPMC channel with multi-channel select
//!
//! A mutex-guarded bounded channel where any thread may send or receive
//! through the same cloneable [`Channel`] handle, with blocking and
//! non-blocking variants, an explicit close/destroy lifecycle, and a
//! multi-way [`select`] that performs exactly one of a set of proposed
//! operations.
//!
//! ## How It Works
//!
//! ```text
//!                ┌────────────────────────────────────┐
//!                │              Channel               │
//!                │   ┌───┬───┬───┬───┐                │
//!   send ──────► │   │ 0 │ 1 │ 2 │ 3 │   RingBuffer   │ ──────► recv
//!                │   └───┴───┴───┴───┘                │
//!                │   send_waiters ──► [w] [w]         │
//!                │   recv_waiters ──► [w]             │
//!                └────────────────────────────────────┘
//! ```
//!
//! One mutex guards the buffer, the closed flag, and two FIFO waiter
//! queues. A blocking caller that finds the buffer full (send) or empty
//! (recv) parks a `Request` record in the matching queue and sleeps on
//! the record's condvar; whichever operation later makes room or delivers
//! an item pops the head waiter and serves it directly, so waiters of
//! each kind complete in blocking order.
//!
//! ## Close
//!
//! [`Channel::close`] is abortive: every parked waiter wakes with a
//! closed error, every later operation fails the same way, and values
//! still buffered are dropped with the channel rather than delivered.
//! [`Channel::destroy`] consumes a handle once the channel is closed.
//!
//! ## Select
//!
//! [`select`] proposes a list of send/receive operations on any number of
//! channels and performs exactly one. One shared `Request` registers with
//! every channel that cannot serve immediately; the first channel that
//! can, claims the record under its lock. Entries left in the other
//! channels' queues are discarded lazily the next time those queues are
//! served, so no retraction pass is needed.
//!
//! ## Example
//!
//! ```
//! use canale::mpmc::{SelectOp, Selected, channel, select};
//!
//! let ch = channel::<i32>(2);
//!
//! ch.send(1).unwrap();
//! ch.send(2).unwrap();
//! assert!(ch.try_send(3).is_err()); // full
//!
//! assert_eq!(ch.recv().unwrap(), 1);
//!
//! let other = channel::<i32>(1);
//! other.send(7).unwrap();
//!
//! // both ready: the lowest index wins
//! match select(vec![SelectOp::recv(&ch), SelectOp::recv(&other)]).unwrap() {
//!     Selected::Received(index, value) => assert_eq!((index, value), (0, 2)),
//!     Selected::Sent(_) => unreachable!(),
//! }
//! ```
mod channel;
mod error;
mod request;
mod select;
mod waiters;

pub use channel::Channel;
pub use error::{CloseError, DestroyError, RecvError, SelectError, SendError, TryRecvError, TrySendErr};
pub use select::{Selected, SelectOp, select};

/// Creates a channel with a buffer of exactly `capacity` slots.
///
/// Panics if `capacity` is zero.
pub fn channel<T>(capacity: usize) -> Channel<T> {
    Channel::with_capacity(capacity)
}
