use std::sync::Arc;

use crate::mpmc::channel::Channel;
use crate::mpmc::error::SelectError;
use crate::mpmc::request::{OpSlot, Outcome, Payload, Request};

/// One proposed operation in a select set.
pub struct SelectOp<'a, T> {
    channel: &'a Channel<T>,
    action: Action<T>,
}

enum Action<T> {
    Send(T),
    Recv,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Send,
    Recv,
}

impl<'a, T> SelectOp<'a, T> {
    /// Proposes depositing `value` into `channel`.
    pub fn send(channel: &'a Channel<T>, value: T) -> Self {
        Self {
            channel,
            action: Action::Send(value),
        }
    }

    /// Proposes retrieving one value from `channel`.
    pub fn recv(channel: &'a Channel<T>) -> Self {
        Self {
            channel,
            action: Action::Recv,
        }
    }
}

/// The one constituent operation a select performed.
#[derive(Debug, PartialEq, Eq)]
pub enum Selected<T> {
    /// The send at this index deposited its value.
    Sent(usize),
    /// The receive at this index retrieved this value.
    Received(usize, T),
}

/// Blocks until exactly one of the proposed operations can be performed,
/// and performs it.
///
/// The operation list is scanned in order, so the lowest index wins among
/// channels that are ready right away; after suspension, the first
/// channel to serve the request wins. A closed channel anywhere in the
/// set is a terminal outcome for the whole call: the error names that
/// channel's index.
///
/// The same channel may appear more than once; registration order
/// guarantees the earlier occurrence is served first and at most one
/// occurrence fires. Send values of operations that did not fire are
/// dropped with the call's coordination record.
///
/// Panics on an empty operation list.
pub fn select<T>(ops: Vec<SelectOp<'_, T>>) -> Result<Selected<T>, SelectError> {
    assert!(!ops.is_empty(), "select needs at least one operation");

    let mut channels = Vec::with_capacity(ops.len());
    let mut directions = Vec::with_capacity(ops.len());
    let mut slots = Vec::with_capacity(ops.len());
    for op in ops {
        channels.push(op.channel);
        match op.action {
            Action::Send(value) => {
                directions.push(Direction::Send);
                slots.push(OpSlot::Send(Some(value)));
            }
            Action::Recv => {
                directions.push(Direction::Recv);
                slots.push(OpSlot::Recv(None));
            }
        }
    }
    let request = Arc::new(Request::new(Payload::Select(slots)));

    // Registration scan. One channel lock plus the request lock at a
    // time, and no channel lock held between iterations, so a concurrent
    // operation on an earlier channel may serve the request mid-scan.
    for (index, channel) in channels.iter().enumerate() {
        let mut state = channel.state();
        let mut req = request.lock();
        if req.is_decided() {
            break;
        }
        if state.closed {
            request.complete(&mut req, Outcome::Closed, index);
            break;
        }
        match directions[index] {
            Direction::Send => {
                if state.ring.is_full() {
                    state.send_waiters.register(index, &request, &mut req);
                } else {
                    let value = req.take_outgoing(index);
                    state.ring.push(value);
                    request.complete(&mut req, Outcome::Delivered, index);
                    drop(req);
                    state.wake_receiver();
                    break;
                }
            }
            Direction::Recv => match state.ring.pop() {
                Some(value) => {
                    req.store_incoming(index, value);
                    request.complete(&mut req, Outcome::Delivered, index);
                    drop(req);
                    state.wake_sender();
                    break;
                }
                None => state.recv_waiters.register(index, &request, &mut req),
            },
        }
    }

    // No-op if the scan already produced a verdict. Entries left in the
    // other channels' queues are discarded lazily by those channels.
    let verdict = request.wait();
    match verdict.outcome {
        Outcome::Closed => Err(SelectError {
            index: verdict.index,
        }),
        Outcome::Delivered => match directions[verdict.index] {
            Direction::Send => Ok(Selected::Sent(verdict.index)),
            Direction::Recv => {
                let mut req = request.lock();
                Ok(Selected::Received(verdict.index, req.take_incoming(verdict.index)))
            }
        },
    }
}
