use std::error::Error;
use std::fmt;

use crate::mpmc::Channel;

/// Error of a non-blocking send. The rejected value comes back to the
/// caller in both variants.
pub enum TrySendErr<T> {
    /// The buffer has no free slot.
    Full(T),
    /// The channel is closed.
    Closed(T),
}

impl<T> TrySendErr<T> {
    /// Recovers the value that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            TrySendErr::Full(value) | TrySendErr::Closed(value) => value,
        }
    }
}

impl<T> fmt::Debug for TrySendErr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendErr::Full(_) => f.write_str("Full(..)"),
            TrySendErr::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> fmt::Display for TrySendErr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendErr::Full(_) => f.write_str("sending into a full channel"),
            TrySendErr::Closed(_) => f.write_str("sending into a closed channel"),
        }
    }
}

impl<T> Error for TrySendErr<T> {}

/// Error of a non-blocking receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// The buffer holds no message.
    Empty,
    /// The channel is closed.
    Closed,
}

impl fmt::Display for TryRecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryRecvError::Empty => f.write_str("receiving from an empty channel"),
            TryRecvError::Closed => f.write_str("receiving from a closed channel"),
        }
    }
}

impl Error for TryRecvError {}

/// A blocking send found the channel closed, either up front or while
/// queued. The undelivered value comes back to the caller.
pub struct SendError<T>(pub T);

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SendError(..)")
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sending into a closed channel")
    }
}

impl<T> Error for SendError<T> {}

/// A blocking receive found the channel closed, either up front or while
/// queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecvError;

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("receiving from a closed channel")
    }
}

impl Error for RecvError {}

/// A select found one of its channels closed. `index` names that channel
/// within the operation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectError {
    pub index: usize,
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel {} in the select set is closed", self.index)
    }
}

impl Error for SelectError {}

/// The channel was already closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseError;

impl fmt::Display for CloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("channel is already closed")
    }
}

impl Error for CloseError {}

/// `destroy` was called on a channel that is not closed yet. The handle
/// comes back to the caller and the channel stays usable.
pub struct DestroyError<T>(pub Channel<T>);

impl<T> fmt::Debug for DestroyError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DestroyError(..)")
    }
}

impl<T> fmt::Display for DestroyError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("destroying a channel that is still open")
    }
}

impl<T> Error for DestroyError<T> {}
