//! # canale
//!
//! Blocking bounded channels for communicating between OS threads.
//!
//! The crate provides one flavor, [`mpmc`]: a mutex-guarded bounded
//! channel that any thread can send to and receive from through a
//! cloneable handle, with blocking and non-blocking operations, an
//! explicit close/destroy lifecycle, and a multi-channel
//! [`select`](mpmc::select) that performs exactly one of a set of
//! proposed operations.

pub mod mpmc;
mod ring;
