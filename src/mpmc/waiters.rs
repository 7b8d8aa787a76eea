use std::collections::VecDeque;
use std::sync::Arc;

use crate::mpmc::request::{ReqState, Request};

/// A channel-side registration: a back-reference to the request plus the
/// caller's index within its operation list (0 for single-channel
/// callers). The entry dies the moment it is popped, whatever the state
/// of its request.
pub(crate) struct Waiter<T> {
    pub(crate) index: usize,
    pub(crate) request: Arc<Request<T>>,
}

/// Strict FIFO of registrations awaiting service: newest at the tail,
/// service pops from the head.
pub(crate) struct WaiterQueue<T> {
    entries: VecDeque<Waiter<T>>,
}

impl<T> WaiterQueue<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers `request` at the tail. The caller holds the request
    /// lock and has already checked that the request is undecided; an
    /// entry must never be enqueued for a decided request.
    pub(crate) fn register(&mut self, index: usize, request: &Arc<Request<T>>, state: &mut ReqState<T>) {
        debug_assert!(!state.is_decided());
        state.registered += 1;
        self.entries.push_back(Waiter {
            index,
            request: Arc::clone(request),
        });
    }

    pub(crate) fn pop(&mut self) -> Option<Waiter<T>> {
        self.entries.pop_front()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Waiter<T>> + '_ {
        self.entries.drain(..)
    }
}

#[cfg(test)]
mod waiters_test {
    use super::*;
    use crate::mpmc::request::Payload;

    /// Entries pop in registration order
    #[test]
    fn test_fifo_order() {
        let mut queue = WaiterQueue::new();
        for index in 0..3 {
            let request = Arc::new(Request::new(Payload::<i32>::Recv(None)));
            let mut state = request.lock();
            queue.register(index, &request, &mut state);
        }
        for index in 0..3 {
            assert_eq!(queue.pop().unwrap().index, index);
        }
        assert!(queue.is_empty());
    }

    /// Registration bumps the entry count on the request
    #[test]
    fn test_register_counts() {
        let mut queue = WaiterQueue::new();
        let request = Arc::new(Request::new(Payload::<i32>::Recv(None)));
        let mut state = request.lock();
        queue.register(0, &request, &mut state);
        queue.register(1, &request, &mut state);
        assert_eq!(state.registered, 2);
        assert_eq!(Arc::strong_count(&request), 3);
    }
}
