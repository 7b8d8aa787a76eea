// Multi-threaded stress tests for the mpmc channel. Thread counts scale
// with the host so the schedules vary from machine to machine.

use std::thread;
use std::time::Duration;

use canale::mpmc::{SelectOp, Selected, channel, select};

/// Every message sent by any producer is received exactly once.
#[test]
fn producers_and_consumers_balance() {
    let producers = num_cpus::get().max(2);
    let per_producer = 1_000;
    let consumers = 2;
    let total = producers * per_producer;
    assert_eq!(total % consumers, 0);

    let ch = channel::<usize>(8);

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let ch = ch.clone();
            thread::spawn(move || {
                for i in 0..per_producer {
                    ch.send(p * per_producer + i).unwrap();
                }
            })
        })
        .collect();

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|_| {
            let ch = ch.clone();
            thread::spawn(move || {
                let mut seen = Vec::with_capacity(total / consumers);
                for _ in 0..total / consumers {
                    seen.push(ch.recv().unwrap());
                }
                seen
            })
        })
        .collect();

    for h in producer_handles {
        h.join().unwrap();
    }
    let mut seen: Vec<usize> = consumer_handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    seen.sort_unstable();

    assert_eq!(seen, (0..total).collect::<Vec<_>>());
}

/// Concurrent selects over two channels: every select fires exactly one
/// receive, and every fed value is delivered exactly once.
#[test]
fn select_delivers_each_value_once() {
    let selectors = 4;
    let per_selector = 500;
    let total = selectors * per_selector;

    let a = channel::<usize>(4);
    let b = channel::<usize>(4);

    let feeder = {
        let (a, b) = (a.clone(), b.clone());
        thread::spawn(move || {
            for value in 0..total {
                if value % 2 == 0 {
                    a.send(value).unwrap();
                } else {
                    b.send(value).unwrap();
                }
            }
        })
    };

    let selector_handles: Vec<_> = (0..selectors)
        .map(|_| {
            let (a, b) = (a.clone(), b.clone());
            thread::spawn(move || {
                let mut seen = Vec::with_capacity(per_selector);
                for _ in 0..per_selector {
                    match select(vec![SelectOp::recv(&a), SelectOp::recv(&b)]).unwrap() {
                        Selected::Received(_, value) => seen.push(value),
                        Selected::Sent(_) => unreachable!("no send was proposed"),
                    }
                }
                seen
            })
        })
        .collect();

    feeder.join().unwrap();
    let mut seen: Vec<usize> = selector_handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    seen.sort_unstable();

    assert_eq!(seen, (0..total).collect::<Vec<_>>());
}

/// Closing releases every blocked sender and receiver within finite time.
#[test]
fn close_releases_all_blockers() {
    let full = channel::<usize>(1);
    full.send(0).unwrap();
    let empty = channel::<usize>(1);

    let senders: Vec<_> = (0..3)
        .map(|i| {
            let full = full.clone();
            thread::spawn(move || full.send(10 + i))
        })
        .collect();
    let receivers: Vec<_> = (0..3)
        .map(|_| {
            let empty = empty.clone();
            thread::spawn(move || empty.recv())
        })
        .collect();

    thread::sleep(Duration::from_millis(100)); // let everyone park
    full.close().unwrap();
    empty.close().unwrap();

    let mut returned: Vec<usize> = senders
        .into_iter()
        .map(|h| h.join().unwrap().expect_err("sender must observe the close").0)
        .collect();
    returned.sort_unstable();
    assert_eq!(returned, vec![10, 11, 12]);

    for h in receivers {
        h.join().unwrap().expect_err("receiver must observe the close");
    }
}
