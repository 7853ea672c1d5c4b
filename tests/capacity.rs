//! Pool capacity: filling every slot makes the next spawn fail with
//! `PoolExhausted`, the failure damages nothing, and slots become reusable
//! once their threads exit and are swept.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

static RELEASE: AtomicBool = AtomicBool::new(false);
static DONE: AtomicUsize = AtomicUsize::new(0);

fn worker() -> usize {
    while !RELEASE.load(Ordering::SeqCst) {
        std::hint::spin_loop();
    }
    DONE.fetch_add(1, Ordering::SeqCst);
    0
}

fn main() {
    env_logger::init();

    clotho::configure(
        clotho::Config::builder()
            .capacity(8)
            .period(Duration::from_millis(2))
            .build(),
    )
    .unwrap();

    let mut ids = Vec::new();
    for _ in 0..7 {
        ids.push(clotho::spawn(worker).expect("pool should have room"));
    }
    let mut distinct = ids.clone();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), 7, "handles must be distinct");

    // the pool is full: one bootstrap slot plus seven workers
    match clotho::spawn(worker) {
        Err(clotho::Error::PoolExhausted { capacity }) => assert_eq!(capacity, 8),
        other => panic!("expected PoolExhausted, got {other:?}"),
    }

    // the failed attempt must not have hurt the earlier threads
    RELEASE.store(true, Ordering::SeqCst);
    let start = Instant::now();
    while DONE.load(Ordering::SeqCst) < 7 {
        assert!(start.elapsed() < Duration::from_secs(10), "workers stalled");
        std::hint::black_box(0);
    }

    // give the bootstrap thread a few ticks to sweep the exited slots
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(50) {
        std::hint::black_box(0);
    }

    let reused = clotho::spawn(|| 0).expect("slots should be reusable after reclamation");
    assert!(
        ids.contains(&reused),
        "handle {reused} should come from the reclaimed set"
    );

    println!("capacity: ok");
}
