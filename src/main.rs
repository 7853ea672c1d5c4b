//! Demo workload: several green threads counting to different targets while
//! the bootstrap thread counts alongside them.

use std::sync::atomic::{AtomicUsize, Ordering};

const WORKERS: usize = 10;

static FINISHED: AtomicUsize = AtomicUsize::new(0);

fn count_to(target: usize) -> usize {
    let id = clotho::current().expect("worker outside the runtime");
    for i in 0..target {
        if i % 500_000 == 0 {
            println!("thread {id}: counted to {i} of {target}");
        }
        std::hint::black_box(i);
    }
    println!("thread {id}: done");
    FINISHED.fetch_add(1, Ordering::SeqCst);
    target
}

fn main() {
    env_logger::init();

    for n in 0..WORKERS {
        let target = 2_000_000 * (n + 1);
        match clotho::spawn(move || count_to(target)) {
            Ok(id) => println!("spawned thread {id} counting to {target}"),
            Err(e) => eprintln!("spawn failed: {e}"),
        }
    }

    // handle 0 keeps counting until every worker has exited
    let mut i: usize = 0;
    while FINISHED.load(Ordering::SeqCst) < WORKERS {
        if i % 5_000_000 == 0 {
            println!(
                "thread 0: still counting, {} workers left",
                WORKERS - FINISHED.load(Ordering::SeqCst)
            );
        }
        std::hint::black_box(i);
        i = i.wrapping_add(1);
    }

    println!("all workers finished");
}
