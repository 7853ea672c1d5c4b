//! A user-level preemptive green-thread runtime.
//!
//! A fixed pool of threads is multiplexed onto the single OS thread that
//! first calls [`spawn`], scheduled round robin and preempted by a periodic
//! SIGALRM timer. Only one thread runs at any instant; a thread is
//! suspended either by calling [`exit`] or wherever the timer interrupt
//! happens to land.

mod context;
mod error;
mod mangle;
mod runtime;
mod scheduler;
mod stack;
mod tcb;
mod timer;
mod types;

pub use error::{Error, Result};
pub use runtime::{configure, current, exit, spawn};
pub use types::{Config, ConfigBuilder, MIN_STACK_SIZE, ThreadId, ThreadState};
