//! The process-global runtime cell and the thread lifecycle API:
//! [`spawn`], [`exit`], [`current`] and [`configure`].
//!
//! The green world lives on the OS thread that performs the first
//! successful [`spawn`]; that call also arms the preemption timer for the
//! rest of the process's life.

use crate::error::{Error, Result};
use crate::scheduler::Scheduler;
use crate::timer::{self, PreemptTimer};
use crate::types::{Config, MIN_STACK_SIZE, ThreadId};

struct Runtime {
    scheduler: Scheduler,
    host: nix::unistd::Pid,
    _timer: PreemptTimer,
}

static mut RUNTIME: Option<Box<Runtime>> = None;
static mut PENDING_CONFIG: Option<Config> = None;

/// Replaces the runtime's configuration. Only possible before the first
/// [`spawn`]; the pool capacity, stack size and timer cadence are fixed
/// once the runtime is up.
pub fn configure(config: Config) -> Result<()> {
    unsafe {
        if (*(&raw const RUNTIME)).is_some() {
            return Err(Error::AlreadyInitialized);
        }
    }
    if config.capacity < 2 {
        return Err(Error::InvalidCapacity(config.capacity));
    }
    if config.stack_size < MIN_STACK_SIZE {
        return Err(Error::InvalidStackSize {
            size: config.stack_size,
            min: MIN_STACK_SIZE,
        });
    }
    unsafe {
        *(&raw mut PENDING_CONFIG) = Some(config);
    }
    Ok(())
}

/// Registers a new green thread and makes it eligible on the next
/// round-robin rotation, returning its handle.
///
/// The first successful call initializes the runtime on the calling OS
/// thread: the bootstrap thread becomes handle 0 and the preemption timer
/// is armed, permanently. Later calls must come from that same OS thread.
///
/// Fails with [`Error::PoolExhausted`] when every slot is in use; the pool
/// is left untouched and the call never blocks waiting for a slot. A panic
/// in `f` crosses the thread's `extern "C"` entry frame and aborts the
/// process.
pub fn spawn<F>(f: F) -> Result<ThreadId>
where
    F: FnOnce() -> usize + 'static,
{
    timer::block();
    unsafe {
        let rt_ptr = &raw mut RUNTIME;
        if (*rt_ptr).is_none() {
            let config = (*(&raw mut PENDING_CONFIG)).take().unwrap_or_default();
            let preempt =
                match PreemptTimer::install(preempt_signal, config.initial_delay, config.period) {
                    Ok(preempt) => preempt,
                    Err(e) => {
                        // no degraded mode: without the timer nothing else
                        // would ever run
                        log::error!("failed to initialize the preemption timer: {e}");
                        std::process::exit(1);
                    }
                };
            *rt_ptr = Some(Box::new(Runtime {
                scheduler: Scheduler::bootstrap(config),
                host: nix::unistd::gettid(),
                _timer: preempt,
            }));
            log::debug!(
                "runtime initialized on tid {} (capacity {}, stack {} bytes)",
                nix::unistd::gettid(),
                config.capacity,
                config.stack_size
            );
        }

        let rt = (*rt_ptr).as_deref_mut().unwrap();
        assert_eq!(
            nix::unistd::gettid(),
            rt.host,
            "spawn called off the runtime's host OS thread"
        );
        match rt.scheduler.register(Box::new(f)) {
            Ok(id) => {
                log::trace!("spawned thread {id}, {} live", rt.scheduler.live());
                rt.scheduler.tick();
                Ok(id)
            }
            Err(e) => {
                log::warn!("spawn failed: {e}");
                timer::unblock();
                Err(e)
            }
        }
    }
}

/// Terminates the calling green thread with `value` and never returns;
/// control passes to the next runnable thread. The value is retained in the
/// thread's record but there is no primitive to retrieve it.
///
/// The thread's stack is not freed here: the caller is still executing on
/// it. Reclamation happens the next time the bootstrap thread regains
/// control.
///
/// Panics when called from the bootstrap thread, which must stay
/// schedulable forever, or from outside the runtime.
pub fn exit(value: usize) -> ! {
    timer::block();
    unsafe {
        let rt = (*(&raw mut RUNTIME))
            .as_deref_mut()
            .expect("exit called before any spawn");
        assert_eq!(
            nix::unistd::gettid(),
            rt.host,
            "exit called off the runtime's host OS thread"
        );
        assert_ne!(
            rt.scheduler.current_id(),
            ThreadId(0),
            "the bootstrap thread cannot exit"
        );
        log::trace!(
            "thread {} exiting, {} live after",
            rt.scheduler.current_id(),
            rt.scheduler.live() - 1
        );
        rt.scheduler.finish_current(value);
        rt.scheduler.tick();
    }
    unreachable!("an exited thread was scheduled again")
}

/// The handle of the calling green thread, handle 0 included. `None` before
/// the runtime is initialized and on OS threads other than the host.
pub fn current() -> Option<ThreadId> {
    unsafe {
        let rt = (*(&raw const RUNTIME)).as_deref()?;
        if nix::unistd::gettid() != rt.host {
            return None;
        }
        Some(rt.scheduler.current_id())
    }
}

/// SIGALRM entry: the involuntary tick. The kernel delivers the signal with
/// SIGALRM already blocked, so the tick runs non-preemptibly; the mask is
/// lifted again at the next wake-up point.
extern "C" fn preempt_signal(_signal: i32) {
    unsafe {
        if let Some(rt) = (*(&raw mut RUNTIME)).as_deref_mut() {
            rt.scheduler.tick();
        }
    }
}

/// First-run landing point for every green thread: control arrives here
/// through a synthesized context, with preemption still masked. Runs the
/// stored body and exits with its return value.
#[unsafe(no_mangle)]
extern "C" fn thread_start() -> ! {
    timer::unblock();
    let body = unsafe {
        let rt = (*(&raw mut RUNTIME))
            .as_deref_mut()
            .expect("green thread outside the runtime");
        rt.scheduler
            .take_current_body()
            .expect("first run without a body")
    };
    let value = body();
    exit(value)
}

/// Fabricated return address sitting under every primed stack. The
/// trampoline never returns, so reaching this means the frame above it is
/// already gone.
#[unsafe(no_mangle)]
extern "C" fn thread_land() -> ! {
    std::process::abort()
}
