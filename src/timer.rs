//! The preemption driver: a SIGALRM handler plus a periodic POSIX timer
//! directed at the OS thread hosting the green threads, and the signal-mask
//! primitive that makes scheduler mutations non-preemptible.

use std::time::Duration;

use nix::sys::signal::{
    self, SaFlags, SigAction, SigEvent, SigHandler, SigSet, SigevNotify, SigmaskHow, Signal,
};
use nix::sys::time::TimeSpec;
use nix::sys::timer::{Expiration, Timer, TimerSetTimeFlags};
use nix::time::ClockId;

use crate::error::{Error, Result};

/// The armed interval timer. Dropping it would disarm the preemption
/// source, so the runtime holds it for the life of the process.
pub struct PreemptTimer {
    _timer: Timer,
}

impl PreemptTimer {
    /// Installs `handler` for SIGALRM and arms a monotonic interval timer
    /// whose expirations are delivered to the calling OS thread: first
    /// firing after `initial`, then every `period`. One-time, never torn
    /// down.
    ///
    /// Delivery is thread-directed rather than process-wide so the tick
    /// always lands on the thread hosting the green world, even when the
    /// process has other OS threads.
    pub fn install(
        handler: extern "C" fn(i32),
        initial: Duration,
        period: Duration,
    ) -> Result<Self> {
        let action = SigAction::new(SigHandler::Handler(handler), SaFlags::empty(), SigSet::empty());
        unsafe { signal::sigaction(Signal::SIGALRM, &action) }.map_err(Error::TimerInit)?;

        let event = SigEvent::new(SigevNotify::SigevThreadId {
            signal: Signal::SIGALRM,
            thread_id: nix::unistd::gettid().as_raw(),
            si_value: 0,
        });
        let mut timer = Timer::new(ClockId::CLOCK_MONOTONIC, event).map_err(Error::TimerInit)?;
        timer
            .set(
                // first expiry comes first, then the repeat interval
                Expiration::IntervalDelayed(
                    TimeSpec::from_duration(initial),
                    TimeSpec::from_duration(period),
                ),
                TimerSetTimeFlags::empty(),
            )
            .map_err(Error::TimerInit)?;

        Ok(PreemptTimer { _timer: timer })
    }
}

fn alarm_set() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGALRM);
    set
}

/// Masks the preemption signal on the calling OS thread. Every mutation of
/// scheduler or pool state outside the tick itself runs between `block` and
/// the next context handoff.
pub fn block() {
    signal::pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&alarm_set()), None).unwrap();
}

/// Lifts the mask again. Called only at the two wake-up points: the
/// resumption branch of the tick and the start of a first run.
pub fn unblock() {
    signal::pthread_sigmask(SigmaskHow::SIG_UNBLOCK, Some(&alarm_set()), None).unwrap();
}

#[cfg(test)]
mod tests {
    use nix::sys::signal::{SigSet, Signal};

    #[test]
    fn block_and_unblock_toggle_the_thread_mask() {
        super::block();
        assert!(SigSet::thread_get_mask().unwrap().contains(Signal::SIGALRM));
        super::unblock();
        assert!(!SigSet::thread_get_mask().unwrap().contains(Signal::SIGALRM));
    }
}
