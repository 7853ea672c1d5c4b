//! The round-robin scheduler over the fixed TCB pool.
//!
//! Policy methods (`register`, `finish_current`, `reclaim_finished`,
//! `select_next`, `stage_first_run`) are plain state transitions on an owned
//! `Scheduler`, testable without signals or timers. Only [`Scheduler::tick`]
//! touches the context-switch machinery.

use crate::context::{self, Registers};
use crate::error::{Error, Result};
use crate::stack::Stack;
use crate::tcb::{FirstRun, Pool};
use crate::types::{Config, ThreadId, ThreadState};

unsafe extern "C" {
    fn thread_start() -> !;
    fn thread_land() -> !;
}

pub struct Scheduler {
    pool: Pool,
    current: ThreadId,
    active: usize,
    stack_size: usize,
}

impl Scheduler {
    /// Registers the process's own thread as handle 0. It runs on the
    /// original process stack and must stay schedulable forever; the
    /// circular scan in [`Scheduler::select_next`] relies on it.
    pub fn bootstrap(config: Config) -> Self {
        let mut pool = Pool::new(config.capacity);
        pool.slot_mut(ThreadId(0)).state = ThreadState::Ready;
        Scheduler {
            pool,
            current: ThreadId(0),
            active: 1,
            stack_size: config.stack_size,
        }
    }

    pub fn current_id(&self) -> ThreadId {
        self.current
    }

    /// Number of threads that have been registered and not yet exited,
    /// bootstrap included.
    pub fn live(&self) -> usize {
        self.active
    }

    /// Allocates a slot, primes a fresh stack, and parks the concealed
    /// first-run pair plus the thread body in it. The new thread becomes
    /// eligible on the next rotation; no switching happens here.
    pub fn register(&mut self, body: Box<dyn FnOnce() -> usize>) -> Result<ThreadId> {
        let Some(id) = self.pool.allocate() else {
            return Err(Error::PoolExhausted {
                capacity: self.pool.capacity(),
            });
        };
        let mut stack = Stack::new(self.stack_size);
        let sp = stack.prime(thread_land as *const () as u64);
        let slot = self.pool.slot_mut(id);
        slot.stack = Some(stack);
        slot.first_run = Some(FirstRun::conceal(thread_start as *const () as u64, sp));
        slot.entry = Some(body);
        slot.state = ThreadState::FirstReady;
        self.active += 1;
        Ok(id)
    }

    /// Marks the running thread exited and records its value. The stack
    /// stays in place: the thread is still executing on it until the next
    /// tick switches away.
    pub fn finish_current(&mut self, value: usize) {
        let slot = self.pool.slot_mut(self.current);
        slot.state = ThreadState::Exited;
        slot.exit_value = Some(value);
        self.active -= 1;
    }

    pub fn take_current_body(&mut self) -> Option<Box<dyn FnOnce() -> usize>> {
        self.pool.slot_mut(self.current).entry.take()
    }

    /// Sweeps the pool and frees every exited slot. Invoked only while
    /// handle 0 is current, so no stack freed here can be the one in use.
    pub fn reclaim_finished(&mut self) {
        for idx in 0..self.pool.capacity() {
            let id = ThreadId(idx);
            if id != self.current && self.pool.slot(id).state == ThreadState::Exited {
                self.pool.release(id);
            }
        }
    }

    /// Advances `current` circularly until it lands on a runnable slot,
    /// possibly back on the caller. Handle 0 never leaves
    /// {Ready, FirstReady}, so the scan terminates.
    pub fn select_next(&mut self) -> ThreadId {
        loop {
            self.current = ThreadId((self.current.0 + 1) % self.pool.capacity());
            match self.pool.slot(self.current).state {
                ThreadState::Ready | ThreadState::FirstReady => return self.current,
                _ => {}
            }
        }
    }

    /// Converts a never-run slot into a resumable one at the moment it is
    /// chosen: reveals the stored pair and synthesizes the context.
    pub fn stage_first_run(&mut self, id: ThreadId) {
        let slot = self.pool.slot_mut(id);
        if slot.state != ThreadState::FirstReady {
            return;
        }
        let (entry, sp) = slot
            .first_run
            .take()
            .expect("first-ready slot without a staged entry")
            .reveal();
        slot.context = Registers::from_entry(entry, sp);
        slot.state = ThreadState::Ready;
    }

    /// The scheduler tick. Captures the current thread's context, sweeps
    /// exited slots when the bootstrap thread is back in control, rotates,
    /// stages the choice if it has never run, and switches into it.
    ///
    /// The call "returns" only when some later tick restores the context
    /// captured here; preemption is re-enabled at that point, so the thread
    /// wakes exactly where it was switched out with the signal unmasked.
    ///
    /// # Safety
    /// Must run on the runtime's host OS thread with the preemption signal
    /// blocked, and `current` must identify the thread executing this call.
    pub unsafe fn tick(&mut self) {
        let cur = self.pool.slot_ptr(self.current);
        if unsafe { context::save_context(&raw mut (*cur).context) } != 0 {
            // just switched back in
            crate::timer::unblock();
            return;
        }
        if self.current == ThreadId(0) {
            self.reclaim_finished();
        }
        let next = self.select_next();
        self.stage_first_run(next);
        let next = self.pool.slot_ptr(next);
        unsafe { context::restore_context(&raw const (*next).context, 1) }
    }
}
