//! Thread control blocks and the fixed-capacity pool that owns them.
//! Pool indices double as thread handles.

use crate::context::Registers;
use crate::mangle;
use crate::stack::Stack;
use crate::types::{ThreadId, ThreadState};

/// The resumption point and stack pointer to install the first time a
/// thread is scheduled. Stored concealed; revealed only when the scheduler
/// stages the slot for its first run.
pub struct FirstRun {
    entry: u64,
    sp: u64,
}

impl FirstRun {
    pub fn conceal(entry: u64, sp: u64) -> Self {
        FirstRun {
            entry: mangle::conceal(entry),
            sp: mangle::conceal(sp),
        }
    }

    pub fn reveal(self) -> (u64, u64) {
        (mangle::reveal(self.entry), mangle::reveal(self.sp))
    }
}

/// One thread record. The context is undefined until the thread has run
/// past its first resumption; handle 0 owns no stack because the bootstrap
/// thread runs on the process's original one.
pub struct Tcb {
    pub id: ThreadId,
    pub state: ThreadState,
    pub context: Registers,
    pub stack: Option<Stack>,
    pub first_run: Option<FirstRun>,
    pub entry: Option<Box<dyn FnOnce() -> usize>>,
    /// Value supplied at exit, retained after termination. No retrieval
    /// primitive exists yet.
    #[allow(dead_code)]
    pub exit_value: Option<usize>,
}

impl Tcb {
    fn vacant(id: ThreadId) -> Self {
        Tcb {
            id,
            state: ThreadState::Unused,
            context: Registers::default(),
            stack: None,
            first_run: None,
            entry: None,
            exit_value: None,
        }
    }
}

/// Fixed-capacity table of thread records with stable slot addresses.
pub struct Pool {
    slots: Box<[Tcb]>,
}

impl Pool {
    pub fn new(capacity: usize) -> Self {
        Pool {
            slots: (0..capacity).map(|i| Tcb::vacant(ThreadId(i))).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// First-free scan starting past index 0, which is reserved for the
    /// bootstrap thread. Reserves the slot as `Preparing`.
    pub fn allocate(&mut self) -> Option<ThreadId> {
        let idx = (1..self.slots.len()).find(|&i| self.slots[i].state == ThreadState::Unused)?;
        let slot = &mut self.slots[idx];
        slot.state = ThreadState::Preparing;
        slot.exit_value = None;
        Some(ThreadId(idx))
    }

    /// Returns an exited slot to the free pool and drops its stack. The
    /// caller guarantees `id` is not the currently running handle.
    pub fn release(&mut self, id: ThreadId) {
        let slot = &mut self.slots[id.0];
        debug_assert_eq!(slot.id, id);
        debug_assert_eq!(slot.state, ThreadState::Exited);
        slot.state = ThreadState::Unused;
        slot.stack = None;
        slot.first_run = None;
        slot.entry = None;
        slot.context = Registers::default();
    }

    pub fn slot(&self, id: ThreadId) -> &Tcb {
        &self.slots[id.0]
    }

    pub fn slot_mut(&mut self, id: ThreadId) -> &mut Tcb {
        &mut self.slots[id.0]
    }

    pub fn slot_ptr(&mut self, id: ThreadId) -> *mut Tcb {
        &raw mut self.slots[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_distinct_until_full() {
        let mut pool = Pool::new(4);
        assert_eq!(pool.allocate(), Some(ThreadId(1)));
        assert_eq!(pool.allocate(), Some(ThreadId(2)));
        assert_eq!(pool.allocate(), Some(ThreadId(3)));
        assert_eq!(pool.allocate(), None);
        // the failed attempt left the table alone
        for idx in 1..4 {
            assert_eq!(pool.slot(ThreadId(idx)).state, ThreadState::Preparing);
        }
    }

    #[test]
    fn index_zero_is_reserved() {
        let mut pool = Pool::new(2);
        assert_eq!(pool.slot(ThreadId(0)).state, ThreadState::Unused);
        assert_eq!(pool.allocate(), Some(ThreadId(1)));
        assert_eq!(pool.allocate(), None);
        assert_eq!(pool.slot(ThreadId(0)).state, ThreadState::Unused);
    }

    #[test]
    fn release_makes_the_slot_reusable() {
        let mut pool = Pool::new(4);
        while pool.allocate().is_some() {}
        pool.slot_mut(ThreadId(2)).state = ThreadState::Exited;
        pool.release(ThreadId(2));
        assert!(pool.slot(ThreadId(2)).stack.is_none());
        assert_eq!(pool.allocate(), Some(ThreadId(2)));
    }

    #[test]
    fn allocation_order_is_first_free() {
        let mut pool = Pool::new(5);
        while pool.allocate().is_some() {}
        for idx in [3, 1] {
            pool.slot_mut(ThreadId(idx)).state = ThreadState::Exited;
            pool.release(ThreadId(idx));
        }
        assert_eq!(pool.allocate(), Some(ThreadId(1)));
        assert_eq!(pool.allocate(), Some(ThreadId(3)));
    }
}
