//! Per-thread stacks: a fixed-size owned allocation plus the layout logic
//! that makes a first transfer of control look like a function call.

use std::alloc::Layout;

/// Fixed-size stack owned by one thread record. There is no guard page;
/// growth past the buffer is undefined behavior.
pub struct Stack {
    ptr: *mut u8,
    layout: Layout,
}

impl Stack {
    pub fn new(size: usize) -> Self {
        let layout = Layout::from_size_align(size, 16).unwrap();
        let ptr = unsafe { std::alloc::alloc(layout) };
        if ptr.is_null() {
            std::alloc::handle_alloc_error(layout);
        }
        Stack { ptr, layout }
    }

    fn top(&self) -> u64 {
        (self.ptr as u64 + self.layout.size() as u64) & !0xf
    }

    /// Lays the buffer out for a first run and returns the initial stack
    /// pointer. Transferring control to an entry function with this stack
    /// pointer installed behaves as if the function had just been called
    /// with `land` as its return address.
    #[cfg(target_arch = "x86_64")]
    pub fn prime(&mut self, land: u64) -> u64 {
        // the word nearest the top is the fabricated return address, so the
        // entry starts with sp % 16 == 8, the psABI state after a call
        let sp = self.top() - 8;
        unsafe { std::ptr::write(sp as *mut u64, land) };
        sp
    }

    /// Lays the buffer out for a first run and returns the initial stack
    /// pointer. AAPCS64 carries the return address in x30, so nothing is
    /// written; the stack pointer starts at the 16-aligned top.
    #[cfg(target_arch = "aarch64")]
    pub fn prime(&mut self, _land: u64) -> u64 {
        self.top()
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        unsafe { std::alloc::dealloc(self.ptr, self.layout) };
    }
}
