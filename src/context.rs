//! Execution contexts: the callee-saved register snapshot that makes a
//! suspended thread resumable, plus the external assembly that captures and
//! restores one.

#[cfg(target_arch = "x86_64")]
#[repr(C)]
#[derive(Debug, Default)]
pub struct Registers {
    pub rbx: u64,
    pub rbp: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    pub rsp: u64,
    /// Resumption point: where control lands when this context is restored.
    pub rdx: u64,
}

#[cfg(target_arch = "aarch64")]
#[repr(C)]
#[derive(Debug, Default)]
pub struct Registers {
    // Floating-point registers d8-d15, stored in pairs
    pub d8_d9: [u64; 2],
    pub d10_d11: [u64; 2],
    pub d12_d13: [u64; 2],
    pub d14_d15: [u64; 2],
    // General-purpose registers x19-x28, stored in pairs
    pub x19_x20: [u64; 2],
    pub x21_x22: [u64; 2],
    pub x23_x24: [u64; 2],
    pub x25_x26: [u64; 2],
    pub x27_x28: [u64; 2],
    /// [x30 (resumption point), sp]
    pub x30_sp: [u64; 2],
}

#[cfg(target_arch = "x86_64")]
impl Registers {
    /// Synthesizes a context for a thread that has never executed. Only the
    /// resumption point and the stack pointer are meaningful; everything
    /// else starts zeroed. Distinct from capture: a snapshot taken by
    /// [`save_context`] is never edited field by field.
    pub fn from_entry(entry: u64, stack_top: u64) -> Self {
        Registers {
            rsp: stack_top,
            rdx: entry,
            ..Registers::default()
        }
    }

    /// The (resumption point, stack pointer) pair of this snapshot.
    #[cfg(test)]
    pub fn resume_fields(&self) -> (u64, u64) {
        (self.rdx, self.rsp)
    }
}

#[cfg(target_arch = "aarch64")]
impl Registers {
    /// Synthesizes a context for a thread that has never executed. Only the
    /// resumption point and the stack pointer are meaningful; everything
    /// else starts zeroed. Distinct from capture: a snapshot taken by
    /// [`save_context`] is never edited field by field.
    pub fn from_entry(entry: u64, stack_top: u64) -> Self {
        Registers {
            x30_sp: [entry, stack_top],
            ..Registers::default()
        }
    }

    /// The (resumption point, stack pointer) pair of this snapshot.
    #[cfg(test)]
    pub fn resume_fields(&self) -> (u64, u64) {
        (self.x30_sp[0], self.x30_sp[1])
    }
}

unsafe extern "C" {
    /// Captures the caller's resumable state into `ctx`. Returns 0 on the
    /// direct capture; when the context is later passed to
    /// [`restore_context`], this call returns a second time with the tag.
    pub fn save_context(ctx: *mut Registers) -> u64;

    /// Transfers control to the point captured (or synthesized) in `ctx`,
    /// making the matching [`save_context`] return `tag`. Never returns to
    /// its own caller. `tag` must be nonzero so the two returns are
    /// distinguishable.
    pub fn restore_context(ctx: *const Registers, tag: u64) -> !;
}
