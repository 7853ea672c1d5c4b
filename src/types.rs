use std::time::Duration;

/// Thread handle: the pool index, stable for the thread's lifetime and
/// reused after reclamation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub usize);

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Free slot with no valid context; eligible for reuse.
    Unused,
    /// Mid-creation, not yet schedulable.
    Preparing,
    /// Registered and primed, waiting for its first scheduling.
    FirstReady,
    /// Holds a real captured context, or is the bootstrap thread.
    Ready,
    /// Reserved for a future blocking primitive. The rotation skips it;
    /// no operation currently transitions a thread here.
    Blocked,
    /// Exit called; the stack awaits the bootstrap sweep.
    Exited,
}

/// Smallest per-thread stack the runtime accepts.
pub const MIN_STACK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Hard pool capacity, the bootstrap slot included.
    pub capacity: usize,
    /// Fixed per-thread stack size in bytes.
    pub stack_size: usize,
    /// Delay before the first preemption tick.
    pub initial_delay: Duration,
    /// Preemption period.
    pub period: Duration,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            capacity: 128,
            stack_size: 64 * 1024,
            initial_delay: Duration::from_micros(10),
            period: Duration::from_millis(50),
        }
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = size;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.config.initial_delay = delay;
        self
    }

    pub fn period(mut self, period: Duration) -> Self {
        self.config.period = period;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
