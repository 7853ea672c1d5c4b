#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Every pool slot is in use. Recoverable: no thread was registered and
    /// no state changed; retry after other threads exit and are swept.
    #[error("thread pool exhausted: all {capacity} slots in use")]
    PoolExhausted { capacity: usize },

    /// The preemption timer could not be armed. Fatal: once more than one
    /// thread exists, nothing can make progress without preemption.
    #[error("preemption timer initialization failed: {0}")]
    TimerInit(nix::errno::Errno),

    #[error("runtime already initialized")]
    AlreadyInitialized,

    #[error("invalid stack size: {size} (minimum {min} bytes)")]
    InvalidStackSize { size: usize, min: usize },

    #[error("invalid pool capacity: {0} (the bootstrap slot plus at least one worker is required)")]
    InvalidCapacity(usize),
}

impl Error {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::PoolExhausted { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
