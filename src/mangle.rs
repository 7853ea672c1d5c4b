//! Pointer obfuscation for saved first-run addresses, after glibc's
//! PTR_MANGLE: xor with a per-process cookie, then a rotate. Orthogonal to
//! scheduling correctness; applied when a first-run pair is stored and
//! removed when it is installed.

const ROTATE: u32 = 9;

fn cookie() -> u64 {
    static COOKIE: std::sync::OnceLock<u64> = std::sync::OnceLock::new();
    *COOKIE.get_or_init(rand::random::<u64>)
}

pub fn conceal(ptr: u64) -> u64 {
    (ptr ^ cookie()).rotate_left(ROTATE)
}

pub fn reveal(ptr: u64) -> u64 {
    ptr.rotate_right(ROTATE) ^ cookie()
}
