//! Small tracing helpers shared across construction phases.

use std::time::Instant;

/// Runs `f`, then emits a `trace!` of its wall-clock duration tagged with
/// `phase`. Mirrors the teacher's `log_duration` used to bracket sharding
/// and pilot search without resorting to `println!`.
pub fn log_duration<R>(phase: &str, f: impl FnOnce() -> R) -> R {
    let start = Instant::now();
    let result = f();
    log::trace!("{phase} took {:?}", start.elapsed());
    result
}
