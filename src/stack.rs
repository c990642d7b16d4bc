//! Stack growth for the recursive parser and evaluator.

const RED_ZONE: usize = 100 * 1024; // 100KB
const STACK_PER_RECURSION: usize = 1024 * 1024; // 1MB

/// Run `f`, moving onto a fresh stack segment when less than the red zone
/// is left, so nesting depth is bounded by the heap instead of the thread.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
