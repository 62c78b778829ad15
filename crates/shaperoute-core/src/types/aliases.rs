//! Type aliases for commonly used shared-ownership types.
//!
//! ```rust,ignore
//! use shaperoute_core::types::*;
//!
//! // Instead of: Arc<Mutex<Vec<String>>>
//! let log: ThreadSafeVec<String> = thread_safe_vec();
//! ```

use parking_lot::Mutex;
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for cross-task sharing.
///
/// Uses `parking_lot::Mutex`, which never poisons.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A thread-safe vector, typically a log filled from event handlers.
pub type ThreadSafeVec<T> = Arc<Mutex<Vec<T>>>;

/// Create a new `ThreadSafe<T>`
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

/// Create an empty `ThreadSafeVec<T>`
pub fn thread_safe_vec<T>() -> ThreadSafeVec<T> {
    Arc::new(Mutex::new(Vec::new()))
}
