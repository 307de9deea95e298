//! Pooled request context.
//!
//! Every in-flight request carries a [`Msg`] attached to a [`Scope`]. The
//! transport acquires both when a frame arrives, the handler reads and writes
//! the message, and the message goes back to the pool when the request is
//! done. Background work that must outlive the handler takes its own copy via
//! [`new_async_message`] or [`clone_scope`].

mod msg;
mod msg_pool;
mod scope;

pub use msg::{Head, Msg, MsgHandle, SharedError, copy_msg};
pub(crate) use msg::try_copy_msg;
pub use msg_pool::{DEFAULT_POOL_CAPACITY, MsgPool};
pub use scope::{CancelHandle, Scope, ScopeError, WeakScope};

use std::time::Duration;

/// Acquires a message from the global pool and attaches it to a child of
/// `parent`.
pub fn new_message(parent: &Scope) -> (Scope, MsgHandle) {
    MsgPool::global().acquire(parent)
}

/// Message attached to `scope`.
///
/// Scopes that never went through [`new_message`] get a fresh, unpooled
/// message that only knows the scope, so metadata and logging calls work
/// outside a request too.
pub fn message(scope: &Scope) -> MsgHandle {
    scope
        .msg()
        .unwrap_or_else(|| MsgHandle::new(Msg::with_scope(scope)))
}

/// Resets `msg` and returns it to the global pool.
pub fn recycle_message(msg: MsgHandle) {
    MsgPool::global().release(msg)
}

/// See [`MsgPool::acquire_async`].
pub fn new_async_message(scope: &Scope, duration: Duration) -> (Scope, CancelHandle, MsgHandle) {
    MsgPool::global().acquire_async(scope, duration)
}

/// See [`MsgPool::clone_scope`].
pub fn clone_scope(scope: &Scope) -> Scope {
    MsgPool::global().clone_scope(scope)
}
