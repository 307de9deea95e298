use crate::context::{CancelHandle, MsgHandle, Scope, message, try_copy_msg};
use once_cell::sync::Lazy;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Default number of idle messages a pool keeps for reuse.
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

static GLOBAL_POOL: Lazy<MsgPool> = Lazy::new(MsgPool::new);

/// Free list of reusable [`Msg`](crate::context::Msg) instances.
///
/// Safe for concurrent `acquire` / `release` from any number of tasks. Pools
/// are independent of each other; [`MsgPool::global`] is the one used by the
/// free functions in [`crate::context`].
pub struct MsgPool {
    free: Mutex<Vec<MsgHandle>>,
    capacity: usize,
}

impl Default for MsgPool {
    fn default() -> Self {
        Self::new()
    }
}

impl MsgPool {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    /// Pool that keeps at most `capacity` idle messages. Released messages
    /// beyond that are dropped.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
        }
    }

    pub fn global() -> &'static MsgPool {
        &GLOBAL_POOL
    }

    /// Number of idle messages ready for reuse.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Takes a message from the pool (or allocates one) and attaches it to a
    /// child of `parent`.
    ///
    /// All fields of the returned message are empty except its scope, which is
    /// the returned scope. The message only refers back to that scope weakly,
    /// so dropping both without calling [`MsgPool::release`] frees them; the
    /// pool just does not get the message back.
    pub fn acquire(&self, parent: &Scope) -> (Scope, MsgHandle) {
        let pooled = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let reused = pooled.is_some();
        let msg = pooled.unwrap_or_default();

        let scope = parent.with_msg(msg.clone());
        msg.with(|m| m.set_scope(&scope));

        tracing::trace!(reused, "acquired msg");

        (scope, msg)
    }

    /// Resets `msg` and returns it to the pool.
    ///
    /// Call exactly once per `acquire`, after every consumer of `msg` has
    /// finished. Scopes still pointing at the message will observe whichever
    /// request reuses it next.
    pub fn release(&self, msg: MsgHandle) {
        msg.with(|m| m.reset());

        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.capacity {
            free.push(msg);
        }

        tracing::trace!(idle = free.len(), "released msg");
    }

    /// Prepares a message for background work that outlives the current call.
    ///
    /// The returned scope is rooted at a fresh background scope with its own
    /// `duration` timeout, so canceling `scope` or passing its deadline does
    /// not affect it. Every field of the current message is copied, unless the
    /// caller is inside [`MsgHandle::with`] for that message, in which case the
    /// new message starts empty. The caller must eventually call `cancel` and
    /// release the new message.
    pub fn acquire_async(
        &self,
        scope: &Scope,
        duration: Duration,
    ) -> (Scope, CancelHandle, MsgHandle) {
        let (root, cancel) = Scope::background().with_timeout(duration);

        let (async_scope, async_msg) = self.acquire(&root);
        copy_or_warn(&async_msg, &message(scope));

        tracing::debug!(?duration, "cloned msg for async work");

        (async_scope, cancel, async_msg)
    }

    /// Clones the request context for asynchronous handling without a new
    /// timeout.
    ///
    /// The result keeps every value of `scope` but is detached from its
    /// cancellation and deadline, and carries its own copy of the message.
    /// The copy must be released by whoever finishes with it last.
    pub fn clone_scope(&self, scope: &Scope) -> Scope {
        let old = message(scope);
        let (new_scope, new_msg) = self.acquire(&scope.detach());
        copy_or_warn(&new_msg, &old);
        new_scope
    }
}

fn copy_or_warn(dst: &MsgHandle, src: &MsgHandle) {
    if !try_copy_msg(dst, src) {
        tracing::warn!("source msg is held by this thread, clone left empty");
    }
}
