use crate::context::MsgHandle;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Why a scope is done.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScopeError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancels the scope it was returned with, and every scope derived from it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

#[derive(Clone)]
enum CancelSource {
    /// Never fires.
    Inert,
    Token(CancellationToken),
}

struct ScopeInner {
    parent: Option<Scope>,
    cancel: CancelSource,
    deadline: Option<Instant>,
    msg: Option<MsgHandle>,
}

/// Scoped execution context carried through a request's call chain.
///
/// A scope combines a cancellation source, an optional deadline and an
/// optional attached [`MsgHandle`]. Deriving a child never mutates the parent;
/// children observe the parent's cancellation and an equal or earlier
/// deadline, except for [`Scope::detach`] which keeps only value lookups.
///
/// Deadlines are checked lazily: `is_done`, `err` and `done` compare against
/// the clock, nothing fires on its own.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

/// Non-owning reference to a [`Scope`].
///
/// A [`Msg`](crate::context::Msg) points back at its scope through one of
/// these, so a scope and its attached message never keep each other alive.
#[derive(Clone, Default)]
pub struct WeakScope {
    inner: Weak<ScopeInner>,
}

impl WeakScope {
    /// The scope, if anything still holds it.
    pub fn upgrade(&self) -> Option<Scope> {
        self.inner.upgrade().map(|inner| Scope { inner })
    }
}

impl fmt::Debug for WeakScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakScope")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .field("has_msg", &self.inner.msg.is_some())
            .finish()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::background()
    }
}

impl Scope {
    /// An empty root scope: no deadline, never canceled, no values.
    pub fn background() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                parent: None,
                cancel: CancelSource::Inert,
                deadline: None,
                msg: None,
            }),
        }
    }

    pub fn with_cancel(&self) -> (Scope, CancelHandle) {
        self.derive(self.inner.deadline)
    }

    /// Child scope that is done after `duration`, or earlier if the parent is.
    pub fn with_timeout(&self, duration: Duration) -> (Scope, CancelHandle) {
        self.with_deadline(Instant::now() + duration)
    }

    pub fn with_deadline(&self, deadline: Instant) -> (Scope, CancelHandle) {
        let deadline = match self.inner.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        self.derive(Some(deadline))
    }

    /// Returns a scope that forwards value lookups to `self` but has no
    /// deadline, is never done and never reports an error.
    pub fn detach(&self) -> Scope {
        Scope {
            inner: Arc::new(ScopeInner {
                parent: Some(self.clone()),
                cancel: CancelSource::Inert,
                deadline: None,
                msg: None,
            }),
        }
    }

    /// Child scope carrying `msg`, sharing cancellation and deadline with `self`.
    pub(crate) fn with_msg(&self, msg: MsgHandle) -> Scope {
        Scope {
            inner: Arc::new(ScopeInner {
                parent: Some(self.clone()),
                cancel: self.inner.cancel.clone(),
                deadline: self.inner.deadline,
                msg: Some(msg),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakScope {
        WeakScope {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Nearest attached message, searching this scope then its ancestors.
    pub fn msg(&self) -> Option<MsgHandle> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(msg) = &scope.inner.msg {
                return Some(msg.clone());
            }
            current = scope.inner.parent.as_ref();
        }
        None
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn err(&self) -> Option<ScopeError> {
        if let CancelSource::Token(token) = &self.inner.cancel {
            if token.is_cancelled() {
                return Some(ScopeError::Canceled);
            }
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ScopeError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves once the scope is canceled or its deadline passes. Pending
    /// forever for scopes that can do neither.
    pub async fn done(&self) {
        match (&self.inner.cancel, self.inner.deadline) {
            (CancelSource::Inert, None) => std::future::pending::<()>().await,
            (CancelSource::Inert, Some(deadline)) => sleep_until(deadline).await,
            (CancelSource::Token(token), None) => token.cancelled().await,
            (CancelSource::Token(token), Some(deadline)) => {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = sleep_until(deadline) => {}
                }
            }
        }
    }

    fn derive(&self, deadline: Option<Instant>) -> (Scope, CancelHandle) {
        let token = match &self.inner.cancel {
            CancelSource::Inert => CancellationToken::new(),
            CancelSource::Token(parent) => parent.child_token(),
        };

        let scope = Scope {
            inner: Arc::new(ScopeInner {
                parent: Some(self.clone()),
                cancel: CancelSource::Token(token.clone()),
                deadline,
                msg: None,
            }),
        };

        (scope, CancelHandle { token })
    }
}
