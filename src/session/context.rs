// src/session/context.rs - Call-chain-local "current session"
//
// Each unit of work gets its own `SessionContext` and runs inside
// `SessionContext::scope`, which binds it as a tokio task-local for that
// future only. Concurrent requests therefore never see each other's slot,
// and a task spawned from inside a scope starts with no ambient session.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use super::SessionRef;

tokio::task_local! {
    static AMBIENT: SessionContext;
}

/// Holder of the current session for one call chain.
#[derive(Clone, Default)]
pub struct SessionContext {
    slot: Arc<Mutex<Option<SessionRef>>>,
}

/// Restores the value a `set` replaced.
#[must_use = "pass the token to SessionContext::reset"]
pub struct ContextToken {
    previous: Option<SessionRef>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session, or `None` if no unit of work is active.
    pub fn get(&self) -> Option<SessionRef> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `session`; the token restores whatever was there before.
    pub fn set(&self, session: SessionRef) -> ContextToken {
        let previous = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(session);
        ContextToken { previous }
    }

    pub fn reset(&self, token: ContextToken) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = token.previous;
    }

    /// The context bound to the running call chain, if any.
    pub fn current() -> Option<SessionContext> {
        AMBIENT.try_with(Clone::clone).ok()
    }

    /// Shorthand for `current()` followed by `get()`.
    pub fn ambient_session() -> Option<SessionRef> {
        Self::current().and_then(|ctx| ctx.get())
    }

    /// Run `fut` with this context as the ambient one.
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        AMBIENT.scope(self, fut).await
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session", &self.get().map(|s| s.id()))
            .finish()
    }
}
