// src/session/manager.rs - Session ownership and scoped acquisition

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{SessionContext, SessionFactory, SessionRef};
use crate::infra::errors::StoreError;

/// Decides whether a unit of work borrows the ambient session or opens and
/// owns a new one.
#[derive(Clone)]
pub struct SessionManager {
    factory: Arc<dyn SessionFactory>,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self { factory }
    }

    /// Run `f` with a session.
    ///
    /// If the call chain already has an ambient session, `f` receives that
    /// same session and this scope never commits, rolls back or closes it:
    /// the scope that opened it is responsible.
    ///
    /// Otherwise a new session is opened and installed as ambient for the
    /// duration of `f`. On `Ok` it is committed, on `Err` rolled back; then
    /// it is closed and the context restored, in that order, on every path.
    /// A failed commit is returned as the error. A failed rollback is logged
    /// and the operation's own error is returned.
    pub async fn acquire<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(SessionRef) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<StoreError>,
    {
        match SessionContext::current() {
            Some(ctx) => match ctx.get() {
                Some(session) => {
                    debug!(session = session.id(), "Using existing session from context");
                    f(session).await
                }
                None => self.run_owned(ctx, f).await,
            },
            None => {
                let ctx = SessionContext::new();
                ctx.clone().scope(self.run_owned(ctx, f)).await
            }
        }
    }

    async fn run_owned<F, Fut, T, E>(&self, ctx: SessionContext, f: F) -> Result<T, E>
    where
        F: FnOnce(SessionRef) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<StoreError>,
    {
        let session = self.factory.open_session().await?;
        let id = session.id();
        let token = ctx.set(Arc::clone(&session));
        info!(session = id, "Created new session and installed it in context");

        let outcome = match f(Arc::clone(&session)).await {
            Ok(value) => match session.commit().await {
                Ok(()) => {
                    info!(session = id, "Transaction committed");
                    Ok(value)
                }
                Err(e) => {
                    error!(session = id, error = %e, "Commit failed");
                    Err(E::from(e))
                }
            },
            Err(err) => {
                match session.rollback().await {
                    Ok(()) => info!(session = id, "Operation failed, transaction rolled back"),
                    Err(e) => error!(
                        session = id,
                        error = %e,
                        "Operation failed and rollback failed too; returning the operation error"
                    ),
                }
                Err(err)
            }
        };

        if let Err(e) = session.close().await {
            warn!(session = id, error = %e, "Closing session failed");
        }
        ctx.reset(token);
        debug!(session = id, "Session closed and removed from context");

        outcome
    }
}
