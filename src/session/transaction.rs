// src/session/transaction.rs - Transactional wrapper for async operations

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

use super::SessionManager;
use crate::infra::errors::StoreError;

/// A shareable async operation from `A` to `Result<T, E>`.
pub type Operation<A, T, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Box a plain async function into an [`Operation`].
pub fn operation<A, T, E, F, Fut>(f: F) -> Operation<A, T, E>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Arc::new(move |input: A| -> BoxFuture<'static, Result<T, E>> { Box::pin(f(input)) })
}

/// Wrap `op` so every call runs inside one session scope from `manager`.
///
/// The returned operation has the same signature. Its result or error is
/// the wrapped one, delivered after commit/rollback and close have run.
/// Called from inside an existing scope, it joins that scope's session.
pub fn transactional<A, T, E>(
    manager: SessionManager,
    op: Operation<A, T, E>,
) -> Operation<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: From<StoreError> + Send + 'static,
{
    Arc::new(move |input: A| -> BoxFuture<'static, Result<T, E>> {
        let manager = manager.clone();
        let op = Arc::clone(&op);
        Box::pin(async move { manager.acquire(move |_session| op(input)).await })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::errors::CalcError;
    use crate::session::testing::RecordingFactory;
    use crate::session::{SessionContext, SessionFactory};
    use pretty_assertions::assert_eq;

    fn manager(factory: &Arc<RecordingFactory>) -> SessionManager {
        SessionManager::new(Arc::clone(factory) as Arc<dyn SessionFactory>)
    }

    #[tokio::test]
    async fn test_result_passes_through_after_commit() {
        let factory = Arc::new(RecordingFactory::default());
        let double = operation(|x: u32| async move {
            assert!(SessionContext::ambient_session().is_some());
            Ok::<_, StoreError>(x * 2)
        });

        let wrapped = transactional(manager(&factory), double);

        assert_eq!(wrapped(5).await.unwrap(), 10);
        assert_eq!(factory.events(), vec!["open:1", "commit:1", "close:1"]);
    }

    #[tokio::test]
    async fn test_error_passes_through_after_rollback() {
        let factory = Arc::new(RecordingFactory::default());
        let fail = operation(|_: ()| async {
            Err::<(), _>(CalcError::Validation("bad input".into()))
        });

        let wrapped = transactional(manager(&factory), fail);

        let err = wrapped(()).await.unwrap_err();
        assert!(matches!(err, CalcError::Validation(ref m) if m == "bad input"));
        assert_eq!(factory.events(), vec!["open:1", "rollback:1", "close:1"]);
    }

    #[tokio::test]
    async fn test_each_call_gets_its_own_session() {
        let factory = Arc::new(RecordingFactory::default());
        let wrapped = transactional(
            manager(&factory),
            operation(|_: ()| async { Ok::<_, StoreError>(()) }),
        );

        let (a, b) = tokio::join!(wrapped(()), wrapped(()));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(factory.opened().len(), 2);
    }

    #[tokio::test]
    async fn test_nested_wrapper_joins_outer_session() {
        let factory = Arc::new(RecordingFactory::default());
        let mgr = manager(&factory);

        let inner = transactional(
            mgr.clone(),
            operation(|_: ()| async { Ok::<_, StoreError>(()) }),
        );
        let outer = transactional(
            mgr,
            operation(move |_: ()| {
                let inner = Arc::clone(&inner);
                async move { inner(()).await }
            }),
        );

        outer(()).await.unwrap();
        assert_eq!(factory.events(), vec!["open:1", "commit:1", "close:1"]);
    }
}
