//! Store adapter seam: per-operation sessions over a long-lived connection.

use async_trait::async_trait;

use crate::error::{GraphError, Result};
use crate::statement::{Row, Statement};

/// A scoped unit of work against the graph store.
#[async_trait]
pub trait StoreSession: Send {
    /// Execute one statement and collect every row, in store order.
    async fn run(&mut self, statement: &Statement) -> Result<Vec<Row>>;

    /// Release the session. Called exactly once, by [`SessionGuard`].
    fn close(&mut self);
}

/// The process-wide store connection. Cloning or sharing it across tasks
/// is expected; each operation opens its own session.
#[async_trait]
pub trait GraphStore: Send + Sync {
    type Session: StoreSession;

    async fn open(&self) -> Result<Self::Session>;

    /// Open a session wrapped in a guard that releases it on every exit path.
    async fn acquire(&self) -> Result<SessionGuard<Self::Session>> {
        Ok(SessionGuard::new(self.open().await?))
    }
}

/// Owns an open session and closes it on drop.
pub struct SessionGuard<T: StoreSession> {
    session: Option<T>,
}

impl<T: StoreSession> SessionGuard<T> {
    pub fn new(session: T) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub async fn run(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        match self.session.as_mut() {
            Some(session) => session.run(statement).await,
            None => Err(GraphError::Connection("session already released".to_string())),
        }
    }

    /// Release explicitly. Dropping the guard has the same effect.
    pub fn release(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
    }
}

impl<T: StoreSession> Drop for SessionGuard<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct CountingSession {
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StoreSession for CountingSession {
        async fn run(&mut self, _statement: &Statement) -> Result<Vec<Row>> {
            Err(GraphError::Query("boom".to_string()))
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn release_closes_once() {
        let closed = Arc::new(AtomicUsize::new(0));
        let guard = SessionGuard::new(CountingSession {
            closed: closed.clone(),
        });
        guard.release();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn drop_closes_after_failed_run() {
        let closed = Arc::new(AtomicUsize::new(0));

        async fn failing(closed: Arc<AtomicUsize>) -> Result<Vec<Row>> {
            let mut guard = SessionGuard::new(CountingSession { closed });
            let rows = guard.run(&Statement::degree_count_by_faculty()).await?;
            guard.release();
            Ok(rows)
        }

        assert!(failing(closed.clone()).await.is_err());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
