use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;
use tokio_util::sync::CancellationToken;

use sealdrop_object_store::Database;

use crate::ServiceState;

#[async_trait]
pub trait DataSource {
    /// Perform various checks on the system to ensure its healthy and ready to accept requests.
    async fn is_ready(&self) -> Result<(), DataSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("one or more dependent services aren't available")]
    DependencyFailure,

    #[error("service has received signal indicating it should shutdown")]
    ShuttingDown,
}

pub type DynDataSource = Arc<dyn DataSource + Send + Sync>;

pub struct StateDataSource(DynDataSource);

impl Debug for StateDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateDataSource").finish()
    }
}

impl StateDataSource {
    pub fn new(dds: DynDataSource) -> Self {
        Self(dds)
    }
}

impl Deref for StateDataSource {
    type Target = DynDataSource;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Ready while the metadata database answers queries.
pub struct DbSource {
    db: Database,
    shutdown: CancellationToken,
}

impl DbSource {
    pub fn new(db: Database, shutdown: CancellationToken) -> Self {
        Self { db, shutdown }
    }
}

#[async_trait]
impl DataSource for DbSource {
    async fn is_ready(&self) -> Result<(), DataSourceError> {
        if self.shutdown.is_cancelled() {
            return Err(DataSourceError::ShuttingDown);
        }

        self.db.ping().await.map_err(|e| {
            tracing::warn!(error = %e, "database ping failed");
            DataSourceError::DependencyFailure
        })
    }
}

/// In-memory stores have no dependencies to probe.
pub struct MemorySource {
    shutdown: CancellationToken,
}

impl MemorySource {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn is_ready(&self) -> Result<(), DataSourceError> {
        if self.shutdown.is_cancelled() {
            return Err(DataSourceError::ShuttingDown);
        }
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<ServiceState> for StateDataSource {
    type Rejection = ();

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        Ok(StateDataSource(state.readiness().clone()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Clone)]
    pub(crate) enum MockReadiness {
        DependencyFailure,
        Ready,
        ShuttingDown,
    }

    #[async_trait]
    impl DataSource for MockReadiness {
        async fn is_ready(&self) -> Result<(), DataSourceError> {
            use MockReadiness::*;

            match self {
                DependencyFailure => Err(DataSourceError::DependencyFailure),
                Ready => Ok(()),
                ShuttingDown => Err(DataSourceError::ShuttingDown),
            }
        }
    }

    #[tokio::test]
    async fn test_db_source() {
        let db = Database::in_memory().await.unwrap();
        let shutdown = CancellationToken::new();
        let source = DbSource::new(db.clone(), shutdown.clone());

        assert!(source.is_ready().await.is_ok());

        db.close().await;
        assert!(matches!(
            source.is_ready().await,
            Err(DataSourceError::DependencyFailure)
        ));

        shutdown.cancel();
        assert!(matches!(
            source.is_ready().await,
            Err(DataSourceError::ShuttingDown)
        ));
    }

    #[tokio::test]
    async fn test_memory_source() {
        let shutdown = CancellationToken::new();
        let source = MemorySource::new(shutdown.clone());
        assert!(source.is_ready().await.is_ok());

        shutdown.cancel();
        assert!(matches!(
            source.is_ready().await,
            Err(DataSourceError::ShuttingDown)
        ));
    }
}
