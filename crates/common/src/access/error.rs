use serde::Serialize;
use uuid::Uuid;

use crate::ports::StoreError;

/// Stable classification of an [`AccessError`], for callers that branch
/// on retry-vs-surface rather than on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Unauthenticated,
    Unauthorized,
    NotFound,
    Conflict,
    StorageUnavailable,
    PersistenceUnavailable,
    /// Content was stored but its metadata was not; a sub-kind of
    ///  `PersistenceUnavailable`
    Orphaned,
    Cancelled,
    /// A server-side fault outside either store
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::StorageUnavailable => "storage_unavailable",
            ErrorKind::PersistenceUnavailable => "persistence_unavailable",
            ErrorKind::Orphaned => "orphaned",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }

    /// Whether the metadata store is the failing dependency
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            ErrorKind::PersistenceUnavailable | ErrorKind::Orphaned
        )
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::StorageUnavailable
                | ErrorKind::PersistenceUnavailable
                | ErrorKind::Orphaned
                | ErrorKind::Cancelled
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid credentials")]
    Unauthenticated,

    #[error("caller {caller} may not {op} {entity} {id}")]
    Unauthorized {
        op: &'static str,
        caller: Uuid,
        entity: &'static str,
        id: Uuid,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{op}: content store unavailable: {source}")]
    StorageUnavailable {
        op: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{op}: metadata store unavailable: {source}")]
    PersistenceUnavailable {
        op: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("content for file {file_id} was stored but its metadata was not: {source}")]
    Orphaned {
        file_id: Uuid,
        #[source]
        source: StoreError,
    },

    #[error("{op} cancelled")]
    Cancelled { op: &'static str },

    #[error("{op}: {message}")]
    Internal { op: &'static str, message: String },
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::InvalidInput(_) => ErrorKind::InvalidInput,
            AccessError::Unauthenticated => ErrorKind::Unauthenticated,
            AccessError::Unauthorized { .. } => ErrorKind::Unauthorized,
            AccessError::NotFound { .. } => ErrorKind::NotFound,
            AccessError::Conflict(_) => ErrorKind::Conflict,
            AccessError::StorageUnavailable { .. } => ErrorKind::StorageUnavailable,
            AccessError::PersistenceUnavailable { .. } => ErrorKind::PersistenceUnavailable,
            AccessError::Orphaned { .. } => ErrorKind::Orphaned,
            AccessError::Cancelled { .. } => ErrorKind::Cancelled,
            AccessError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn unauthorized(op: &'static str, caller: Uuid, entity: &'static str, id: Uuid) -> Self {
        AccessError::Unauthorized {
            op,
            caller,
            entity,
            id,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AccessError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Classify a metadata store failure
    pub(crate) fn persistence(op: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => AccessError::NotFound { entity, id },
            StoreError::Duplicate { entity, key } => {
                AccessError::Conflict(format!("{} already exists: {}", entity, key))
            }
            StoreError::Invalid(msg) => AccessError::InvalidInput(msg),
            source => AccessError::PersistenceUnavailable { op, source },
        }
    }

    /// Classify a content store failure
    pub(crate) fn storage(op: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => AccessError::NotFound { entity, id },
            StoreError::Duplicate { entity, key } => {
                AccessError::Conflict(format!("{} already exists: {}", entity, key))
            }
            StoreError::Invalid(msg) => AccessError::InvalidInput(msg),
            source => AccessError::StorageUnavailable { op, source },
        }
    }
}
