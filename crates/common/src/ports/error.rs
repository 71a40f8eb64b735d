/// Failures reported by any storage port.
///
/// Adapters must keep "the thing isn't there" (`NotFound`) distinct from
/// "the store couldn't answer" (`Unavailable`); the access core relies on
/// that split to pick between a not-found and an unavailable error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint rejected the write
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// The store rejected the shape of the request
    #[error("invalid store request: {0}")]
    Invalid(String),

    #[error("store unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
