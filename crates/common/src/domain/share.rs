use time::OffsetDateTime;
use uuid::Uuid;

/// A grant letting one recipient fetch one file's rewrapped content key.
///
/// A share carries no authority of its own: every use re-checks the live
/// file's owner. At most one share exists per `(file_id, recipient_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub id: Uuid,
    pub file_id: Uuid,
    pub recipient_id: Uuid,
    /// Content key wrapped under the recipient's key material
    pub wrapped_key: Vec<u8>,
    pub created_at: OffsetDateTime,
}

impl Share {
    pub fn new(file_id: Uuid, recipient_id: Uuid, wrapped_key: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_id,
            recipient_id,
            wrapped_key,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
