use time::OffsetDateTime;
use uuid::Uuid;

/// Metadata for an uploaded, client-encrypted file.
///
/// `iv` and `encrypted_key` are opaque: they are stored and returned
/// exactly as the owner supplied them. Records are immutable once saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub mime_type: String,
    /// Ciphertext length in bytes
    pub size: u64,
    pub iv: Vec<u8>,
    /// Content key wrapped under the owner's key material
    pub encrypted_key: Vec<u8>,
    pub created_at: OffsetDateTime,
}

/// Caller-supplied fields for an upload. `id` and `created_at` are
/// assigned when absent.
#[derive(Debug, Clone, Default)]
pub struct NewFile {
    pub id: Option<Uuid>,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    pub iv: Vec<u8>,
    pub encrypted_key: Vec<u8>,
    pub created_at: Option<OffsetDateTime>,
}

impl NewFile {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            size,
            ..Default::default()
        }
    }

    pub fn with_key_material(mut self, iv: Vec<u8>, encrypted_key: Vec<u8>) -> Self {
        self.iv = iv;
        self.encrypted_key = encrypted_key;
        self
    }

    /// Fill in generated fields and attach the owner.
    pub fn into_file(self, owner_id: Uuid) -> File {
        File {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            owner_id,
            filename: self.filename,
            mime_type: self.mime_type,
            size: self.size,
            iv: self.iv,
            encrypted_key: self.encrypted_key,
            created_at: self.created_at.unwrap_or_else(OffsetDateTime::now_utc),
        }
    }
}

impl File {
    /// Key under which the ciphertext lives in the content store.
    pub fn content_key(&self) -> String {
        content_key(&self.id)
    }
}

pub(crate) fn content_key(id: &Uuid) -> String {
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_file_assigns_missing_fields() {
        let owner = Uuid::new_v4();
        let file = NewFile::new("a.txt", "text/plain", 10).into_file(owner);

        assert_eq!(file.owner_id, owner);
        assert!(!file.id.is_nil());
        assert!(file.created_at.unix_timestamp() > 0);
    }

    #[test]
    fn test_into_file_keeps_supplied_fields() {
        let id = Uuid::new_v4();
        let created_at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let new = NewFile {
            id: Some(id),
            created_at: Some(created_at),
            ..NewFile::new("b.bin", "application/octet-stream", 3)
        };

        let file = new.into_file(Uuid::new_v4());
        assert_eq!(file.id, id);
        assert_eq!(file.created_at, created_at);
        assert_eq!(file.content_key(), id.to_string());
    }
}
