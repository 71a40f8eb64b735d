mod content;
mod error;
mod metadata;

pub use content::{ContentStore, ContentStream};
pub use error::StoreError;
pub use metadata::{FileStore, ShareStore, UserStore};
