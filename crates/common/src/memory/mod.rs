mod content;
mod metadata;

pub use content::MemoryContentStore;
pub use metadata::MemoryStore;
