mod document_store;
mod documents;
mod memory_store;
mod sqlite_store;

pub use document_store::*;
pub use documents::*;
pub use memory_store::*;
pub use sqlite_store::*;

/// SQL migration for the document table
pub const MIGRATION_001_DOCUMENTS: &str = include_str!("migrations/001_documents.sql");
