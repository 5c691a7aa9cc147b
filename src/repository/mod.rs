pub mod document;
pub mod json_file;
pub mod memory;
pub mod migrations;

pub use document::{decode_document, encode_document};
pub use json_file::JsonFileRepository;
pub use memory::InMemoryRepository;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("document is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("document is malformed: {0}")]
    Malformed(String),
    #[error("document version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u64, supported: u32 },
    #[error("storage rejected the write")]
    WriteRejected,
}

/// Key-value style storage for the single persisted document. Implementations
/// are blocking; the store calls them from `spawn_blocking`.
pub trait DocumentRepository: Send + Sync {
    fn describe(&self) -> String;

    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<u8>>, RepositoryError>;

    fn save(&self, document: &[u8]) -> Result<(), RepositoryError>;

    /// Keeps a copy of an undecodable document out of the way of later saves.
    /// Returns where the copy went.
    fn preserve(&self, document: &[u8]) -> Result<String, RepositoryError>;
}
