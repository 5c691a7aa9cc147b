use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{DocumentRepository, RepositoryError};

/// Process-local storage, selected with `DATA_FILE=:memory:`. Writes can be
/// made to fail to exercise the store's error path.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    document: Mutex<Option<Vec<u8>>>,
    backups: Mutex<Vec<Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: Vec<u8>) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Option<Vec<u8>> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn backups(&self) -> Vec<Vec<u8>> {
        self.backups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DocumentRepository for InMemoryRepository {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<Option<Vec<u8>>, RepositoryError> {
        Ok(self.stored())
    }

    fn save(&self, document: &[u8]) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::WriteRejected);
        }
        *self
            .document
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(document.to_vec());
        Ok(())
    }

    fn preserve(&self, document: &[u8]) -> Result<String, RepositoryError> {
        let mut backups = self.backups.lock().unwrap_or_else(PoisonError::into_inner);
        backups.push(document.to_vec());
        Ok(format!("memory backup #{}", backups.len()))
    }
}
