use std::path::Path;
use std::sync::Arc;

use crate::clock::Moment;
use crate::config::AppConfig;
use crate::repository::{
    DocumentRepository, InMemoryRepository, JsonFileRepository, RepositoryError,
};
use crate::store::Store;

const IN_MEMORY_DATA_FILE: &str = ":memory:";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<Store>,
}

impl AppState {
    pub async fn build(config: AppConfig) -> Result<Self, RepositoryError> {
        let repository = repository_for(&config.data_file);
        Self::with_repository(config, repository).await
    }

    pub async fn with_repository(
        config: AppConfig,
        repository: Arc<dyn DocumentRepository>,
    ) -> Result<Self, RepositoryError> {
        let store = Store::open(repository, &config).await?;
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
        })
    }

    pub fn moment(&self) -> Moment {
        self.store.moment()
    }
}

fn repository_for(data_file: &Path) -> Arc<dyn DocumentRepository> {
    if data_file.as_os_str() == IN_MEMORY_DATA_FILE {
        tracing::warn!("DATA_FILE is :memory:, changes will not survive a restart");
        Arc::new(InMemoryRepository::new())
    } else {
        Arc::new(JsonFileRepository::new(data_file))
    }
}
