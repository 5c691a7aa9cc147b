pub mod actions;
pub mod reducer;
pub mod seed;

use std::sync::Arc;

use chrono_tz::Tz;
use tokio::sync::RwLock;

use crate::clock::Moment;
use crate::config::AppConfig;
use crate::domain::AppData;
use crate::error::{AppError, AppResult};
use crate::repository::{decode_document, encode_document, DocumentRepository, RepositoryError};

pub use actions::Action;
pub use reducer::{reduce, Reduced};

/// Single source of truth for the dashboard document. Every mutation goes
/// through [`Store::dispatch`], which persists the whole document before the
/// new state becomes visible.
pub struct Store {
    state: RwLock<AppData>,
    repository: Arc<dyn DocumentRepository>,
    timezone: Tz,
}

impl Store {
    /// Loads the stored document. A document that does not decode is copied
    /// aside before seed data takes its place. A newer schema version or an
    /// unreadable storage is an error, so nothing overwrites it.
    pub async fn open(
        repository: Arc<dyn DocumentRepository>,
        config: &AppConfig,
    ) -> Result<Self, RepositoryError> {
        let moment = Moment::current(config.timezone);
        let seed = || {
            seed::default_data(
                config.default_apartment_rent,
                config.default_suite_rent,
                moment.today,
            )
        };

        let loaded = run_blocking(&repository, |repository| repository.load()).await?;
        let state = match loaded {
            Some(bytes) => match decode_document(&bytes, moment.today) {
                Ok(data) => {
                    tracing::info!(
                        storage = %repository.describe(),
                        buildings = data.buildings.len(),
                        "Loaded stored document"
                    );
                    data
                }
                Err(error @ RepositoryError::UnsupportedVersion { .. }) => {
                    tracing::error!(
                        storage = %repository.describe(),
                        error = %error,
                        "Stored document was written by a newer version, refusing to start"
                    );
                    return Err(error);
                }
                Err(error) => {
                    let backup =
                        run_blocking(&repository, move |repository| repository.preserve(&bytes))
                            .await?;
                    tracing::error!(
                        storage = %repository.describe(),
                        backup = %backup,
                        error = %error,
                        "Stored document is unreadable, kept a copy and fell back to seed data"
                    );
                    seed()
                }
            },
            None if config.seed_default_data => {
                tracing::info!(storage = %repository.describe(), "No stored document, seeding default data");
                seed()
            }
            None => AppData::default(),
        };

        Ok(Self::with_state(state, repository, config.timezone))
    }

    pub fn with_state(state: AppData, repository: Arc<dyn DocumentRepository>, timezone: Tz) -> Self {
        Self {
            state: RwLock::new(state),
            repository,
            timezone,
        }
    }

    pub fn moment(&self) -> Moment {
        Moment::current(self.timezone)
    }

    pub async fn snapshot(&self) -> AppData {
        self.state.read().await.clone()
    }

    pub async fn read<R>(&self, view: impl FnOnce(&AppData) -> R) -> R {
        let guard = self.state.read().await;
        view(&guard)
    }

    pub async fn dispatch(&self, action: Action) -> AppResult<Reduced> {
        self.dispatch_at(action, self.moment()).await
    }

    /// Reduces under the write lock. Unmatched actions change nothing and are
    /// not persisted; a failed write keeps the previous state.
    pub async fn dispatch_at(&self, action: Action, moment: Moment) -> AppResult<Reduced> {
        let name = action.name();
        let mut guard = self.state.write().await;
        let Reduced { state, matched } = reduce(&guard, action, moment);
        if !matched {
            tracing::info!(action = name, matched = false, "Store action matched nothing");
            return Ok(Reduced {
                state: guard.clone(),
                matched,
            });
        }

        let document = encode_document(&state)
            .map_err(|error| AppError::Internal(format!("Could not encode document: {error}")))?;
        self.persist(document).await?;
        *guard = state;
        tracing::info!(action = name, matched = true, "Store action applied");

        Ok(Reduced {
            state: guard.clone(),
            matched,
        })
    }

    async fn persist(&self, document: Vec<u8>) -> AppResult<()> {
        let repository = Arc::clone(&self.repository);
        tokio::task::spawn_blocking(move || repository.save(&document))
            .await
            .map_err(|error| AppError::Internal(format!("Storage task failed: {error}")))?
            .map_err(|error| {
                tracing::error!(storage = %self.repository.describe(), error = %error, "Could not persist document");
                AppError::Dependency(format!("Could not save data: {error}"))
            })
    }
}

async fn run_blocking<T: Send + 'static>(
    repository: &Arc<dyn DocumentRepository>,
    task: impl FnOnce(&dyn DocumentRepository) -> Result<T, RepositoryError> + Send + 'static,
) -> Result<T, RepositoryError> {
    let repository = Arc::clone(repository);
    tokio::task::spawn_blocking(move || task(repository.as_ref()))
        .await
        .map_err(|error| {
            RepositoryError::Io(std::io::Error::other(format!("storage task failed: {error}")))
        })?
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::{Action, Store};
    use crate::config::AppConfig;
    use crate::domain::AppData;
    use crate::error::AppError;
    use crate::repository::{
        decode_document, InMemoryRepository, JsonFileRepository, RepositoryError,
    };
    use crate::store::actions::{FloorLayout, NewBuilding};

    fn add_building(name: &str) -> Action {
        Action::AddBuilding(NewBuilding {
            name: name.to_string(),
            floors: vec![FloorLayout {
                apartments: 1,
                suites: 0,
            }],
            apartment_rent: 1700.0,
            suite_rent: 3000.0,
        })
    }

    fn config(seed: bool) -> AppConfig {
        let mut config = AppConfig::for_data_file(":memory:".into());
        config.seed_default_data = seed;
        config
    }

    #[tokio::test]
    async fn empty_storage_seeds_default_data() {
        let store = Store::open(Arc::new(InMemoryRepository::new()), &config(true))
            .await
            .expect("open");
        assert_eq!(store.read(|data| data.buildings.len()).await, 8);

        let store = Store::open(Arc::new(InMemoryRepository::new()), &config(false))
            .await
            .expect("open");
        assert_eq!(store.snapshot().await, AppData::default());
    }

    #[tokio::test]
    async fn unreadable_document_is_kept_before_seeding() {
        let repository = Arc::new(InMemoryRepository::with_document(b"{broken".to_vec()));
        let store = Store::open(repository.clone(), &config(false))
            .await
            .expect("open");
        assert_eq!(store.read(|data| data.buildings.len()).await, 8);
        assert_eq!(repository.backups(), vec![b"{broken".to_vec()]);
    }

    #[tokio::test]
    async fn newer_document_is_never_overwritten() {
        let newer = serde_json::to_vec(&json!({ "version": 99, "buildings": [] })).expect("json");
        let repository = Arc::new(InMemoryRepository::with_document(newer.clone()));

        let error = Store::open(repository.clone(), &config(true))
            .await
            .err()
            .expect("open refused");
        assert!(matches!(
            error,
            RepositoryError::UnsupportedVersion { found: 99, .. }
        ));
        assert_eq!(repository.stored(), Some(newer));
        assert!(repository.backups().is_empty());
    }

    #[tokio::test]
    async fn unreadable_storage_refuses_to_open() {
        let dir = tempfile::tempdir().expect("temp dir");
        // The data path is a directory, so reading it as a file fails.
        let repository = Arc::new(JsonFileRepository::new(dir.path()));
        let error = Store::open(repository, &config(true))
            .await
            .err()
            .expect("open refused");
        assert!(matches!(error, RepositoryError::Io(_)));
    }

    #[tokio::test]
    async fn dispatch_persists_the_whole_document() {
        let repository = Arc::new(InMemoryRepository::new());
        let store = Store::open(repository.clone(), &config(false))
            .await
            .expect("open");

        let reduced = store.dispatch(add_building("North")).await.expect("dispatch");
        assert!(reduced.matched);

        let stored = repository.stored().expect("persisted");
        let today = store.moment().today;
        let decoded = decode_document(&stored, today).expect("decodes");
        assert_eq!(decoded, store.snapshot().await);
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_state() {
        let repository = Arc::new(InMemoryRepository::new());
        let store = Store::open(repository.clone(), &config(false))
            .await
            .expect("open");
        repository.set_fail_writes(true);

        let error = store
            .dispatch(add_building("North"))
            .await
            .expect_err("write rejected");
        assert!(matches!(error, AppError::Dependency(_)));
        assert!(store.snapshot().await.buildings.is_empty());
        assert!(repository.stored().is_none());
    }

    #[tokio::test]
    async fn unmatched_action_is_not_persisted() {
        let repository = Arc::new(InMemoryRepository::new());
        let store = Store::open(repository.clone(), &config(false))
            .await
            .expect("open");
        let reduced = store
            .dispatch(Action::DeleteBuilding { building_id: 4 })
            .await
            .expect("dispatch");
        assert!(!reduced.matched);
        assert!(repository.stored().is_none());
    }
}
