use chrono::NaiveDate;
use serde_json::Value;

use super::migrations::migrate;
use super::RepositoryError;
use crate::domain::{AppData, CURRENT_SCHEMA_VERSION};

pub fn decode_document(bytes: &[u8], today: NaiveDate) -> Result<AppData, RepositoryError> {
    let raw: Value = serde_json::from_slice(bytes)?;
    let migrated = migrate(raw, today)?;
    let mut data: AppData = serde_json::from_value(migrated)?;
    for building in &mut data.buildings {
        building.refresh_counts();
    }
    Ok(data)
}

pub fn encode_document(data: &AppData) -> Result<Vec<u8>, RepositoryError> {
    let mut bytes = if data.version == CURRENT_SCHEMA_VERSION {
        serde_json::to_vec_pretty(data)?
    } else {
        let mut data = data.clone();
        data.version = CURRENT_SCHEMA_VERSION;
        serde_json::to_vec_pretty(&data)?
    };
    bytes.push(b'\n');
    Ok(bytes)
}
