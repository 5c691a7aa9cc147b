use axum::extract::State;
use axum::Json;

use crate::domain::AppData;
use crate::error::{AppError, AppResult};
use crate::schemas::{validate_input, ReplaceBuildingsInput};
use crate::state::AppState;
use crate::store::Action;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/state", axum::routing::get(get_state))
        .route("/state/buildings", axum::routing::put(replace_buildings))
}

async fn get_state(State(state): State<AppState>) -> Json<AppData> {
    Json(state.store.snapshot().await)
}

/// Whole-tree import; the unit counters are recomputed on the way in.
async fn replace_buildings(
    State(state): State<AppState>,
    Json(payload): Json<ReplaceBuildingsInput>,
) -> AppResult<Json<AppData>> {
    validate_input(&payload)?;
    let count = payload.buildings.len();
    let reduced = state
        .store
        .dispatch(Action::ReplaceBuildings(payload.buildings))
        .await?;
    if !reduced.matched {
        return Err(AppError::Internal("Building import was not applied.".to_string()));
    }
    tracing::info!(buildings = count, "Replaced building tree");
    Ok(Json(reduced.state))
}
