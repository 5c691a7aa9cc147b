use axum::{
    extract::{Path, State},
    Json,
};

use super::{dispatch_found, load_unit, require_unit, UnitView};
use crate::error::{AppError, AppResult};
use crate::schemas::{validate_input, CompleteMaintenanceInput, UnitPath};
use crate::state::AppState;
use crate::store::Action;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/buildings/{building_id}/units/{unit_id}/maintenance/complete",
            axum::routing::post(complete_maintenance),
        )
        .route(
            "/buildings/{building_id}/units/{unit_id}/maintenance/cancel",
            axum::routing::post(cancel_maintenance),
        )
}

fn not_under_maintenance(path: &UnitPath) -> AppError {
    AppError::Conflict(format!("Unit {} is not under maintenance.", path.unit_id))
}

async fn require_under_maintenance(state: &AppState, path: &UnitPath) -> AppResult<()> {
    let unit = load_unit(state, path).await?;
    if unit.active_maintenance().is_none() {
        return Err(not_under_maintenance(path));
    }
    Ok(())
}

/// Dispatches a maintenance action; a unit that left maintenance in the
/// meantime is a conflict.
async fn dispatch_maintenance(
    state: &AppState,
    path: &UnitPath,
    action: Action,
) -> AppResult<UnitView> {
    let data = dispatch_found(state, action, || not_under_maintenance(path)).await?;
    let unit = require_unit(&data, path)?;
    Ok(UnitView::new(unit, state.moment().today))
}

/// Records the final reason, expected end date and cost, archives the
/// episode and restores the status the unit had before, in one write.
async fn complete_maintenance(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
    Json(payload): Json<CompleteMaintenanceInput>,
) -> AppResult<Json<UnitView>> {
    validate_input(&payload)?;
    require_under_maintenance(&state, &path).await?;

    let action = Action::CompleteMaintenance {
        building_id: path.building_id,
        unit_id: path.unit_id.clone(),
        patch: Some(payload.patch()),
    };
    let view = dispatch_maintenance(&state, &path, action).await?;
    tracing::info!(
        unit_id = %path.unit_id,
        reason = payload.vacancy_reason.as_str(),
        restored_status = view.unit.status().as_str(),
        "Maintenance completed"
    );
    Ok(Json(view))
}

async fn cancel_maintenance(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
) -> AppResult<Json<UnitView>> {
    require_under_maintenance(&state, &path).await?;
    let action = Action::CancelMaintenance {
        building_id: path.building_id,
        unit_id: path.unit_id.clone(),
    };
    Ok(Json(dispatch_maintenance(&state, &path, action).await?))
}
