use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::{dispatch_for_unit, dispatch_found, load_unit, unit_not_found, UnitView};
use crate::domain::{Unit, UnitStatus};
use crate::error::{AppError, AppResult};
use crate::schemas::{validate_input, UnitPath, UnitStatusInput, UnitsQuery, UpdateUnitInput};
use crate::state::AppState;
use crate::store::Action;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/units", axum::routing::get(list_units))
        .route(
            "/buildings/{building_id}/units/{unit_id}",
            axum::routing::get(get_unit)
                .patch(update_unit)
                .delete(delete_unit),
        )
        .route(
            "/buildings/{building_id}/units/{unit_id}/status",
            axum::routing::put(update_unit_status),
        )
}

fn matches_query(unit: &Unit, query: &UnitsQuery, search: Option<&str>) -> bool {
    query.building_id.map_or(true, |id| unit.building_id == id)
        && query.unit_type.map_or(true, |unit_type| unit.unit_type == unit_type)
        && query.status.map_or(true, |status| unit.status() == status)
        && query
            .payment_status
            .map_or(true, |status| unit.payment_status == Some(status))
        && search.map_or(true, |term| {
            unit.id.to_lowercase().contains(term)
                || unit.unit_number.to_string().contains(term)
                || unit.display_label().contains(term)
        })
}

async fn list_units(
    State(state): State<AppState>,
    Query(query): Query<UnitsQuery>,
) -> Json<Value> {
    let today = state.moment().today;
    let search = query
        .search
        .as_deref()
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty());
    let rows = state
        .store
        .read(|data| {
            data.all_units()
                .filter(|unit| matches_query(unit, &query, search.as_deref()))
                .map(|unit| UnitView::new(unit, today))
                .collect::<Vec<_>>()
        })
        .await;
    Json(json!({ "count": rows.len(), "data": rows }))
}

async fn get_unit(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
) -> AppResult<Json<UnitView>> {
    let unit = load_unit(&state, &path).await?;
    Ok(Json(UnitView::new(&unit, state.moment().today)))
}

async fn update_unit(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
    Json(payload): Json<UpdateUnitInput>,
) -> AppResult<Json<UnitView>> {
    validate_input(&payload)?;
    let patch = payload.into_patch();
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields to update.".to_string()));
    }
    let action = Action::UpdateUnit {
        building_id: path.building_id,
        unit_id: path.unit_id.clone(),
        patch,
    };
    Ok(Json(dispatch_for_unit(&state, &path, action).await?))
}

async fn delete_unit(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
) -> AppResult<StatusCode> {
    let action = Action::DeleteUnit {
        building_id: path.building_id,
        unit_id: path.unit_id.clone(),
    };
    dispatch_found(&state, action, || unit_not_found(&path)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_unit_status(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
    Json(payload): Json<UnitStatusInput>,
) -> AppResult<Json<UnitView>> {
    if payload.vacancy_reason.is_some() && payload.status != UnitStatus::UnderMaintenance {
        return Err(AppError::UnprocessableEntity(
            "vacancyReason only applies to under_maintenance.".to_string(),
        ));
    }
    let unit = load_unit(&state, &path).await?;
    let action = Action::UpdateUnitStatus {
        building_id: path.building_id,
        unit_type: unit.unit_type,
        unit_id: path.unit_id.clone(),
        status: payload.status,
        reason: payload.vacancy_reason,
    };
    Ok(Json(dispatch_for_unit(&state, &path, action).await?))
}
