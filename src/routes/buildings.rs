use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;

use super::{dispatch_found, UnitView};
use crate::domain::{BuildingData, RoomData};
use crate::error::{AppError, AppResult};
use crate::schemas::{validate_input, AddUnitInput, BuildingPath, CreateBuildingInput};
use crate::services::money::percentage;
use crate::state::AppState;
use crate::store::actions::NewBuilding;
use crate::store::Action;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/buildings",
            axum::routing::get(list_buildings).post(create_building),
        )
        .route(
            "/buildings/{building_id}",
            axum::routing::get(get_building).delete(delete_building),
        )
        .route(
            "/buildings/{building_id}/units",
            axum::routing::post(add_unit),
        )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupSummary {
    total: u32,
    rented: u32,
    rent: f64,
}

impl From<&RoomData> for GroupSummary {
    fn from(group: &RoomData) -> Self {
        Self {
            total: group.total,
            rented: group.rented,
            rent: group.rent,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildingSummary {
    id: u32,
    name: String,
    apartments: GroupSummary,
    suites: GroupSummary,
    total_units: usize,
    occupancy_percentage: f64,
}

impl From<&BuildingData> for BuildingSummary {
    fn from(building: &BuildingData) -> Self {
        let rented = building.apartments.rented + building.suites.rented;
        Self {
            id: building.id,
            name: building.name.clone(),
            apartments: GroupSummary::from(&building.apartments),
            suites: GroupSummary::from(&building.suites),
            total_units: building.unit_count(),
            occupancy_percentage: percentage(f64::from(rented), building.unit_count() as f64),
        }
    }
}

fn building_not_found(building_id: u32) -> AppError {
    AppError::NotFound(format!("Building {building_id} not found."))
}

async fn list_buildings(State(state): State<AppState>) -> impl IntoResponse {
    let rows = state
        .store
        .read(|data| {
            data.buildings
                .iter()
                .map(BuildingSummary::from)
                .collect::<Vec<_>>()
        })
        .await;
    Json(json!({ "data": rows }))
}

async fn get_building(
    State(state): State<AppState>,
    Path(path): Path<BuildingPath>,
) -> AppResult<Json<BuildingData>> {
    state
        .store
        .read(|data| data.building(path.building_id).cloned())
        .await
        .map(Json)
        .ok_or_else(|| building_not_found(path.building_id))
}

async fn create_building(
    State(state): State<AppState>,
    Json(payload): Json<CreateBuildingInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let layout = NewBuilding::from(payload);
    let name = layout.name.clone();
    let data = dispatch_found(&state, Action::AddBuilding(layout), || {
        AppError::Internal("Building was not created.".to_string())
    })
    .await?;

    let building = data
        .buildings
        .iter()
        .max_by_key(|building| building.id)
        .cloned()
        .ok_or_else(|| AppError::Internal("Created building is missing.".to_string()))?;
    tracing::info!(building_id = building.id, name = %name, units = building.unit_count(), "Building created");
    Ok((StatusCode::CREATED, Json(building)))
}

async fn delete_building(
    State(state): State<AppState>,
    Path(path): Path<BuildingPath>,
) -> AppResult<StatusCode> {
    let building_id = path.building_id;
    dispatch_found(&state, Action::DeleteBuilding { building_id }, || {
        building_not_found(building_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_unit(
    State(state): State<AppState>,
    Path(path): Path<BuildingPath>,
    Json(payload): Json<AddUnitInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let building_id = path.building_id;
    let (existing, group_rent) = state
        .store
        .read(|data| {
            data.building(building_id).map(|building| {
                let ids = building
                    .units()
                    .map(|unit| unit.id.clone())
                    .collect::<HashSet<_>>();
                (ids, building.group(payload.unit_type).rent)
            })
        })
        .await
        .ok_or_else(|| building_not_found(building_id))?;

    let action = Action::AddUnit {
        building_id,
        unit_type: payload.unit_type,
        floor: payload.floor,
        unit_number: payload.unit_number,
        base_rent: payload.base_rent.unwrap_or(group_rent),
    };
    let data = dispatch_found(&state, action, || building_not_found(building_id)).await?;

    let unit = data
        .building(building_id)
        .and_then(|building| {
            building
                .group(payload.unit_type)
                .units
                .iter()
                .find(|unit| !existing.contains(&unit.id))
        })
        .ok_or_else(|| AppError::Internal("Created unit is missing.".to_string()))?;
    Ok((
        StatusCode::CREATED,
        Json(UnitView::new(unit, state.moment().today)),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app_with, send, small_campus};

    #[tokio::test]
    async fn creates_building_from_floor_layout() {
        let (app, _) = app_with(small_campus()).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/buildings",
            Some(json!({
                "name": "مبنى 2",
                "floors": [{ "apartments": 2, "suites": 0 }, { "apartments": 1, "suites": 1 }],
                "apartmentRent": 1800,
                "suiteRent": 3200
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 2);
        assert_eq!(body["apartments"]["total"], 3);
        assert_eq!(body["apartments"]["units"][2]["id"], "B2-F2-A003");
        assert_eq!(body["suites"]["units"][0]["id"], "B2-F2-S001");

        let (_, list) = send(&app, Method::GET, "/v1/buildings", None).await;
        assert_eq!(list["data"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn rejects_short_names_and_empty_layouts() {
        let (app, _) = app_with(small_campus()).await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/buildings",
            Some(json!({
                "name": "مبنى 2",
                "floors": [{ "apartments": 0, "suites": 0 }],
                "apartmentRent": 1700,
                "suiteRent": 3000
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn oversized_layout_is_rejected_and_nothing_is_saved() {
        let (app, repository) = app_with(small_campus()).await;
        let before = repository.stored();
        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/buildings",
            Some(json!({
                "name": "مبنى 2",
                "floors": [{ "apartments": u32::MAX, "suites": 1 }],
                "apartmentRent": 1700,
                "suiteRent": 3000
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(repository.stored(), before);

        let (_, buildings) = send(&app, Method::GET, "/v1/buildings", None).await;
        assert_eq!(buildings["data"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn adds_units_with_group_rent_and_keeps_order() {
        let (app, _) = app_with(small_campus()).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/buildings/1/units",
            Some(json!({ "unitType": "apartment", "floor": 1, "unitNumber": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "B1-F1-A001-2");
        assert_eq!(body["baseRent"], 1700.0);
        assert_eq!(body["status"], "available");

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/buildings/9/units",
            Some(json!({ "unitType": "suite", "floor": 1, "unitNumber": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deleting_a_missing_building_is_not_found() {
        let (app, _) = app_with(small_campus()).await;
        let (status, _) = send(&app, Method::DELETE, "/v1/buildings/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, "/v1/buildings/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, list) = send(&app, Method::GET, "/v1/buildings", None).await;
        assert_eq!(list["data"], json!([]));
    }
}
