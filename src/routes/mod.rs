use axum::{routing::get, Router};
use serde::Serialize;

use crate::domain::{AppData, Unit};
use crate::error::{AppError, AppResult};
use crate::schemas::UnitPath;
use crate::services::resolver::{resolve, Obligation};
use crate::state::AppState;
use crate::store::Action;

pub mod buildings;
pub mod bulk;
pub mod claims;
pub mod exports;
pub mod forecast;
pub mod health;
pub mod maintenance;
pub mod payment_plans;
pub mod reports;
pub mod state_document;
pub mod units;

pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(state_document::router())
        .merge(buildings::router())
        .merge(units::router())
        .merge(payment_plans::router())
        .merge(maintenance::router())
        .merge(claims::router())
        .merge(bulk::router())
        .merge(forecast::router())
        .merge(reports::router())
        .merge(exports::router())
}

/// A unit together with what it still owes today.
#[derive(Debug, Clone, Serialize)]
pub struct UnitView {
    #[serde(flatten)]
    pub unit: Unit,
    pub obligation: Obligation,
}

impl UnitView {
    pub fn new(unit: &Unit, today: chrono::NaiveDate) -> Self {
        Self {
            obligation: resolve(unit, today),
            unit: unit.clone(),
        }
    }
}

pub(crate) fn unit_not_found(path: &UnitPath) -> AppError {
    AppError::NotFound(format!(
        "Unit {} not found in building {}.",
        path.unit_id, path.building_id
    ))
}

pub(crate) fn require_unit<'a>(data: &'a AppData, path: &UnitPath) -> AppResult<&'a Unit> {
    data.find_unit(path.building_id, &path.unit_id)
        .ok_or_else(|| unit_not_found(path))
}

pub(crate) async fn load_unit(state: &AppState, path: &UnitPath) -> AppResult<Unit> {
    state
        .store
        .read(|data| require_unit(data, path).cloned())
        .await
}

/// Dispatches `action`; an action that matched nothing becomes a 404.
pub(crate) async fn dispatch_found(
    state: &AppState,
    action: Action,
    missing: impl FnOnce() -> AppError,
) -> AppResult<AppData> {
    let reduced = state.store.dispatch(action).await?;
    if !reduced.matched {
        return Err(missing());
    }
    Ok(reduced.state)
}

/// Dispatches a unit-scoped action and returns the unit as stored afterwards.
pub(crate) async fn dispatch_for_unit(
    state: &AppState,
    path: &UnitPath,
    action: Action,
) -> AppResult<UnitView> {
    let data = dispatch_found(state, action, || unit_not_found(path)).await?;
    let unit = require_unit(&data, path)?;
    Ok(UnitView::new(unit, state.moment().today))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, HeaderMap, Method, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::domain::AppData;
    use crate::repository::{encode_document, InMemoryRepository};
    use crate::state::AppState;
    use crate::store::actions::{FloorLayout, NewBuilding};
    use crate::store::reducer::build_from_layout;

    /// One building with apartments `A001`, `A002` and suite `S001` on floor 1.
    pub fn small_campus() -> AppData {
        let building = build_from_layout(
            1,
            NewBuilding {
                name: "مبنى 1".to_string(),
                floors: vec![FloorLayout {
                    apartments: 2,
                    suites: 1,
                }],
                apartment_rent: 1700.0,
                suite_rent: 3000.0,
            },
        );
        AppData {
            buildings: vec![building],
            ..AppData::default()
        }
    }

    pub async fn app_with(data: AppData) -> (Router, Arc<InMemoryRepository>) {
        let document = encode_document(&data).expect("encode fixture");
        let repository = Arc::new(InMemoryRepository::with_document(document));
        let config = AppConfig::for_data_file(":memory:".into());
        let state = AppState::with_repository(config, repository.clone())
            .await
            .expect("state");
        let app = Router::new()
            .nest("/v1", super::v1_router())
            .with_state(state);
        (app, repository)
    }

    pub async fn send_raw(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).expect("json body"))
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes()
            .to_vec();
        (status, headers, bytes)
    }

    /// JSON response body, `Null` when empty. Extractor rejections come back
    /// as plain text and are wrapped in a string.
    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = send_raw(app, method, uri, body).await;
        if bytes.is_empty() {
            return (status, Value::Null);
        }
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }
}
