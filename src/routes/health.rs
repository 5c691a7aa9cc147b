use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let moment = state.moment();
    let (buildings, units) = state
        .store
        .read(|data| (data.buildings.len(), data.all_units().count()))
        .await;

    Json(json!({
        "status": "ok",
        "now": moment.now.to_rfc3339(),
        "today": moment.today,
        "buildings": buildings,
        "units": units,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::routes::test_support::{app_with, send, small_campus};

    #[tokio::test]
    async fn reports_document_size() {
        let (app, _) = app_with(small_campus()).await;
        let (status, body) = send(&app, Method::GET, "/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["buildings"], 1);
        assert_eq!(body["units"], 3);
    }
}
