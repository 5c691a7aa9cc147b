use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::dispatch_found;
use crate::error::{AppError, AppResult};
use crate::schemas::{validate_input, BulkBaseRentsInput, BulkPaymentStatusInput};
use crate::state::AppState;
use crate::store::Action;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/bulk/base-rents", axum::routing::put(update_base_rents))
        .route(
            "/bulk/payment-statuses",
            axum::routing::put(update_payment_statuses),
        )
}

fn not_applied() -> AppError {
    AppError::Internal("Bulk update was not applied.".to_string())
}

async fn update_base_rents(
    State(state): State<AppState>,
    Json(payload): Json<BulkBaseRentsInput>,
) -> AppResult<Json<Value>> {
    validate_input(&payload)?;
    let action = Action::UpdateAllBaseRents {
        apartment_rent: payload.apartment_rent,
        suite_rent: payload.suite_rent,
    };
    let data = dispatch_found(&state, action, not_applied).await?;
    let units = data.all_units().count();
    tracing::info!(
        apartment_rent = payload.apartment_rent,
        suite_rent = payload.suite_rent,
        units,
        "Base rents updated"
    );
    Ok(Json(json!({
        "bulkRentValues": data.bulk_rent_values,
        "updatedUnits": units,
    })))
}

/// Applies to rented units in scope only; their payment plans are cleared.
async fn update_payment_statuses(
    State(state): State<AppState>,
    Json(payload): Json<BulkPaymentStatusInput>,
) -> AppResult<Json<Value>> {
    let action = Action::UpdateAllPaymentStatuses {
        scope: payload.scope,
        payment_status: payload.payment_status,
    };
    let data = dispatch_found(&state, action, not_applied).await?;
    let updated = data
        .all_units()
        .filter(|unit| unit.is_rented() && payload.scope.covers(unit.unit_type))
        .count();
    tracing::info!(updated, "Payment statuses updated in bulk");
    Ok(Json(json!({ "updatedUnits": updated })))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app_with, send, small_campus};

    #[tokio::test]
    async fn base_rents_apply_per_unit_type() {
        let (app, _) = app_with(small_campus()).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/v1/bulk/base-rents",
            Some(json!({ "apartmentRent": 1800, "suiteRent": 3300 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updatedUnits"], 3);
        assert_eq!(body["bulkRentValues"]["suiteRent"], 3300.0);

        let (_, unit) = send(&app, Method::GET, "/v1/buildings/1/units/B1-F1-S001", None).await;
        assert_eq!(unit["baseRent"], 3300.0);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/v1/bulk/base-rents",
            Some(json!({ "apartmentRent": -1, "suiteRent": 3300 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn payment_statuses_touch_rented_units_in_scope() {
        let (app, _) = app_with(small_campus()).await;
        for unit in ["B1-F1-A001", "B1-F1-S001"] {
            send(
                &app,
                Method::PUT,
                &format!("/v1/buildings/1/units/{unit}/status"),
                Some(json!({ "status": "rented" })),
            )
            .await;
        }
        let (status, body) = send(
            &app,
            Method::PUT,
            "/v1/bulk/payment-statuses",
            Some(json!({ "scope": "rented_apartments", "paymentStatus": "deferred" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updatedUnits"], 1);

        let (_, rows) = send(&app, Method::GET, "/v1/units?payment_status=deferred", None).await;
        assert_eq!(rows["count"], 1);
        assert_eq!(rows["data"][0]["id"], "B1-F1-A001");
    }
}
