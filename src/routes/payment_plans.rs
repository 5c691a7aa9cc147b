use axum::{
    extract::{Path, State},
    Json,
};

use super::{dispatch_for_unit, load_unit, UnitView};
use crate::domain::PaymentStatus;
use crate::error::{AppError, AppResult};
use crate::schemas::{validate_input, PaymentPlanInput, UnitPath};
use crate::state::AppState;
use crate::store::Action;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/buildings/{building_id}/units/{unit_id}/payment-plan",
            axum::routing::put(set_payment_plan).delete(clear_payment_plan),
        )
        .route(
            "/buildings/{building_id}/units/{unit_id}/payment-plan/archive",
            axum::routing::post(archive_payment_plan),
        )
}

/// Replaces the plan; the payment status and collected rent follow from it.
async fn set_payment_plan(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
    Json(payload): Json<PaymentPlanInput>,
) -> AppResult<Json<UnitView>> {
    validate_input(&payload)?;
    let plan = payload.into_plan()?;
    let plan_type = plan.plan_type();
    let action = Action::UpdatePaymentPlan {
        building_id: path.building_id,
        unit_id: path.unit_id.clone(),
        plan: Some(plan),
    };
    let view = dispatch_for_unit(&state, &path, action).await?;
    tracing::info!(
        unit_id = %path.unit_id,
        plan_type = plan_type.as_str(),
        payment_status = view.unit.payment_status.map(PaymentStatus::as_str),
        "Payment plan saved"
    );
    Ok(Json(view))
}

async fn clear_payment_plan(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
) -> AppResult<Json<UnitView>> {
    let action = Action::UpdatePaymentPlan {
        building_id: path.building_id,
        unit_id: path.unit_id.clone(),
        plan: None,
    };
    Ok(Json(dispatch_for_unit(&state, &path, action).await?))
}

async fn archive_payment_plan(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
) -> AppResult<Json<UnitView>> {
    let unit = load_unit(&state, &path).await?;
    let completed = matches!(
        unit.payment_status,
        Some(PaymentStatus::PaidInFull | PaymentStatus::Exempt | PaymentStatus::Scholarship)
    );
    if !completed {
        return Err(AppError::Conflict(
            "Only completed payment plans can be archived.".to_string(),
        ));
    }
    let action = Action::ArchiveCompletedPlan {
        building_id: path.building_id,
        unit_id: path.unit_id.clone(),
    };
    Ok(Json(dispatch_for_unit(&state, &path, action).await?))
}
