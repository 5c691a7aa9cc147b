use axum::{
    extract::{Query, State},
    Json,
};

use crate::schemas::{DuesQuery, ForecastQuery, SearchQuery};
use crate::services::forecast::Forecast;
use crate::services::reports::{
    building_revenue_report, claims_queue, dues_report, lost_revenue_report, maintenance_report,
    payment_plans_overview, BuildingRevenueReport, ClaimsQueue, DuesReport, LostRevenueReport,
    MaintenanceReport, PaymentPlansOverview,
};
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/reports/dues", axum::routing::get(dues))
        .route("/reports/payment-plans", axum::routing::get(payment_plans))
        .route("/reports/claims", axum::routing::get(claims))
        .route("/reports/lost-revenue", axum::routing::get(lost_revenue))
        .route(
            "/reports/building-revenue",
            axum::routing::get(building_revenue),
        )
        .route("/reports/maintenance", axum::routing::get(maintenance))
        .route("/reports/forecast", axum::routing::get(forecast))
}

async fn dues(State(state): State<AppState>, Query(query): Query<DuesQuery>) -> Json<DuesReport> {
    let today = state.moment().today;
    Json(
        state
            .store
            .read(|data| dues_report(&data.buildings, query.view, today))
            .await,
    )
}

async fn payment_plans(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<PaymentPlansOverview> {
    let today = state.moment().today;
    let search = query.search.as_deref();
    Json(
        state
            .store
            .read(|data| payment_plans_overview(&data.buildings, today, search))
            .await,
    )
}

async fn claims(State(state): State<AppState>) -> Json<ClaimsQueue> {
    let today = state.moment().today;
    Json(
        state
            .store
            .read(|data| claims_queue(&data.buildings, today))
            .await,
    )
}

async fn lost_revenue(State(state): State<AppState>) -> Json<LostRevenueReport> {
    let today = state.moment().today;
    Json(
        state
            .store
            .read(|data| lost_revenue_report(&data.buildings, today))
            .await,
    )
}

async fn building_revenue(State(state): State<AppState>) -> Json<BuildingRevenueReport> {
    Json(
        state
            .store
            .read(|data| building_revenue_report(&data.buildings))
            .await,
    )
}

async fn maintenance(State(state): State<AppState>) -> Json<MaintenanceReport> {
    let today = state.moment().today;
    Json(
        state
            .store
            .read(|data| maintenance_report(&data.buildings, today))
            .await,
    )
}

async fn forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Json<Forecast> {
    Json(super::forecast::current_forecast(&state, query.years).await)
}
