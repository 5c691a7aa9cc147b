use axum::{
    extract::{Query, State},
    Json,
};

use super::dispatch_found;
use crate::domain::{AppData, YearlyForecastInput};
use crate::error::{AppError, AppResult};
use crate::schemas::{validate_input, ForecastInputs, ForecastQuery};
use crate::services::forecast::{compute, inputs_for, Capacity, Forecast};
use crate::state::AppState;
use crate::store::Action;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route(
        "/forecast",
        axum::routing::get(get_forecast).put(save_forecast),
    )
}

fn capacity(state: &AppState, data: &AppData) -> Capacity {
    Capacity::of(
        &data.buildings,
        state.config.default_apartment_rent,
        state.config.default_suite_rent,
    )
}

/// Saved inputs when they cover the requested span, defaults otherwise. With
/// no `years` the saved span (or a single year) is used.
pub(crate) async fn current_forecast(state: &AppState, years: Option<usize>) -> Forecast {
    let base_year = state.config.forecast_base_year;
    state
        .store
        .read(|data| {
            let capacity = capacity(state, data);
            let years = years.unwrap_or(data.forecast_inputs.len().max(1));
            compute(
                inputs_for(&data.forecast_inputs, &capacity, base_year, years),
                capacity,
            )
        })
        .await
}

async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Json<Forecast> {
    Json(current_forecast(&state, query.years).await)
}

/// Rented counts above the current unit totals are capped before saving.
async fn save_forecast(
    State(state): State<AppState>,
    Json(payload): Json<ForecastInputs>,
) -> AppResult<Json<Forecast>> {
    validate_input(&payload)?;
    let capacity = state.store.read(|data| capacity(&state, data)).await;
    let inputs = payload
        .inputs
        .into_iter()
        .map(|input| YearlyForecastInput {
            year: input.year,
            semesters: [
                capacity.clamp(&input.semesters[0]),
                capacity.clamp(&input.semesters[1]),
            ],
        })
        .collect::<Vec<_>>();
    let years = inputs.len();

    dispatch_found(&state, Action::SaveForecastInputs(inputs), || {
        AppError::Internal("Forecast inputs were not saved.".to_string())
    })
    .await?;
    tracing::info!(years, "Forecast inputs saved");
    Ok(Json(current_forecast(&state, Some(years)).await))
}
