use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;

use super::{dispatch_found, load_unit, require_unit, unit_not_found};
use crate::domain::{ClaimRecord, Unit};
use crate::error::{AppError, AppResult};
use crate::schemas::{
    validate_input, EmailClaimInput, LogClaimInput, UnitPath, WhatsappClaimInput,
};
use crate::services::claims::{
    claim_letter, international_number, whatsapp_link, ClaimChannel, LetterContext,
};
use crate::services::print::letter_document;
use crate::services::resolver::{resolve, Obligation};
use crate::state::AppState;
use crate::store::Action;

const EMAIL_SUBJECT: &str = "مطالبة مالية";

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/buildings/{building_id}/units/{unit_id}/claims",
            axum::routing::get(get_claims).post(log_claim),
        )
        .route(
            "/buildings/{building_id}/units/{unit_id}/claims/letter",
            axum::routing::get(get_letter),
        )
        .route(
            "/buildings/{building_id}/units/{unit_id}/claims/whatsapp",
            axum::routing::post(whatsapp_claim),
        )
        .route(
            "/buildings/{building_id}/units/{unit_id}/claims/email",
            axum::routing::post(email_claim),
        )
        .route(
            "/buildings/{building_id}/units/{unit_id}/claims/paper",
            axum::routing::post(paper_claim),
        )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimsView {
    unit_id: String,
    label: String,
    obligation: Obligation,
    claim_history: Vec<ClaimRecord>,
    last_claim: Option<ClaimRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LetterView {
    letter: String,
    remaining: f64,
    due_date: Option<chrono::NaiveDate>,
}

fn letter_for(state: &AppState, unit: &Unit) -> LetterView {
    let obligation = resolve(unit, state.moment().today);
    let context = LetterContext {
        term_label: &state.config.claim_term_label,
        currency_code: &state.config.currency_code,
    };
    LetterView {
        letter: claim_letter(unit, obligation.remaining, obligation.due_date, &context),
        remaining: obligation.remaining,
        due_date: obligation.due_date,
    }
}

/// Appends a claim record and returns it.
async fn record_claim(state: &AppState, path: &UnitPath, action: String) -> AppResult<ClaimRecord> {
    let log = Action::LogClaimAction {
        building_id: path.building_id,
        unit_id: path.unit_id.clone(),
        action,
    };
    let data = dispatch_found(state, log, || unit_not_found(path)).await?;
    let record = require_unit(&data, path)?
        .claim_history
        .last()
        .cloned()
        .ok_or_else(|| AppError::Internal("Claim was not recorded.".to_string()))?;
    tracing::info!(unit_id = %path.unit_id, action = %record.action, "Claim action logged");
    Ok(record)
}

async fn get_claims(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
) -> AppResult<Json<ClaimsView>> {
    let unit = load_unit(&state, &path).await?;
    Ok(Json(ClaimsView {
        unit_id: unit.id.clone(),
        label: unit.display_label(),
        obligation: resolve(&unit, state.moment().today),
        last_claim: unit.last_claim().cloned(),
        claim_history: unit.claim_history,
    }))
}

async fn log_claim(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
    Json(payload): Json<LogClaimInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let record = record_claim(&state, &path, payload.action.trim().to_string()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_letter(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
) -> AppResult<Json<LetterView>> {
    let unit = load_unit(&state, &path).await?;
    Ok(Json(letter_for(&state, &unit)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhatsappClaim {
    url: String,
    phone: String,
    message: String,
    claim: ClaimRecord,
}

async fn whatsapp_claim(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
    Json(payload): Json<WhatsappClaimInput>,
) -> AppResult<Json<WhatsappClaim>> {
    validate_input(&payload)?;
    let phone = international_number(&payload.phone, &state.config.whatsapp_country_code)?;
    let unit = load_unit(&state, &path).await?;
    let message = match payload.message {
        Some(message) if !message.trim().is_empty() => message,
        _ => letter_for(&state, &unit).letter,
    };
    let url = whatsapp_link(&phone, &message)?;
    let claim = record_claim(&state, &path, ClaimChannel::Whatsapp.label().to_string()).await?;
    Ok(Json(WhatsappClaim {
        url: url.to_string(),
        phone,
        message,
        claim,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailClaim {
    recipient: String,
    subject: &'static str,
    message: String,
    claim: ClaimRecord,
}

/// Logs the claim and returns the prepared message. Delivery is left to the
/// client's mail program.
async fn email_claim(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
    Json(payload): Json<EmailClaimInput>,
) -> AppResult<Json<EmailClaim>> {
    validate_input(&payload)?;
    let unit = load_unit(&state, &path).await?;
    let message = match payload.message {
        Some(message) if !message.trim().is_empty() => message,
        _ => letter_for(&state, &unit).letter,
    };
    let claim = record_claim(&state, &path, ClaimChannel::Email.label().to_string()).await?;
    Ok(Json(EmailClaim {
        recipient: payload.email,
        subject: EMAIL_SUBJECT,
        message,
        claim,
    }))
}

async fn paper_claim(
    State(state): State<AppState>,
    Path(path): Path<UnitPath>,
) -> AppResult<Html<String>> {
    let unit = load_unit(&state, &path).await?;
    let letter = letter_for(&state, &unit).letter;
    record_claim(&state, &path, ClaimChannel::Paper.label().to_string()).await?;
    let title = format!("{EMAIL_SUBJECT} {}", unit.display_label());
    Ok(Html(letter_document(&title, &letter)))
}

#[cfg(test)]
mod tests {
    use axum::http::{header, Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{app_with, send, send_raw, small_campus};

    const UNIT: &str = "/v1/buildings/1/units/B1-F1-A001";

    #[tokio::test]
    async fn whatsapp_validates_the_number_and_logs_the_claim() {
        let (app, _) = app_with(small_campus()).await;
        let whatsapp = format!("{UNIT}/claims/whatsapp");
        let (status, _) = send(&app, Method::POST, &whatsapp, Some(json!({ "phone": "0551234567" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(&app, Method::POST, &whatsapp, Some(json!({ "phone": "551234567" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phone"], "966551234567");
        let url = body["url"].as_str().expect("url");
        assert!(url.starts_with("https://wa.me/966551234567?text="));
        assert_eq!(body["claim"]["action"], "مطالبة عبر واتساب");

        let (_, claims) = send(&app, Method::GET, &format!("{UNIT}/claims"), None).await;
        assert_eq!(claims["claimHistory"].as_array().map(Vec::len), Some(1));
        assert_eq!(claims["lastClaim"]["action"], "مطالبة عبر واتساب");
    }

    #[tokio::test]
    async fn letter_uses_unspecified_date_without_a_plan() {
        let (app, _) = app_with(small_campus()).await;
        let (status, body) = send(&app, Method::GET, &format!("{UNIT}/claims/letter"), None).await;
        assert_eq!(status, StatusCode::OK);
        let letter = body["letter"].as_str().expect("letter");
        assert!(letter.contains("مبنى رقم (1) غرفة رقم(1)"));
        assert!(letter.contains("(غير محدد)"));
    }

    #[tokio::test]
    async fn paper_claim_returns_printable_html() {
        let (app, _) = app_with(small_campus()).await;
        let (status, headers, bytes) =
            send_raw(&app, Method::POST, &format!("{UNIT}/claims/paper"), None).await;
        assert_eq!(status, StatusCode::OK);
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("text/html"));
        let html = String::from_utf8(bytes).expect("utf-8");
        assert!(html.contains("<pre>"));

        let (_, claims) = send(&app, Method::GET, &format!("{UNIT}/claims"), None).await;
        assert_eq!(claims["lastClaim"]["action"], "مطالبة ورقية للطباعة");
    }

    #[tokio::test]
    async fn email_claim_requires_an_address() {
        let (app, _) = app_with(small_campus()).await;
        let email = format!("{UNIT}/claims/email");
        let (status, _) = send(&app, Method::POST, &email, Some(json!({ "email": "nope" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (status, body) = send(
            &app,
            Method::POST,
            &email,
            Some(json!({ "email": "student@example.com", "message": "تذكير" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "تذكير");
        assert_eq!(body["claim"]["action"], "مطالبة عبر البريد الإلكتروني");
    }
}
