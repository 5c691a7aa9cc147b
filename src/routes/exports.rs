use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Response},
};

use crate::error::{AppError, AppResult};
use crate::schemas::DuesQuery;
use crate::services::exports::{
    building_revenue_export, claims_export, dues_export, lost_revenue_export, maintenance_export,
    Export,
};
use crate::services::print::table_document;
use crate::services::reports::{
    building_revenue_report, claims_queue, dues_report, lost_revenue_report, maintenance_report,
    DuesView,
};
use crate::services::spreadsheet::export_filename;
use crate::state::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/exports/dues", axum::routing::get(export_dues))
        .route("/exports/claims", axum::routing::get(export_claims))
        .route(
            "/exports/lost-revenue",
            axum::routing::get(export_lost_revenue),
        )
        .route(
            "/exports/building-revenue",
            axum::routing::get(export_building_revenue),
        )
        .route(
            "/exports/maintenance",
            axum::routing::get(export_maintenance),
        )
        .route("/print/dues", axum::routing::get(print_dues))
        .route(
            "/print/building-revenue",
            axum::routing::get(print_building_revenue),
        )
}

#[derive(Debug, Clone, Copy)]
enum ReportKind {
    Dues(DuesView),
    Claims,
    LostRevenue,
    BuildingRevenue,
    Maintenance,
}

impl ReportKind {
    /// ASCII stem for clients that ignore `filename*`.
    fn slug(self) -> &'static str {
        match self {
            Self::Dues(DuesView::Overdue) => "overdue-dues",
            Self::Dues(DuesView::Upcoming) => "upcoming-dues",
            Self::Claims => "claims",
            Self::LostRevenue => "lost-revenue",
            Self::BuildingRevenue => "building-revenue",
            Self::Maintenance => "maintenance",
        }
    }
}

async fn build_export(state: &AppState, kind: ReportKind) -> Export {
    let today = state.moment().today;
    let currency = state.config.currency_code.as_str();
    state
        .store
        .read(|data| match kind {
            ReportKind::Dues(view) => {
                dues_export(&dues_report(&data.buildings, view, today), currency)
            }
            ReportKind::Claims => {
                claims_export(&claims_queue(&data.buildings, today).active_dues, currency)
            }
            ReportKind::LostRevenue => {
                lost_revenue_export(&lost_revenue_report(&data.buildings, today))
            }
            ReportKind::BuildingRevenue => {
                building_revenue_export(&building_revenue_report(&data.buildings), currency)
            }
            ReportKind::Maintenance => {
                maintenance_export(&maintenance_report(&data.buildings, today), currency)
            }
        })
        .await
}

/// `attachment` disposition with an ASCII fallback name and the titled name
/// percent-encoded as UTF-8.
fn content_disposition(fallback: &str, filename: &str) -> AppResult<HeaderValue> {
    let encoded = url::form_urlencoded::byte_serialize(filename.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    HeaderValue::from_str(&format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}"
    ))
    .map_err(|error| AppError::Internal(format!("Invalid download header: {error}")))
}

async fn xlsx_response(state: &AppState, kind: ReportKind) -> AppResult<Response> {
    let export = build_export(state, kind).await;
    let bytes = export
        .workbook
        .to_xlsx()
        .map_err(|error| AppError::Internal(format!("Spreadsheet export failed: {error}")))?;

    let today = state.moment().today;
    let disposition = content_disposition(
        &export_filename(kind.slug(), today),
        &export_filename(&export.title, today),
    )?;
    tracing::info!(report = kind.slug(), bytes = bytes.len(), "Spreadsheet exported");
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn print_response(state: &AppState, kind: ReportKind) -> AppResult<Html<String>> {
    let export = build_export(state, kind).await;
    let sheet = export
        .primary_sheet()
        .ok_or_else(|| AppError::Internal("Report has no printable table.".to_string()))?;
    Ok(Html(table_document(sheet)))
}

async fn export_dues(
    State(state): State<AppState>,
    Query(query): Query<DuesQuery>,
) -> AppResult<Response> {
    xlsx_response(&state, ReportKind::Dues(query.view)).await
}

async fn export_claims(State(state): State<AppState>) -> AppResult<Response> {
    xlsx_response(&state, ReportKind::Claims).await
}

async fn export_lost_revenue(State(state): State<AppState>) -> AppResult<Response> {
    xlsx_response(&state, ReportKind::LostRevenue).await
}

async fn export_building_revenue(State(state): State<AppState>) -> AppResult<Response> {
    xlsx_response(&state, ReportKind::BuildingRevenue).await
}

async fn export_maintenance(State(state): State<AppState>) -> AppResult<Response> {
    xlsx_response(&state, ReportKind::Maintenance).await
}

async fn print_dues(
    State(state): State<AppState>,
    Query(query): Query<DuesQuery>,
) -> AppResult<Html<String>> {
    print_response(&state, ReportKind::Dues(query.view)).await
}

async fn print_building_revenue(State(state): State<AppState>) -> AppResult<Html<String>> {
    print_response(&state, ReportKind::BuildingRevenue).await
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use axum::http::{header, Method, StatusCode};

    use super::content_disposition;
    use crate::routes::test_support::{app_with, send_raw, small_campus};

    fn header_str<'a>(headers: &'a axum::http::HeaderMap, name: header::HeaderName) -> &'a str {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    #[test]
    fn disposition_keeps_an_ascii_fallback() {
        let value = content_disposition("dues_2026-02-15.xlsx", "تقرير الصيانة_2026-02-15.xlsx")
            .expect("header");
        let value = value.to_str().expect("ascii header");
        assert!(value.starts_with("attachment; filename=\"dues_2026-02-15.xlsx\""));
        assert!(value.contains("filename*=UTF-8''%D8%AA"));
        assert!(value.contains("%20"));
    }

    #[tokio::test]
    async fn building_revenue_downloads_as_xlsx() {
        let (app, _) = app_with(small_campus()).await;
        let (status, headers, bytes) =
            send_raw(&app, Method::GET, "/v1/exports/building-revenue", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            header_str(&headers, header::CONTENT_TYPE),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert!(header_str(&headers, header::CONTENT_DISPOSITION)
            .contains("filename=\"building-revenue_"));

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("xlsx archive");
        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .expect("first sheet")
            .read_to_string(&mut sheet)
            .expect("utf-8 sheet");
        assert!(sheet.contains("مبنى 1"));
        assert!(archive.by_name("xl/worksheets/sheet2.xml").is_ok());
    }

    #[tokio::test]
    async fn every_export_builds_a_workbook() {
        let (app, _) = app_with(small_campus()).await;
        for uri in [
            "/v1/exports/dues",
            "/v1/exports/dues?view=upcoming",
            "/v1/exports/claims",
            "/v1/exports/lost-revenue",
            "/v1/exports/maintenance",
        ] {
            let (status, _, bytes) = send_raw(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert!(zip::ZipArchive::new(Cursor::new(bytes)).is_ok(), "{uri}");
        }
    }

    #[tokio::test]
    async fn print_renders_the_report_table() {
        let (app, _) = app_with(small_campus()).await;
        let (status, headers, bytes) =
            send_raw(&app, Method::GET, "/v1/print/building-revenue", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(header_str(&headers, header::CONTENT_TYPE).starts_with("text/html"));
        let html = String::from_utf8(bytes).expect("utf-8");
        assert!(html.contains("<table>"));
        assert!(html.contains("تقرير إيرادات المباني"));

        let (status, _, bytes) = send_raw(&app, Method::GET, "/v1/print/dues", None).await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(bytes).expect("utf-8");
        assert!(html.contains("مديونيات مالية تم استحقاقها"));
    }
}
