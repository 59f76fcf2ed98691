//! Reporting handlers for stock data and CSV export

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{DateRange, ReportFormat};

use crate::error::{AppError, AppResult};
use crate::middleware::team::ReportsRoute;
use crate::middleware::RequireRoute;
use crate::services::ReportingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: ReportFormat,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Current stock of every product
pub async fn get_stock_report(
    State(state): State<AppState>,
    guard: RequireRoute<ReportsRoute>,
    WithRejection(Query(query), _): WithRejection<Query<ReportQuery>, AppError>,
) -> AppResult<Response> {
    let service = ReportingService::new(state.db);
    let data = service.stock_report(guard.team_id()).await?;
    respond(&data, query.format, "estoque.csv")
}

/// Movements within an optional date range
pub async fn get_movement_report(
    State(state): State<AppState>,
    guard: RequireRoute<ReportsRoute>,
    WithRejection(Query(query), _): WithRejection<Query<ReportQuery>, AppError>,
) -> AppResult<Response> {
    let range = DateRange {
        start: query.start_date,
        end: query.end_date,
    };

    let service = ReportingService::new(state.db);
    let data = service.movement_report(guard.team_id(), &range).await?;
    respond(&data, query.format, "movimentacoes.csv")
}

fn respond<T: Serialize>(data: &[T], format: ReportFormat, filename: &str) -> AppResult<Response> {
    match format {
        ReportFormat::Json => Ok(Json(data).into_response()),
        ReportFormat::Csv => {
            let csv = ReportingService::export_to_csv(data)?;
            let disposition = format!("attachment; filename=\"{}\"", filename);
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                csv,
            )
                .into_response())
        }
    }
}
