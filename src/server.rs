use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use log::{error, info};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::data::{SchedulingInput, SchedulingOutput};
use crate::error::Result;
use crate::{report, solver};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

async fn solve_handler(
    Json(input): Json<SchedulingInput>,
) -> std::result::Result<Json<SchedulingOutput>, (StatusCode, String)> {
    match solver::solve(&input) {
        Ok(output) => Ok(Json(output)),
        Err(e) => {
            error!("solve failed: {e}");
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

/// Plain `filename` for old clients, RFC 5987 `filename*` for non-ASCII names.
fn content_disposition(teacher_name: &str) -> String {
    let name = teacher_name.trim();
    if name.is_empty() {
        return "attachment; filename=\"schedule.xlsx\"".to_string();
    }
    let filename = format!("schedule_{name}.xlsx");
    let encoded = utf8_percent_encode(&filename, NON_ALPHANUMERIC);
    if filename.is_ascii() && !filename.contains(['"', '\\']) {
        format!("attachment; filename=\"{filename}\"; filename*=UTF-8''{encoded}")
    } else {
        format!("attachment; filename=\"schedule.xlsx\"; filename*=UTF-8''{encoded}")
    }
}

async fn export_handler(Json(input): Json<SchedulingInput>) -> Response {
    let result = solver::solve(&input).and_then(|output| report::write_workbook(&output));
    match result {
        Ok(bytes) => {
            (
                [
                    (header::CONTENT_TYPE, XLSX_MIME.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        content_disposition(&input.teacher_name),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!("export failed: {e}");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/v1/schedule/solve", post(solve_handler))
        .route("/v1/schedule/export", post(export_handler))
}

pub async fn run_server(bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router()).await?;
    Ok(())
}
