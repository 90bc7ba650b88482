//! HTTP Server for the cost impact API.
//!
//! Provides REST endpoints for uploading the three input files and
//! downloading the summaries.
//!
//! # API Endpoints
//!
//! | Method | Path                   | Description                          |
//! |--------|------------------------|--------------------------------------|
//! | GET    | `/health`              | Health check                         |
//! | POST   | `/api/analyze`         | Upload inputs, get summaries as JSON |
//! | POST   | `/api/export/family`   | Upload inputs, get `PM_Summary.csv`  |
//! | POST   | `/api/export/group`    | Upload inputs, get `PG_Summary.csv`  |
//! | GET    | `/api/logs`            | SSE stream for real-time logs        |

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_info, RunLogger, LOG_BROADCASTER};
use super::types::{error_response, AnalyzeResponse};
use crate::config::AppConfig;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::models::{CoverageParams, GroupBy, InputKind};
use crate::report::summary_to_csv;
use crate::transform::pipeline::{compute_from_bytes, ImpactReport, InputBytes};

type Rejection = (StatusCode, Json<Value>);

/// Start the HTTP server
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let app = router(config).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Cost impact server running on http://localhost:{}", port);
    println!("   POST /api/analyze         - Upload cost, sales and classification files");
    println!("   POST /api/export/{{level}}  - Download a summary CSV (family | group)");
    println!("   GET  /api/logs            - SSE log stream");
    println!("   GET  /health              - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes without the CORS layer.
///
/// Request bodies are capped at `config.max_upload_bytes()`.
pub fn router(config: AppConfig) -> Router {
    let body_limit = DefaultBodyLimit::max(config.max_upload_bytes());

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/export/{level}", post(export_summary))
        .route("/api/logs", get(sse_logs))
        .layer(body_limit)
        .with_state(Arc::new(config))
}

/// Health check endpoint
async fn health(State(config): State<Arc<AppConfig>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "costimpact",
        "version": env!("CARGO_PKG_VERSION"),
        "tier": if config.limits.is_pro { "pro" } else { "basic" },
        "skuLimit": config.limits.sku_limit,
        "maxUploadMb": config.max_upload_mb,
        "endpoints": {
            "analyze": "POST /api/analyze",
            "export": "POST /api/export/{family|group}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        // Lagged receivers skip what they missed
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Analysis endpoint
async fn analyze(
    State(config): State<Arc<AppConfig>>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, Rejection> {
    let form = AnalyzeForm::read(multipart).await.map_err(reject)?;
    let report = run(&config, form).await.map_err(reject)?;

    Ok(Json(AnalyzeResponse::from(report)))
}

/// Summary CSV download
async fn export_summary(
    State(config): State<Arc<AppConfig>>,
    Path(level): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, Rejection> {
    let group_by: GroupBy = level
        .parse()
        .map_err(|e: String| reject(ServerError::BadRequest(e)))?;

    let form = AnalyzeForm::read(multipart).await.map_err(reject)?;
    let report = run(&config, form).await.map_err(reject)?;

    let summary = match group_by {
        GroupBy::Family => &report.family_summary,
        GroupBy::Group => &report.group_summary,
    };
    let body = summary_to_csv(summary)
        .map_err(|e| reject(ServerError::Internal(e.to_string())))?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", group_by.file_name()),
        ),
    ];
    Ok((headers, body))
}

// =============================================================================
// Form handling
// =============================================================================

/// Fields of the upload form.
#[derive(Debug, Default)]
struct AnalyzeForm {
    cost: Option<Vec<u8>>,
    sales: Option<Vec<u8>>,
    classification: Option<Vec<u8>>,
    total_months: Option<String>,
    stock_months: Option<String>,
    access_code: Option<String>,
}

impl AnalyzeForm {
    async fn read(mut multipart: Multipart) -> ServerResult<Self> {
        let mut form = AnalyzeForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error("Multipart error", e))?
        {
            let name = field.name().unwrap_or("").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| multipart_error("Read error", e))?;

            match InputKind::from_field(&name) {
                Some(InputKind::Cost) => form.cost = Some(data.to_vec()),
                Some(InputKind::Sales) => form.sales = Some(data.to_vec()),
                Some(InputKind::Classification) => form.classification = Some(data.to_vec()),
                None => {
                    let text = String::from_utf8_lossy(&data).trim().to_string();
                    match name.as_str() {
                        "total_months" => form.total_months = Some(text),
                        "stock_months" => form.stock_months = Some(text),
                        "access_code" => form.access_code = Some(text),
                        // Unknown fields are ignored
                        _ => {}
                    }
                }
            }
        }

        Ok(form)
    }

    fn coverage(&self) -> ServerResult<CoverageParams> {
        let defaults = CoverageParams::default();
        let total_months = parse_month(self.total_months.as_deref(), "total_months")?
            .unwrap_or(defaults.total_months);
        let stock_months = parse_month(self.stock_months.as_deref(), "stock_months")?
            .unwrap_or(defaults.stock_months);
        Ok(CoverageParams::new(total_months, stock_months))
    }

    fn file(&self, kind: InputKind) -> ServerResult<&[u8]> {
        let data = match kind {
            InputKind::Cost => &self.cost,
            InputKind::Sales => &self.sales,
            InputKind::Classification => &self.classification,
        };
        data.as_deref()
            .ok_or_else(|| PipelineError::MissingInput(kind.label().to_string()).into())
    }
}

/// Body-limit hits become 413, anything else is a malformed form.
fn multipart_error(context: &str, err: MultipartError) -> ServerError {
    let message = format!("{}: {}", context, err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(message)
    } else {
        ServerError::BadRequest(message)
    }
}

fn parse_month(raw: Option<&str>, field: &str) -> ServerResult<Option<i64>> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            ServerError::BadRequest(format!("{} must be a whole number, got {:?}", field, value))
        }),
    }
}

/// Check the gate, then run the computation off the async runtime.
async fn run(config: &AppConfig, form: AnalyzeForm) -> ServerResult<ImpactReport> {
    let code = form.access_code.as_deref().unwrap_or("");
    if !config.gate.check(code) {
        log_info("🔒 Rejected upload with invalid access code");
        return Err(ServerError::Unauthorized);
    }

    let coverage = form.coverage()?;
    for kind in InputKind::ALL {
        form.file(kind)?;
    }
    let limits = config.limits;
    let logger = RunLogger::new(Uuid::new_v4().to_string());

    logger.info("=".repeat(70));
    logger.info(format!(
        "📄 NEW RUN {} (cost {} B, sales {} B, classification {} B)",
        logger.run_id(),
        form.cost.as_ref().map_or(0, Vec::len),
        form.sales.as_ref().map_or(0, Vec::len),
        form.classification.as_ref().map_or(0, Vec::len),
    ));

    tokio::task::spawn_blocking(move || {
        let inputs = InputBytes {
            cost: form.file(InputKind::Cost)?,
            sales: form.file(InputKind::Sales)?,
            classification: form.file(InputKind::Classification)?,
        };
        compute_from_bytes(inputs, coverage, limits, &logger).map_err(|e| {
            logger.error(e.to_string());
            ServerError::from(e)
        })
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Worker failed: {}", e)))?
}

// =============================================================================
// Error mapping
// =============================================================================

/// HTTP status for a failed request.
fn status_of(err: &ServerError) -> StatusCode {
    match err {
        ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ServerError::Pipeline(pipeline) => match pipeline {
            PipelineError::SkuLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Csv { .. }
            | PipelineError::Table(_)
            | PipelineError::Parameter(_)
            | PipelineError::MissingInput(_) => StatusCode::BAD_REQUEST,
        },
    }
}

fn reject(err: ServerError) -> Rejection {
    let status = status_of(&err);
    if status.is_server_error() {
        eprintln!("❌ Request failed: {}", err);
    }
    (status, Json(error_response(&err.to_string())))
}
