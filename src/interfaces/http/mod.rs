use crate::application::{CsvImportUseCase, PriceAnalysisUseCase};
use crate::domain::analysis::SingleAnalysisInput;
use crate::domain::csv::{FieldMapping, RowError};
use crate::domain::error::AppError;
use crate::infrastructure::config::ServerConfig;
use crate::infrastructure::csv::{sample_csv, SAMPLE_FILE_NAME};
use actix_cors::Cors;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::StatusCode;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub analysis: Arc<PriceAnalysisUseCase>,
    pub csv_import: CsvImportUseCase,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Deserialize)]
pub struct CsvAnalysisRequest {
    pub csv: String,
    #[serde(default)]
    pub mapping: FieldMapping,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "<[RowError]>::is_empty")]
    row_errors: &'a [RowError],
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::FormatError(_)
        | AppError::MappingIncomplete(_)
        | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::NoValidRows { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Busy(_) => StatusCode::CONFLICT,
        AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
        AppError::Internal(_) | AppError::ConfigError(_) | AppError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &AppError) -> HttpResponse {
    let row_errors: &[RowError] = match err {
        AppError::NoValidRows { row_errors, .. } => row_errors,
        _ => &[],
    };

    HttpResponse::build(status_for(err)).json(ErrorBody {
        error: err.kind(),
        message: err.to_string(),
        row_errors,
    })
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[post("/csv/parse")]
async fn parse_csv(data: web::Data<HttpState>, body: web::Bytes) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "CSV",
        &format!("Parsing upload ({} bytes)", body.len()),
    );

    match data.csv_import.preview(&body) {
        Ok(preview) => HttpResponse::Ok().json(preview),
        Err(e) => {
            add_log(&data.logs, "WARN", "CSV", &format!("Upload rejected: {}", e));
            error_response(&e)
        }
    }
}

#[post("/csv/normalize")]
async fn normalize_csv(
    data: web::Data<HttpState>,
    req: web::Json<CsvAnalysisRequest>,
) -> impl Responder {
    match data.csv_import.normalize(&req.csv, &req.mapping) {
        Ok(summary) => {
            if let Some(warning) = &summary.warning {
                add_log(&data.logs, "WARN", "CSV", warning);
            }
            HttpResponse::Ok().json(summary)
        }
        Err(e) => {
            add_log(
                &data.logs,
                "WARN",
                "CSV",
                &format!("Normalization failed: {}", e),
            );
            error_response(&e)
        }
    }
}

#[get("/csv/sample")]
async fn download_sample() -> impl Responder {
    match sample_csv() {
        Ok(content) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(SAMPLE_FILE_NAME.to_string())],
            })
            .body(content),
        Err(e) => error_response(&e),
    }
}

#[post("/analyze/single")]
async fn analyze_single(
    data: web::Data<HttpState>,
    req: web::Json<SingleAnalysisInput>,
) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "Analysis",
        &format!(
            "Analyzing {} against {} competitor URL(s)",
            req.user_product_url,
            req.competitor_urls.len()
        ),
    );

    match data.analysis.analyze_single(req.into_inner()).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => {
            add_log(&data.logs, "ERROR", "Analysis", &e.to_string());
            error_response(&e)
        }
    }
}

#[post("/analyze/batch")]
async fn analyze_batch(
    data: web::Data<HttpState>,
    req: web::Json<CsvAnalysisRequest>,
) -> impl Responder {
    add_log(&data.logs, "INFO", "Analysis", "Analyzing uploaded product batch");

    match data.analysis.analyze_csv(&req.csv, &req.mapping).await {
        Ok(report) => {
            if let Some(warning) = &report.warning {
                add_log(&data.logs, "WARN", "Analysis", warning);
            }
            HttpResponse::Ok().json(report)
        }
        Err(e) => {
            add_log(&data.logs, "ERROR", "Analysis", &e.to_string());
            error_response(&e)
        }
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = match data.logs.lock() {
        Ok(logs) => logs.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    HttpResponse::Ok().json(logs)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = match logs.lock() {
        Ok(logs) => logs,
        Err(poisoned) => poisoned.into_inner(),
    };
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Register the `/api` routes and body limits
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
        .app_data(web::JsonConfig::default().limit(MAX_UPLOAD_BYTES))
        .service(
            web::scope("/api")
                .service(health)
                .service(parse_csv)
                .service(normalize_csv)
                .service(download_sample)
                .service(analyze_single)
                .service(analyze_batch)
                .service(get_logs),
        );
}

pub fn start_server(state: web::Data<HttpState>, config: &ServerConfig) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Dashboard is served from a separate origin

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    Ok(server)
}
