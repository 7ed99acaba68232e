use actix::Addr;
use actix_web::dev::Server;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, Responder, ResponseError};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use uuid::Uuid;

use crate::actors::{GetSystemHealth, HealthMonitorActor};
use crate::cache::AlumniSummaryCache;
use crate::error::AppError;
use crate::reporting::ReportService;

use super::Metrics;

/// Everything the HTTP handlers read from
#[derive(Clone)]
pub struct HttpState {
    pub metrics: Arc<Metrics>,
    pub reports: Arc<ReportService>,
    pub summaries: Arc<AlumniSummaryCache>,
    pub health: Addr<HealthMonitorActor>,
}

/// Build the HTTP server for metrics, health and read models.
/// The returned server must be awaited or spawned to run.
pub fn start_http_server(state: HttpState, port: u16) -> std::io::Result<Server> {
    tracing::info!("📊 Starting HTTP server on http://0.0.0.0:{}", port);

    let server = HttpServer::new(move || App::new().configure(routes(state.clone())))
        .bind(("0.0.0.0", port))?
        .run();
    Ok(server)
}

fn routes(state: HttpState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(state))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler))
            .route("/reports/dashboard", web::get().to(dashboard_handler))
            .route("/alumni/{alumni_id}/summary", web::get().to(summary_handler));
    }
}

async fn metrics_handler(state: web::Data<HttpState>) -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(state: web::Data<HttpState>) -> HttpResponse {
    match state.health.send(GetSystemHealth).await {
        Ok(health) if health.overall_status.is_unhealthy() => HttpResponse::ServiceUnavailable().json(health),
        Ok(health) => HttpResponse::Ok().json(health),
        Err(e) => {
            tracing::error!("Health monitor unreachable: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "overall_status": { "status": "unhealthy", "reason": "health monitor unavailable" }
            }))
        }
    }
}

async fn dashboard_handler(state: web::Data<HttpState>) -> Result<impl Responder, AppError> {
    let report = state.reports.dashboard().await?;
    Ok(web::Json(report))
}

async fn summary_handler(
    state: web::Data<HttpState>,
    alumni_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let summary = state.summaries.get_or_load(alumni_id.into_inner()).await?;
    Ok(web::Json(summary))
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BusinessRule { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Internal details stay in the logs
            AppError::Infrastructure(err) => {
                tracing::error!(error = %err, "Request failed");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "code": self.code(),
            "message": message,
        }))
    }
}
