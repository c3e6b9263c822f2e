pub mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::errors::GraderError;
use crate::grader::Grader;
use crate::monitoring::{self, MonitoringContext};

/// Header a user can set to grade with their own key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Shared, read-only state handed to every worker.
pub struct AppState {
    pub grader: Arc<Grader>,
}

impl AppState {
    pub fn new(grader: Grader) -> Self {
        Self {
            grader: Arc::new(grader),
        }
    }
}

/// Generate a short request ID for correlation
pub(crate) fn generate_request_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

impl ResponseError for GraderError {
    fn status_code(&self) -> StatusCode {
        match self {
            GraderError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            GraderError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            GraderError::Upstream(_) | GraderError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            GraderError::SourceUnreadable { .. } | GraderError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }))
    }
}

/// Largest accepted `/chat` body; the whole conversation travels with each request.
pub const MAX_CHAT_BODY_BYTES: usize = 256 * 1024;

/// Rejected JSON bodies get the same `{error, message}` shape as every other failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_CHAT_BODY_BYTES)
        .error_handler(|err, _req| GraderError::InvalidArgument(err.to_string()).into())
}

/// Registers every route; shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::scope("/monitoring")
                .route("/health", web::get().to(monitoring::handlers::health_handler))
                .route("/metrics", web::get().to(monitoring::handlers::metrics_handler)),
        )
        .route("/", web::get().to(handlers::index_page))
        .route("/conversation/new", web::get().to(handlers::new_conversation))
        .route("/chat", web::post().to(handlers::chat))
        .route("/documents", web::get().to(handlers::list_documents));
}

pub fn start_api_server(
    config: &ApiConfig,
    state: web::Data<AppState>,
    monitoring_ctx: web::Data<MonitoringContext>,
) -> std::io::Result<actix_web::dev::Server> {
    let bind_addr = config.bind_addr();

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::HeaderName::from_static("x-api-key"),
            ])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(monitoring_ctx.clone())
            .wrap(cors)
            .configure(configure)
    })
    .bind(&bind_addr)?
    .run();

    info!(addr = %bind_addr, "API server listening");
    Ok(server)
}
