// ap-grader/src/main.rs
use std::sync::Arc;

use actix_web::web;
use tracing::{error, info};

use ap_grader::api::{start_api_server, AppState};
use ap_grader::config::ApiConfig;
use ap_grader::grader::{load_preamble, Grader};
use ap_grader::llm::CohereProvider;
use ap_grader::monitoring::{init_tracing, MonitoringConfig, MonitoringContext};
use ap_grader::pdf::ReferenceLibrary;
use ap_grader::GraderResult;

fn build_grader(config: &ApiConfig) -> GraderResult<Grader> {
    let library = ReferenceLibrary::load(&config.reference_docs, config.chunk_size)?;
    let provider = CohereProvider::new(&config.llm)?;
    let preamble = load_preamble(config.llm.preamble_file.as_deref())?;
    Ok(Grader::new(
        library,
        Arc::new(provider),
        preamble,
        config.llm.api_key.clone(),
    ))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let monitoring_config = MonitoringConfig::from_env();
    let _log_guard = init_tracing(&monitoring_config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };
    info!(config = ?config, "Configuration loaded");

    let grader = match build_grader(&config) {
        Ok(grader) => grader,
        Err(e) => {
            error!(error = %e, "Failed to load reference documents");
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };
    if !grader.has_default_key() {
        info!("COHERE_API_KEY not set; users must supply a key in the page sidebar");
    }

    let state = web::Data::new(AppState::new(grader));
    let monitoring_ctx = web::Data::new(MonitoringContext::new());

    start_api_server(&config, state, monitoring_ctx)?.await
}
