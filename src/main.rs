use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod agent;
mod api;
mod config;
mod docs;
mod model;
mod routes;
mod store;
mod tools;

use agent::model::{ModelConfig, ModelResolver};
use agent::rules::RuleResolver;
use agent::{AgentService, QueryResolver};
use config::Config;
use store::JsonStore;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Agentic Leave Management System is running."
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store = JsonStore::open(&config.data_dir).map_err(std::io::Error::other)?;
    let store = Data::new(store);

    let resolver: Arc<dyn QueryResolver> = match &config.model_api_key {
        Some(key) => {
            info!(model = %config.model_name, "using model-backed query resolver");
            let resolver = ModelResolver::new(ModelConfig {
                api_base: config.model_api_base.clone(),
                api_key: key.clone(),
                model: config.model_name.clone(),
            })
            .map_err(std::io::Error::other)?;
            Arc::new(resolver)
        }
        None => {
            warn!("OPENROUTER_API_KEY not set; using the rule-based query resolver");
            Arc::new(RuleResolver)
        }
    };
    let agent = Data::new(AgentService::new(store.clone().into_inner(), resolver));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(agent.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
