mod classify;
mod db;
mod error;
mod inference;
mod monitor;
mod routes;

use std::env;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;

use db::analysis_repository::AnalysisRepository;
use inference::client::{InferenceClient, DEFAULT_MODEL_ENDPOINT};
use monitor::MonitorState;
use routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let endpoint =
        env::var("INFERENCE_API_URL").unwrap_or_else(|_| DEFAULT_MODEL_ENDPOINT.to_string());
    let api_token = env::var("HUGGINGFACE_API_KEY")
        .ok()
        .filter(|token| !token.trim().is_empty());
    if api_token.is_none() {
        log::warn!(
            "HUGGINGFACE_API_KEY is not set; /api/analyze will fail until it is configured"
        );
    }

    let inference_client = InferenceClient::new(endpoint, api_token).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to build inference HTTP client: {e}"),
        )
    })?;

    // Initialize AWS configuration
    let aws_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let dynamodb_client = DynamoDbClient::new(&aws_config);
    let analyses_table =
        env::var("DYNAMODB_ANALYSES_TABLE").unwrap_or_else(|_| "ecosnap-analyses".to_string());
    let repository = AnalysisRepository::new(dynamodb_client, analyses_table);

    // Simulated sensor state, advanced on a fixed cadence.
    let monitor_state = Arc::new(Mutex::new(MonitorState::new()));
    let ticker_state = monitor_state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(monitor::TICK_INTERVAL);
        loop {
            interval.tick().await;
            ticker_state.lock().unwrap().tick(&mut rand::rng());
        }
    });

    let port = env::var("PORT").unwrap_or_else(|_| "8081".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::JsonConfig::default().limit(routes::MAX_JSON_BYTES))
            .app_data(web::Data::new(inference_client.clone()))
            .app_data(web::Data::new(repository.clone()))
            .app_data(web::Data::new(monitor_state.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
