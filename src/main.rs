use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use meal_calorie_bot::app_state::AppState;
use meal_calorie_bot::config::{AppConfig, DETECT_RESULTS_DIR, IMAGES_DIR};
use meal_calorie_bot::db;
use meal_calorie_bot::routes;
use meal_calorie_bot::services::{
    detector::YoloDetector, imgur::ImgurClient, labels::LabelResolver, line::LineClient,
    queue::JobQueue, worker::Worker,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing meal-calorie-bot");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_histogram!(
        "meal_job_processing_seconds",
        "Time from dequeue to final reply for one image"
    );
    metrics::describe_counter!("meal_jobs_total", "Image jobs taken by the worker");
    metrics::describe_counter!("meal_jobs_completed", "Image jobs answered with a calorie summary");
    metrics::describe_counter!("meal_jobs_failed", "Image jobs answered with a failure reply");
    metrics::describe_gauge!("meal_jobs_queue_depth", "Image jobs waiting for the worker");

    // Open the calorie database
    tracing::info!(db_path = %config.db_path.display(), "Opening calorie database");
    let calories = db::init_pool(&config.db_path)
        .await
        .expect("Failed to open calorie database");

    std::fs::create_dir_all(IMAGES_DIR).expect("Failed to create image directory");

    let chat = Arc::new(LineClient::new(config.line_channel_access_token.as_str()));
    let detector = Arc::new(YoloDetector::new(
        &config.yolo_path,
        &config.weights_path,
        Path::new(DETECT_RESULTS_DIR),
    ));
    let host = Arc::new(ImgurClient::new(config.imgur_client_id.as_str()));
    let resolver = LabelResolver::new(Arc::new(calories));

    // Start the background worker
    let (queue, jobs) = JobQueue::new();
    let worker = Worker::new(chat.clone(), detector, host, resolver);
    let worker_handle = tokio::spawn(worker.run(jobs));

    let state = AppState::new(&config.line_channel_secret, IMAGES_DIR, chat, queue.clone());

    let app = routes::router(state).route(
        "/metrics",
        get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
    );

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
        .expect("Server error");

    tracing::info!(pending = queue.depth(), "Server stopped, draining job queue");
    if queue.stop().is_ok() {
        if let Err(e) = worker_handle.await {
            tracing::error!(error = %e, "Worker task failed");
        }
    }
}
