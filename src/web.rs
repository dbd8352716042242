use anyhow::Result;
use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::actions;
use crate::auth::JwtService;
use crate::config::AppConfig;
use crate::store::Stores;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

// App state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub jwt: Arc<JwtService>,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(stores: Stores, config: &AppConfig) -> Self {
        Self {
            stores,
            jwt: Arc::new(JwtService::new(
                &config.jwt_secret,
                config.jwt_algorithm,
                config.token_ttl,
            )),
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

// Middleware for request logging with correlation ID
async fn request_logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = Uuid::new_v4().to_string()[..8].to_string();
    let start_time = Instant::now();

    info!("Started {} {} [{}]", method, path, request_id);

    let response = next.run(request).await;
    let duration = start_time.elapsed();
    let status = response.status();

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .record(duration.as_secs_f64());

    info!(
        "Completed {} {} [{}] {} in {:.2}ms",
        method,
        path,
        request_id,
        status.as_u16(),
        duration.as_secs_f64() * 1000.0
    );

    response
}

// Middleware to capture HTTP errors to Sentry
async fn sentry_error_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    if response.status().is_server_error() {
        let status = response.status();
        error!("HTTP {} error on {} {}", status.as_u16(), method, uri);

        sentry::configure_scope(|scope| {
            scope.set_tag("http.method", method.as_str());
            scope.set_tag("http.url", uri.to_string());
            scope.set_tag("http.status_code", status.as_u16().to_string());
        });

        sentry::capture_message(
            &format!("HTTP {} error on {} {}", status.as_u16(), method, uri),
            sentry::Level::Error,
        );
    }

    response
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": crate::version() }))
}

async fn render_metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

async fn not_found() -> impl IntoResponse {
    actions::json_error(StatusCode::NOT_FOUND, "Not Found")
}

/// Build the full application router. `/metrics` is only mounted when a
/// Prometheus handle is given.
pub fn build_router(app_state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Create CORS layer that allows all origins and methods
    let cors_layer = CorsLayer::permissive();

    let api_router = Router::new()
        // Authentication routes
        .route("/auth/token/username", post(actions::token_by_username))
        .route("/auth/token/email", post(actions::token_by_email))
        .route("/auth/me", get(actions::get_current_user))
        // User management routes
        .route(
            "/users",
            get(actions::get_all_users).post(actions::register_user),
        )
        .route(
            "/users/{id}",
            get(actions::get_user_by_id).delete(actions::delete_user_by_id),
        )
        .route("/users/{id}/role", put(actions::set_user_role))
        .route("/roles", get(actions::get_roles))
        // Device routes
        .route("/devices", get(actions::get_all_devices))
        .route(
            "/devices/user/{user_id}",
            get(actions::get_devices_by_user).post(actions::create_device_for_user),
        )
        .route(
            "/devices/{id}",
            get(actions::get_device_by_id)
                .patch(actions::update_device_by_id)
                .delete(actions::delete_device_by_id),
        )
        .route("/devices/{id}/readings", get(actions::get_device_readings))
        // Reading routes
        .route(
            "/readings",
            get(actions::get_readings).post(actions::create_reading),
        )
        .with_state(app_state);

    let mut app = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router);

    if let Some(handle) = metrics_handle {
        app = app.route("/metrics", get(render_metrics).with_state(handle));
    }

    app.fallback(not_found)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(middleware::from_fn(sentry_error_middleware))
        .layer(cors_layer)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        // Never resolve, so the server keeps running
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, draining connections");
}

pub async fn start_web_server(
    interface: String,
    port: u16,
    app_state: AppState,
    metrics_handle: Option<PrometheusHandle>,
) -> Result<()> {
    sentry::configure_scope(|scope| {
        scope.set_tag("operation", "web-server");
    });
    info!("Starting web server on {}:{}", interface, port);

    let app = build_router(app_state, metrics_handle);

    // Create the listener
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", interface, port)).await?;
    info!("Web server listening on http://{}:{}", interface, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Web server stopped");
    Ok(())
}
