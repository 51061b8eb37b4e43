//! Router assembly

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use jayhawk_config::EndpointConfig;
use tower_http::trace::TraceLayer;

use crate::{context::ControlContext, handlers, middleware::request_id_middleware};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub enable_request_id: bool,
    pub enable_tracing: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enable_request_id: true,
            enable_tracing: true,
        }
    }
}

impl From<&EndpointConfig> for AppConfig {
    fn from(config: &EndpointConfig) -> Self {
        Self {
            enable_request_id: config.enable_request_id,
            enable_tracing: config.enable_tracing,
        }
    }
}

/// Build the control router
pub fn create_control_app(context: ControlContext, config: AppConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::get_status))
        .route("/stop", post(handlers::request_stop))
        .route(
            "/computation",
            post(handlers::start_computation).delete(handlers::stop_computation),
        )
        .fallback(handlers::not_found)
        .with_state(context);

    // Layers wrap in reverse order: request ids are assigned outside the trace span
    if config.enable_tracing {
        app = app.layer(TraceLayer::new_for_http());
    }

    if config.enable_request_id {
        app = app.layer(middleware::from_fn(request_id_middleware));
    }

    app
}
