//! Control endpoint handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use jayhawk_broker::WorkerIdentity;
use jayhawk_execution::{ChildCommand, ChildInfo, ChildStatus, RuntimeState, StopOutcome};
use jayhawk_metrics::LaborHoursQuery;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::context::ControlContext;
use crate::errors::{WebError, WebResult};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub worker: WorkerIdentity,
    pub state: RuntimeState,
    pub stop_requested: bool,
    pub child: ChildStatus,
}

#[derive(Debug, Serialize)]
pub struct ComputationStarted {
    pub child: ChildInfo,
    pub query: LaborHoursQuery,
}

/// Liveness probe
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn get_status(State(ctx): State<ControlContext>) -> Json<StatusResponse> {
    Json(StatusResponse {
        worker: ctx.identity.clone(),
        state: ctx.state.current(),
        stop_requested: ctx.stop.is_triggered(),
        child: ctx.supervisor.status().await,
    })
}

/// Ask the worker to shut down. The endpoint stops accepting work and the
/// runtime tears down once the server has returned.
pub async fn request_stop(State(ctx): State<ControlContext>) -> impl IntoResponse {
    info!(worker_id = %ctx.identity.id, "Stop requested over control endpoint");
    ctx.stop.trigger();

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "stopping",
            "worker": ctx.identity.id,
        })),
    )
}

/// Launch the computation child for a labor-hours query.
///
/// Fire and forget: the rows the child prints go to the worker's stdout and
/// are not returned here or through `/status`, which only reports the exit.
pub async fn start_computation(
    State(ctx): State<ControlContext>,
    payload: Result<Json<LaborHoursQuery>, JsonRejection>,
) -> WebResult<impl IntoResponse> {
    let Json(query) = payload.map_err(|rejection| WebError::bad_request(rejection.body_text()))?;

    if ctx.stop.is_triggered() {
        return Err(WebError::ServiceUnavailable {
            message: "worker is stopping".to_string(),
        });
    }

    // Reject inverted ranges before anything is spawned
    if let (Some(begin), Some(end)) = (query.begin_date, query.end_date) {
        if begin > end {
            return Err(WebError::bad_request(format!(
                "begin_date {} is after end_date {}",
                begin, end
            )));
        }
    }

    let command = ChildCommand::from_config(&ctx.computation)?.args(query.to_args());
    let child = ctx.supervisor.start(&command).await?;

    info!(
        pid = child.pid,
        repo_group_id = query.repo_group_id,
        repo_id = ?query.repo_id,
        "Computation started"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ComputationStarted { child, query }),
    ))
}

pub async fn stop_computation(State(ctx): State<ControlContext>) -> WebResult<Json<StopOutcome>> {
    let outcome = ctx.supervisor.stop(ctx.stop_timeout).await?;
    Ok(Json(outcome))
}

pub async fn not_found(uri: axum::http::Uri) -> WebError {
    WebError::NotFound {
        message: format!("no route for {}", uri.path()),
    }
}
