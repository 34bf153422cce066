//! REST surface over the engine
//!
//! JSON in and out, camelCase bodies matching the wire types. The router
//! is plain axum with the engine handle as state; serving it is the
//! [`TicketingServer`](crate::server::TicketingServer)'s job.
//!
//! Routes:
//!
//! ```text
//! GET    /health
//! POST   /api/tickets                      create a ticket
//! GET    /api/tickets?branchId=&status=..  list tickets
//! GET    /api/tickets/:id                  fetch by id
//! GET    /api/tickets/:id/position         queue position
//! DELETE /api/tickets/:id                  delete
//! GET    /api/tickets/number/:number       fetch by printed number
//! POST   /api/tickets/:id/recall           re-announce
//! POST   /api/tickets/:id/serve            start serving
//! POST   /api/tickets/:id/complete         complete
//! POST   /api/tickets/:id/no-show          mark absent
//! POST   /api/tickets/:id/cancel           cancel
//! POST   /api/tickets/:id/transfer         move to another service
//! POST   /api/queues/call-next             call the next waiting ticket
//! GET    /api/board?branchId=              currently-serving board
//! GET    /api/stats?branchId=&date=        daily statistics
//! GET    /api/stats/peak-hours?branchId=   hourly histogram
//! GET    /api/staff/:id/performance        staff day numbers
//! GET    /api/export?branchId=&from=&to=   CSV export
//! GET    /api/events?limit=                recent ticket events
//! ```

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::error::TicketingError;
use crate::orchestrator::TicketingEngine;
use crate::types::{CreateTicketRequest, TicketFilter};

/// Error envelope for HTTP responses
///
/// Maps the engine taxonomy to status codes: not-found 404, validation
/// 400, lifecycle violations and lost races 409, everything else 500.
pub struct ApiError(TicketingError);

impl From<TicketingError> for ApiError {
    fn from(err: TicketingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            TicketingError::NotFound(_) => (StatusCode::NOT_FOUND, "not-found"),
            TicketingError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            TicketingError::InvalidTransition(_) => (StatusCode::CONFLICT, "invalid-transition"),
            TicketingError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            TicketingError::Database(_)
            | TicketingError::Configuration(_)
            | TicketingError::Internal(_) => {
                error!("💥 Request failed: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        let body = Json(json!({
            "error": kind,
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the REST router over an engine handle
pub fn router(engine: Arc<TicketingEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tickets", post(create_ticket).get(list_tickets))
        .route("/api/tickets/:id", get(get_ticket).delete(delete_ticket))
        .route("/api/tickets/:id/position", get(ticket_position))
        .route("/api/tickets/number/:number", get(get_ticket_by_number))
        .route("/api/tickets/:id/recall", post(recall_ticket))
        .route("/api/tickets/:id/serve", post(start_serving))
        .route("/api/tickets/:id/complete", post(complete_ticket))
        .route("/api/tickets/:id/no-show", post(no_show_ticket))
        .route("/api/tickets/:id/cancel", post(cancel_ticket))
        .route("/api/tickets/:id/transfer", post(transfer_ticket))
        .route("/api/queues/call-next", post(call_next))
        .route("/api/board", get(board))
        .route("/api/stats", get(statistics))
        .route("/api/stats/peak-hours", get(peak_hours))
        .route("/api/staff/:id/performance", get(staff_performance))
        .route("/api/export", get(export_csv))
        .route("/api/events", get(recent_events))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn create_ticket(
    State(engine): State<Arc<TicketingEngine>>,
    Json(request): Json<CreateTicketRequest>,
) -> ApiResult<impl IntoResponse> {
    let ticket = engine.create_ticket(request).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn list_tickets(
    State(engine): State<Arc<TicketingEngine>>,
    Query(filter): Query<TicketFilter>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.list_tickets(&filter).await?))
}

async fn get_ticket(
    State(engine): State<Arc<TicketingEngine>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.get_ticket(&id).await?))
}

async fn get_ticket_by_number(
    State(engine): State<Arc<TicketingEngine>>,
    Path(number): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.get_ticket_by_number(&number).await?))
}

async fn delete_ticket(
    State(engine): State<Arc<TicketingEngine>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if engine.delete_ticket(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(TicketingError::not_found(format!("Ticket '{}' not found", id)).into())
    }
}

async fn ticket_position(
    State(engine): State<Arc<TicketingEngine>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    // null body for tickets past `waiting`
    Ok(Json(engine.ticket_position(&id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecallRequest {
    staff_id: Option<String>,
}

async fn recall_ticket(
    State(engine): State<Arc<TicketingEngine>>,
    Path(id): Path<String>,
    Json(request): Json<RecallRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.recall_ticket(&id, request.staff_id).await?))
}

async fn start_serving(
    State(engine): State<Arc<TicketingEngine>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.start_serving(&id).await?))
}

async fn complete_ticket(
    State(engine): State<Arc<TicketingEngine>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.complete_ticket(&id).await?))
}

async fn no_show_ticket(
    State(engine): State<Arc<TicketingEngine>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.no_show_ticket(&id).await?))
}

async fn cancel_ticket(
    State(engine): State<Arc<TicketingEngine>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.cancel_ticket(&id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferRequest {
    service_id: String,
}

async fn transfer_ticket(
    State(engine): State<Arc<TicketingEngine>>,
    Path(id): Path<String>,
    Json(request): Json<TransferRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.transfer_ticket(&id, &request.service_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallNextRequest {
    branch_id: String,
    service_id: String,
    staff_id: String,
}

async fn call_next(
    State(engine): State<Arc<TicketingEngine>>,
    Json(request): Json<CallNextRequest>,
) -> ApiResult<impl IntoResponse> {
    // null body when the queue is empty
    let called = engine
        .call_next(&request.branch_id, &request.service_id, &request.staff_id)
        .await?;
    Ok(Json(called))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardQuery {
    branch_id: Option<String>,
}

async fn board(
    State(engine): State<Arc<TicketingEngine>>,
    Query(query): Query<BoardQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        engine.currently_serving(query.branch_id.as_deref()).await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsQuery {
    branch_id: Option<String>,
    date: Option<NaiveDate>,
}

async fn statistics(
    State(engine): State<Arc<TicketingEngine>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        engine
            .statistics(query.branch_id.as_deref(), query.date)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeakHoursQuery {
    branch_id: String,
    date: Option<NaiveDate>,
}

async fn peak_hours(
    State(engine): State<Arc<TicketingEngine>>,
    Query(query): Query<PeakHoursQuery>,
) -> ApiResult<impl IntoResponse> {
    let buckets = engine.peak_hours(&query.branch_id, query.date).await?;
    Ok(Json(buckets.to_vec()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerformanceQuery {
    date: Option<NaiveDate>,
}

async fn staff_performance(
    State(engine): State<Arc<TicketingEngine>>,
    Path(id): Path<String>,
    Query(query): Query<PerformanceQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.staff_performance(&id, query.date).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportQuery {
    branch_id: Option<String>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

async fn export_csv(
    State(engine): State<Arc<TicketingEngine>>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let csv = engine
        .export_tickets_csv(query.branch_id.as_deref(), query.from, query.to)
        .await?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], csv))
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
}

async fn recent_events(
    State(engine): State<Arc<TicketingEngine>>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        engine.events().recent(query.limit.unwrap_or(100)).await,
    ))
}
