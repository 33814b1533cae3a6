use std::{sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{core::TripPlanner, error::PlannerError, types::Itinerary};

#[derive(Clone, Debug)]
pub struct AppState {
    pub planner: Arc<TripPlanner>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTripRequest {
    pub query: String,
}

/// Maps planner failures onto a status code and the structured error body.
#[derive(Debug)]
pub struct ApiError(PlannerError);

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            PlannerError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            PlannerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.0.to_error_payload())).into_response()
    }
}

/// Time the transport timeout allows beyond the planner's own deadline.
pub const TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Routes with tracing, permissive CORS and a whole-request timeout.
///
/// `plan_timeout` is the planner's deadline; the layer fires only after
/// `plan_timeout + TIMEOUT_MARGIN`.
pub fn router(state: AppState, plan_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/plan_trip", post(plan_trip))
        .with_state(state)
        .layer(TimeoutLayer::new(plan_timeout + TIMEOUT_MARGIN))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the AI Trip Planner Agent. Use POST /plan_trip to generate an itinerary."
    }))
}

async fn plan_trip(
    State(state): State<AppState>,
    Json(req): Json<PlanTripRequest>,
) -> Result<Json<Itinerary>, ApiError> {
    info!("POST /plan_trip: {}", req.query);

    match state.planner.plan(&req.query).await {
        Ok(itinerary) => Ok(Json(itinerary)),
        Err(err) => {
            error!(code = err.error_code(), "error planning trip: {}", err);
            Err(err.into())
        }
    }
}
