use std::{net::SocketAddr, sync::Arc, time::Duration};

use tracing::info;

use crate::{
    api::handlers::{router, AppState},
    core::TripPlanner,
    error::{PlannerError, Result},
};

/// Preload the example cache, then serve until the process is stopped.
///
/// `plan_timeout` must be the deadline the planner was built with.
pub async fn serve(
    planner: Arc<TripPlanner>,
    addr: SocketAddr,
    plan_timeout: Duration,
) -> Result<()> {
    info!("Preloading few-shot examples...");
    planner.examples().preload().await;

    let app = router(AppState { planner }, plan_timeout);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| PlannerError::Config(format!("cannot bind {addr}: {err}")))?;
    info!("Trip planner listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|err| PlannerError::Config(format!("server error: {err}")))
}
