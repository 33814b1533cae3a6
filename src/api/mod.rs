//! HTTP serving boundary.

pub mod handlers;
pub mod server;

pub use handlers::{router, AppState, PlanTripRequest};
pub use server::serve;
