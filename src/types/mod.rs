pub mod document;
pub mod itinerary;
pub mod response;

pub use document::{Category, RetrievedDocument};
pub use itinerary::{Activity, DayPlan, Itinerary};
pub use response::deserialize_structured_response;
