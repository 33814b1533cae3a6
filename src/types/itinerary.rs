use crate::{
    completion_schema,
    error::{PlannerError, Result},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// A single scheduled item within a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Activity {
    /// Time of the activity (e.g., '09:00', '14:30', 'Morning').
    pub time: String,
    /// Description of the activity.
    pub activity: String,
    /// Name of the place (restaurant, hotel, attraction) if applicable.
    #[serde(default)]
    pub place_name: Option<String>,
    /// Estimated cost if available.
    #[serde(default)]
    pub cost: Option<f64>,
}

/// One day of the trip, with activities in the order the model produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DayPlan {
    /// Day number of the trip.
    #[schemars(range(min = 1))]
    pub day: u32,
    /// City for this day.
    pub city: String,
    /// List of activities for the day.
    pub activities: Vec<Activity>,
}

/// Structured trip itinerary returned by the planner.
#[completion_schema]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Itinerary {
    /// Title of the trip (e.g. '3-Day Trip to London').
    pub title: String,
    /// Total estimated cost.
    #[serde(default)]
    pub total_cost: Option<f64>,
    /// Daily itinerary.
    pub days: Vec<DayPlan>,
}

impl Itinerary {
    /// Reject itineraries whose day numbering is empty, zero-based, repeated
    /// or out of order.
    pub fn validate_days(&self) -> Result<()> {
        if self.days.is_empty() {
            return Err(PlannerError::SchemaViolation(
                "itinerary contains no days".to_string(),
            ));
        }

        let mut previous = 0;
        for (idx, plan) in self.days.iter().enumerate() {
            if plan.day <= previous {
                return Err(PlannerError::SchemaViolation(format!(
                    "days[{idx}].day is {} but must be greater than {previous}",
                    plan.day
                )));
            }
            previous = plan.day;
        }

        Ok(())
    }

    /// Every `place_name` mentioned across all days, in itinerary order.
    pub fn place_names(&self) -> Vec<&str> {
        self.days
            .iter()
            .flat_map(|day| day.activities.iter())
            .filter_map(|activity| activity.place_name.as_deref())
            .collect()
    }

    pub fn to_markdown(&self) -> String {
        let mut md = format!("# {}\n", self.title);

        if let Some(total) = self.total_cost.filter(|total| *total != 0.0) {
            let _ = write!(md, "**Total Estimated Cost:** ${}\n\n", format_amount(total));
        }

        for day in &self.days {
            let _ = writeln!(md, "## Day {} - {}", day.day, day.city);
            for act in &day.activities {
                let _ = write!(md, "- **{}**: {}", act.time, act.activity);
                if let Some(place) = &act.place_name {
                    let _ = write!(md, " (@ {place})");
                }
                md.push('\n');
            }
            md.push('\n');
        }

        md
    }
}

// Debug formatting keeps the fractional part: 450.0 rather than 450.
fn format_amount(value: f64) -> String {
    format!("{value:?}")
}
