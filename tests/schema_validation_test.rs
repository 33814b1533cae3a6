use serde_json::json;
use trip_planner_rs::{
    schema::validate_structured_payload, CompletionSchema, Itinerary, PlannerError,
};

#[test]
fn test_itinerary_schema_structure() {
    let schema = Itinerary::schema();
    let json = schema.schema_json();

    assert_eq!(json["type"], "object");
    assert_eq!(schema.schema_name(), "Itinerary");

    let mut required = schema.required_fields();
    required.sort_unstable();
    assert_eq!(required, vec!["days", "title"]);

    let properties = json["properties"].as_object().unwrap();
    assert!(properties.contains_key("total_cost"));
    assert_eq!(properties["days"]["type"], "array");
}

#[test]
fn test_nested_definitions_require_their_fields() {
    let json = Itinerary::schema().schema_json();
    let definitions = &json["definitions"];

    let day_required = definitions["DayPlan"]["required"].as_array().unwrap();
    for field in ["day", "city", "activities"] {
        assert!(day_required.contains(&json!(field)), "DayPlan.{field}");
    }

    let activity_required = definitions["Activity"]["required"].as_array().unwrap();
    assert!(activity_required.contains(&json!("time")));
    assert!(activity_required.contains(&json!("activity")));
    assert!(!activity_required.contains(&json!("place_name")));
    assert!(!activity_required.contains(&json!("cost")));
}

#[test]
fn test_valid_itinerary_passes() {
    let payload = json!({
        "title": "3-Day Trip to London",
        "total_cost": 450.0,
        "days": [
            { "day": 1, "city": "London", "activities": [
                { "time": "09:00", "activity": "British Museum", "place_name": "British Museum" }
            ]},
            { "day": 2, "city": "London", "activities": [] }
        ]
    });
    assert!(validate_structured_payload(Itinerary::schema(), &payload).is_ok());
}

#[test]
fn test_missing_nested_field_rejected() {
    let payload = json!({
        "title": "Trip",
        "days": [{ "day": 1, "city": "London", "activities": [{ "time": "09:00" }] }]
    });

    let err = validate_structured_payload(Itinerary::schema(), &payload).unwrap_err();
    assert!(matches!(err, PlannerError::SchemaViolation(_)));
    assert!(err.to_string().contains("activity"), "{err}");
}

#[test]
fn test_wrong_types_rejected() {
    let schema = Itinerary::schema();

    let numeric_title = json!({ "title": 7, "days": [] });
    assert!(validate_structured_payload(schema, &numeric_title).is_err());

    let zero_day = json!({
        "title": "Trip",
        "days": [{ "day": 0, "city": "X", "activities": [] }]
    });
    assert!(validate_structured_payload(schema, &zero_day).is_err());

    let negative_day = json!({
        "title": "Trip",
        "days": [{ "day": -1, "city": "X", "activities": [] }]
    });
    assert!(validate_structured_payload(schema, &negative_day).is_err());
}
