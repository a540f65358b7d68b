pub mod health_checks;
pub mod json_error;
pub mod schedule;
pub mod validated_json;
