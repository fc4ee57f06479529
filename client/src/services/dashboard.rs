//! Defensive parsing of the dashboard read model.
//!
//! The backend response is untyped at this boundary, so it goes through an
//! explicit parse/validate step instead of being treated as already typed.
//! The result is all-or-nothing: a fully typed [`Dashboard`] that satisfies
//! the aggregate invariants, or a single `Validation` error whose message
//! names the failing contract ("Invalid dashboard payload").

use serde_json::Value;
use shared::{Dashboard, DashboardResponse};

use crate::services::errors::ApiError;

/// Parse an arbitrary response payload into a validated dashboard
pub fn parse_dashboard(payload: Value) -> Result<DashboardResponse, ApiError> {
    if !payload.is_object() {
        return Err(invalid(format!(
            "expected a JSON object, got {}",
            json_type_name(&payload)
        )));
    }

    let dashboard: Dashboard =
        serde_json::from_value(payload).map_err(|e| invalid(e.to_string()))?;

    check_consistency(&dashboard)?;

    Ok(DashboardResponse { dashboard })
}

fn invalid(detail: impl AsRef<str>) -> ApiError {
    ApiError::Validation(format!("Invalid dashboard payload: {}", detail.as_ref()))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Enforce the aggregate invariants a well-formed dashboard must satisfy
fn check_consistency(dashboard: &Dashboard) -> Result<(), ApiError> {
    let progress = &dashboard.progress;
    if progress.longest_streak < progress.current_streak {
        return Err(invalid(format!(
            "longestStreak {} is below currentStreak {}",
            progress.longest_streak, progress.current_streak
        )));
    }

    for (code, stats) in &dashboard.subject_stats {
        if !dashboard.subjects.iter().any(|s| s.code == *code) {
            return Err(invalid(format!(
                "subjectStats key {} is not in the subjects list",
                code
            )));
        }
        if stats.correct_streak > stats.completed {
            return Err(invalid(format!(
                "subject {}: correctStreak {} exceeds completed {}",
                code, stats.correct_streak, stats.completed
            )));
        }
        if stats.longest_streak < stats.correct_streak {
            return Err(invalid(format!(
                "subject {}: longestStreak {} is below correctStreak {}",
                code, stats.longest_streak, stats.correct_streak
            )));
        }
    }

    Ok(())
}
