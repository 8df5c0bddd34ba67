use crate::error::AppError;
use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;

pub type TaskId = i64;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// A single dated to-do entry as it is held in memory and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(default)]
    pub completed: bool,
}

/// Parses a due date in `YYYY-MM-DD` form. A missing or blank value is
/// rejected the same way as a malformed one.
pub fn parse_due_date(raw: Option<&str>) -> Result<Date, AppError> {
    let value = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AppError::invalid_input("date is required")),
    };

    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::invalid_input("date must be YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::{Task, parse_due_date};
    use time::macros::date;

    #[test]
    fn parse_due_date_accepts_iso_dates() {
        assert_eq!(parse_due_date(Some("2025-01-05")).unwrap(), date!(2025 - 01 - 05));
        assert_eq!(parse_due_date(Some(" 2024-02-29 ")).unwrap(), date!(2024 - 02 - 29));
    }

    #[test]
    fn parse_due_date_rejects_missing_and_malformed() {
        assert_eq!(parse_due_date(None).unwrap_err().code(), "invalid_input");
        assert_eq!(parse_due_date(Some("  ")).unwrap_err().code(), "invalid_input");
        assert_eq!(parse_due_date(Some("2025-13-01")).unwrap_err().code(), "invalid_input");
        assert_eq!(parse_due_date(Some("01/05/2025")).unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn task_serializes_with_iso_date() {
        let task = Task {
            id: 1736467200000,
            text: "Buy milk".to_string(),
            date: date!(2025 - 01 - 10),
            completed: false,
        };

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 1736467200000_i64,
                "text": "Buy milk",
                "date": "2025-01-10",
                "completed": false
            })
        );
    }

    #[test]
    fn task_without_completed_flag_defaults_to_pending() {
        let task: Task =
            serde_json::from_str(r#"{"id": 7, "text": "demo", "date": "2025-03-01"}"#).unwrap();
        assert!(!task.completed);
    }
}
