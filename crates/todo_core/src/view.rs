//! Derived, read-only view of the collection for a given filter.

use crate::error::AppError;
use crate::model::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::Date;
use time::macros::format_description;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    All,
    Completed,
    Pending,
}

impl FilterMode {
    pub const MODES: [FilterMode; 3] = [
        FilterMode::All,
        FilterMode::Completed,
        FilterMode::Pending,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
        }
    }

    pub fn empty_label(self) -> &'static str {
        match self {
            Self::All => "No tasks yet",
            Self::Completed => "No completed tasks",
            Self::Pending => "No pending tasks",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        Self::MODES
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                AppError::invalid_input(format!(
                    "filter must be one of all, completed, pending (got '{value}')"
                ))
            })
    }
}

/// Tasks to display for one filter, ordered by due date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection<'a> {
    pub filter: FilterMode,
    pub tasks: Vec<&'a Task>,
    pub empty_label: Option<&'static str>,
}

/// A task annotated for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub text: String,
    pub date: String,
    pub due: String,
    pub completed: bool,
}

/// Filters `tasks` by `filter` and sorts ascending by date. The sort is
/// stable, so tasks due on the same day keep their collection order.
pub fn project(tasks: &[Task], filter: FilterMode) -> Projection<'_> {
    let mut visible: Vec<&Task> = tasks.iter().filter(|task| filter.matches(task)).collect();
    visible.sort_by_key(|task| task.date);

    let empty_label = visible.is_empty().then_some(filter.empty_label());
    Projection {
        filter,
        tasks: visible,
        empty_label,
    }
}

impl Projection<'_> {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn views(&self) -> Result<Vec<TaskView>, AppError> {
        self.tasks.iter().map(|task| task_view(task)).collect()
    }
}

pub fn task_view(task: &Task) -> Result<TaskView, AppError> {
    let date = task
        .date
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| AppError::invalid_data(err.to_string()))?;

    Ok(TaskView {
        id: task.id,
        text: task.text.clone(),
        date,
        due: format_due_date(task.date)?,
        completed: task.completed,
    })
}

/// Formats a due date as e.g. `Jan 5, 2025`.
pub fn format_due_date(date: Date) -> Result<String, AppError> {
    date.format(format_description!(
        "[month repr:short] [day padding:none], [year]"
    ))
    .map_err(|err| AppError::invalid_data(err.to_string()))
}
