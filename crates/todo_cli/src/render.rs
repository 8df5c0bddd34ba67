use crate::config::Palette;
use serde_json::{Value, json};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use todo_core::error::AppError;
use todo_core::model::{Task, TaskId};
use todo_core::view::{FilterMode, Projection, task_view};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: TaskId,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Task")]
    text: String,
}

/// Makes untrusted task text safe to write to a terminal: control
/// characters (escape sequences, newlines, tabs) are shown as escapes.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_control() {
            escaped.extend(ch.escape_default());
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

/// One line naming every filter, with the active one bracketed.
pub fn filter_bar(active: FilterMode, palette: &Palette) -> String {
    let labels: Vec<String> = FilterMode::MODES
        .into_iter()
        .map(|mode| {
            if mode == active {
                palette.accentize(&format!("[{mode}]"))
            } else {
                mode.to_string()
            }
        })
        .collect();
    format!("Filter: {}", labels.join(" "))
}

pub fn render_list(projection: &Projection<'_>, palette: &Palette) -> Result<String, AppError> {
    let mut output = filter_bar(projection.filter, palette);
    output.push('\n');

    if let Some(label) = projection.empty_label {
        output.push_str(&palette.mutedize(label));
        return Ok(output);
    }

    let rows = projection
        .views()?
        .into_iter()
        .map(|view| TaskRow {
            id: view.id,
            done: if view.completed { "[x]" } else { "[ ]" },
            due: view.due,
            text: escape_text(&view.text),
        })
        .collect::<Vec<_>>();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    output.push_str(&table.to_string());
    Ok(output)
}

pub fn list_json(projection: &Projection<'_>) -> Result<Value, AppError> {
    Ok(json!({
        "filter": projection.filter,
        "empty_label": projection.empty_label,
        "tasks": projection.views()?,
    }))
}

pub fn task_json(task: &Task) -> Result<Value, AppError> {
    serde_json::to_value(task_view(task)?).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn missing_json(id: TaskId) -> Value {
    json!({ "id": id, "found": false })
}
