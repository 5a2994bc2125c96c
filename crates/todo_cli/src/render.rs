use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::Date;
use todo_core::EditSessions;
use todo_core::config::Palette;
use todo_core::date_status::todo_date_status;
use todo_core::model::dates::{format_date, format_optional_date};
use todo_core::model::{Todo, TodoId};

#[derive(Debug, Tabled)]
pub struct TodoRow {
    #[tabled(rename = "ID")]
    pub id: TodoId,
    #[tabled(rename = "Done")]
    pub done: &'static str,
    #[tabled(rename = "Text")]
    pub text: String,
    #[tabled(rename = "Start")]
    pub start: String,
    #[tabled(rename = "End")]
    pub end: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

/// One row per todo in display order. Rows being edited show their draft.
pub fn todo_rows(
    todos: &[Todo],
    sessions: &EditSessions,
    today: Date,
    palette: &Palette,
) -> Vec<TodoRow> {
    todos
        .iter()
        .map(|todo| {
            let shown = sessions.displayed(todo);
            let text = if sessions.is_editing(todo.id) {
                format!("{} [editing]", shown.text)
            } else {
                shown.text
            };
            TodoRow {
                id: todo.id,
                done: if shown.completed { "x" } else { "" },
                text,
                start: shown.start_date,
                end: shown.end_date,
                status: palette.paint_status(&todo_date_status(todo, today)),
            }
        })
        .collect()
}

pub fn render_table(rows: Vec<TodoRow>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

pub fn todo_json(todo: &Todo, today: Date) -> serde_json::Value {
    let status = todo_date_status(todo, today);
    serde_json::json!({
        "id": todo.id,
        "text": todo.text,
        "completed": todo.completed,
        "startDate": todo.start_date.map(format_date),
        "endDate": todo.end_date.map(format_date),
        "status": status.class(),
        "statusText": status.message(),
    })
}

pub fn todos_json(todos: &[Todo], today: Date) -> serde_json::Value {
    serde_json::Value::Array(todos.iter().map(|todo| todo_json(todo, today)).collect())
}

pub fn todo_details(todo: &Todo, sessions: &EditSessions, today: Date) -> String {
    let status = todo_date_status(todo, today);
    let mut lines = vec![
        format!("id: {}", todo.id),
        format!("text: {}", todo.text),
        format!("completed: {}", if todo.completed { "yes" } else { "no" }),
        format!("start: {}", or_dash(&format_optional_date(todo.start_date))),
        format!("end: {}", or_dash(&format_optional_date(todo.end_date))),
        format!("status: {}", or_dash(&status.message())),
    ];

    if let Some(draft) = sessions.draft(todo.id) {
        lines.push(format!(
            "editing: text={:?} start={:?} end={:?}",
            draft.text, draft.start_date, draft.end_date
        ));
    }

    lines.join("\n")
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
