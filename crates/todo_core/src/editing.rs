//! Per-row edit sessions.
//!
//! Each rendered todo is either viewed or edited. Editing works on a draft of
//! the raw field values; the committed todo only changes when a valid draft is
//! saved through [`TodoList::update`]. Sessions are keyed by todo id and are
//! dropped whenever the set or order of rows changes (see [`EditSessions::sync`])
//! and after every reload (see [`EditSessions::reset`]).

use crate::error::AppError;
use crate::model::dates::{format_optional_date, parse_date};
use crate::model::{Todo, TodoId};
use crate::storage::TodoStore;
use crate::todo_list::{TodoList, validate_fields};
use std::collections::HashMap;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Viewing,
    Editing,
}

/// Working copy of a row's editable fields, as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub text: String,
    pub start_date: String,
    pub end_date: String,
    pub completed: bool,
}

impl EditDraft {
    fn from_todo(todo: &Todo) -> Self {
        Self {
            text: todo.text.clone(),
            start_date: format_optional_date(todo.start_date),
            end_date: format_optional_date(todo.end_date),
            completed: todo.completed,
        }
    }
}

/// What a row shows: the draft while editing, the committed todo otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedFields {
    pub text: String,
    pub start_date: String,
    pub end_date: String,
    pub completed: bool,
}

impl From<EditDraft> for DisplayedFields {
    fn from(draft: EditDraft) -> Self {
        Self {
            text: draft.text,
            start_date: draft.start_date,
            end_date: draft.end_date,
            completed: draft.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Saved(Todo),
    /// The draft failed validation; the row is still being edited.
    Rejected(AppError),
    NotEditing,
}

#[derive(Debug, Default)]
pub struct EditSessions {
    drafts: HashMap<TodoId, EditDraft>,
    row_ids: Vec<TodoId>,
}

impl EditSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the rendered rows. When the id sequence differs from the last one
    /// seen, every row goes back to viewing. Returns whether a reset happened.
    pub fn sync(&mut self, todos: &[Todo]) -> bool {
        let same_rows = self.row_ids.len() == todos.len()
            && self
                .row_ids
                .iter()
                .zip(todos)
                .all(|(id, todo)| *id == todo.id);
        if same_rows {
            return false;
        }

        self.row_ids = todos.iter().map(|todo| todo.id).collect();
        let had_drafts = !self.drafts.is_empty();
        self.drafts.clear();
        if had_drafts {
            tracing::debug!(rows = self.row_ids.len(), "rows changed, edit sessions reset");
        }
        true
    }

    /// Drop every draft and start tracking `todos`. Use after
    /// [`TodoList::load`], which can change field values without changing ids.
    pub fn reset(&mut self, todos: &[Todo]) {
        self.row_ids = todos.iter().map(|todo| todo.id).collect();
        if !self.drafts.is_empty() {
            self.drafts.clear();
            tracing::debug!(rows = self.row_ids.len(), "rows reloaded, edit sessions reset");
        }
    }

    pub fn state(&self, id: TodoId) -> RowState {
        if self.drafts.contains_key(&id) {
            RowState::Editing
        } else {
            RowState::Viewing
        }
    }

    pub fn is_editing(&self, id: TodoId) -> bool {
        self.state(id) == RowState::Editing
    }

    pub fn draft(&self, id: TodoId) -> Option<&EditDraft> {
        self.drafts.get(&id)
    }

    pub fn editing_ids(&self) -> Vec<TodoId> {
        let mut ids: Vec<TodoId> = self.drafts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Begin editing `todo`. A row already being edited keeps its draft.
    pub fn start_edit(&mut self, todo: &Todo) {
        self.drafts
            .entry(todo.id)
            .or_insert_with(|| EditDraft::from_todo(todo));
    }

    /// Discard the draft. Returns whether the row was being edited.
    pub fn cancel_edit(&mut self, id: TodoId) -> bool {
        self.drafts.remove(&id).is_some()
    }

    pub fn set_text(&mut self, id: TodoId, value: &str) -> bool {
        self.with_draft(id, |draft| draft.text = value.to_string())
    }

    pub fn set_start_date(&mut self, id: TodoId, value: &str) -> bool {
        self.with_draft(id, |draft| draft.start_date = value.to_string())
    }

    pub fn set_end_date(&mut self, id: TodoId, value: &str) -> bool {
        self.with_draft(id, |draft| draft.end_date = value.to_string())
    }

    /// Commit the draft for `id` if it is valid.
    ///
    /// An invalid draft is reported as [`EditOutcome::Rejected`] and the row
    /// stays in the editing state with the draft intact.
    pub fn save_edit<S: TodoStore>(&mut self, id: TodoId, list: &mut TodoList<S>) -> EditOutcome {
        let Some(draft) = self.drafts.get(&id) else {
            return EditOutcome::NotEditing;
        };

        let candidate = match todo_from_draft(id, draft) {
            Ok(todo) => todo,
            Err(err) => {
                tracing::debug!(id, error = %err, "edit rejected");
                return EditOutcome::Rejected(err);
            }
        };

        if let Err(err) = list.update(candidate.clone()) {
            return EditOutcome::Rejected(err);
        }

        self.drafts.remove(&id);
        EditOutcome::Saved(candidate)
    }

    /// Toggle completion without leaving the current state. While editing, the
    /// draft mirrors the new value.
    pub fn toggle_completion<S: TodoStore>(
        &mut self,
        id: TodoId,
        list: &mut TodoList<S>,
    ) -> Option<bool> {
        let completed = list.toggle_completion(id);
        if let (Some(completed), Some(draft)) = (completed, self.drafts.get_mut(&id)) {
            draft.completed = completed;
        }
        completed
    }

    pub fn displayed(&self, todo: &Todo) -> DisplayedFields {
        match self.drafts.get(&todo.id) {
            Some(draft) => draft.clone().into(),
            None => EditDraft::from_todo(todo).into(),
        }
    }

    fn with_draft(&mut self, id: TodoId, apply: impl FnOnce(&mut EditDraft)) -> bool {
        match self.drafts.get_mut(&id) {
            Some(draft) => {
                apply(draft);
                true
            }
            None => false,
        }
    }
}

fn todo_from_draft(id: TodoId, draft: &EditDraft) -> Result<Todo, AppError> {
    let start_date = parse_draft_date(&draft.start_date, "start date")?;
    let end_date = parse_draft_date(&draft.end_date, "end date")?;
    let text = validate_fields(&draft.text, start_date, end_date)?;

    Ok(Todo {
        id,
        text,
        completed: draft.completed,
        start_date,
        end_date,
    })
}

fn parse_draft_date(raw: &str, field: &str) -> Result<Option<Date>, AppError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }

    parse_date(raw)
        .map(Some)
        .ok_or_else(|| AppError::invalid_input(format!("{field} must be YYYY-MM-DD")))
}
