//! The authoritative in-memory todo sequence.
//!
//! Every mutation that passes validation saves the whole sequence through the
//! store exactly once. Save failures are logged and remembered but never undo
//! the in-memory change: the running session is the source of truth.

use crate::error::AppError;
use crate::model::{Todo, TodoId};
use crate::storage::TodoStore;
use time::{Date, OffsetDateTime};
use tracing::Dispatch;

pub struct TodoList<S> {
    todos: Vec<Todo>,
    store: S,
    dispatch: Dispatch,
    last_id: TodoId,
    last_storage_error: Option<AppError>,
}

impl<S: TodoStore> TodoList<S> {
    /// Empty list backed by `store`; call [`TodoList::load`] to read the slot.
    /// Events go to the dispatcher current at construction time.
    pub fn new(store: S) -> Self {
        Self {
            todos: Vec::new(),
            store,
            dispatch: tracing::dispatcher::get_default(|dispatch| dispatch.clone()),
            last_id: 0,
            last_storage_error: None,
        }
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn load(&mut self) {
        let todos = match self.store.load() {
            Ok(todos) => {
                self.last_storage_error = None;
                todos
            }
            Err(err) => {
                tracing::dispatcher::with_default(&self.dispatch, || {
                    tracing::warn!(error = %err, "failed to load todos, starting empty");
                });
                self.last_storage_error = Some(err);
                Vec::new()
            }
        };

        self.last_id = todos.iter().map(|todo| todo.id).max().unwrap_or(0);
        self.todos = todos;
        tracing::dispatcher::with_default(&self.dispatch, || {
            tracing::debug!(count = self.todos.len(), "loaded todos");
        });
    }

    pub fn add(
        &mut self,
        text: &str,
        start_date: Option<Date>,
        end_date: Option<Date>,
    ) -> Result<Todo, AppError> {
        let text = validate_fields(text, start_date, end_date)?;

        let todo = Todo {
            id: self.next_id()?,
            text,
            completed: false,
            start_date,
            end_date,
        };
        self.todos.push(todo.clone());
        self.persist();

        Ok(todo)
    }

    /// Flip `completed`. An unknown id leaves the sequence alone; the save
    /// still runs. Returns the new state when the todo exists.
    pub fn toggle_completion(&mut self, id: TodoId) -> Option<bool> {
        let toggled = self.todos.iter_mut().find(|todo| todo.id == id).map(|todo| {
            todo.completed = !todo.completed;
            todo.completed
        });
        self.persist();
        toggled
    }

    /// Replace the todo with the same id in place. An unknown id is a no-op.
    pub fn update(&mut self, todo: Todo) -> Result<(), AppError> {
        let text = validate_fields(&todo.text, todo.start_date, todo.end_date)?;

        if let Some(existing) = self.todos.iter_mut().find(|existing| existing.id == todo.id) {
            *existing = Todo { text, ..todo };
        }
        self.persist();

        Ok(())
    }

    pub fn delete(&mut self, id: TodoId) -> Option<Todo> {
        let index = self.todos.iter().position(|todo| todo.id == id);
        let removed = index.map(|index| self.todos.remove(index));
        self.persist();
        removed
    }

    pub fn clear_all(&mut self) {
        self.todos.clear();
        self.persist();
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// The error from the most recent store call, cleared by the next success.
    pub fn last_storage_error(&self) -> Option<&AppError> {
        self.last_storage_error.as_ref()
    }

    /// Millisecond timestamp, bumped past the highest id seen. Once that
    /// overflows, the lowest positive id not in use.
    fn next_id(&mut self) -> Result<TodoId, AppError> {
        let now_ms = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as TodoId;
        if let Some(next) = self.last_id.checked_add(1) {
            let id = now_ms.max(next);
            self.last_id = id;
            return Ok(id);
        }

        (1..TodoId::MAX)
            .find(|candidate| self.todos.iter().all(|todo| todo.id != *candidate))
            .ok_or_else(|| AppError::invalid_data("no todo ids left"))
    }

    fn persist(&mut self) {
        match self.store.save(&self.todos) {
            Ok(()) => self.last_storage_error = None,
            Err(err) => {
                tracing::dispatcher::with_default(&self.dispatch, || {
                    tracing::warn!(error = %err, count = self.todos.len(), "failed to save todos");
                });
                self.last_storage_error = Some(err);
            }
        }
    }
}

/// Input acceptance rule shared by add, update and edit saves. Returns the
/// trimmed text.
pub fn validate_fields(
    text: &str,
    start_date: Option<Date>,
    end_date: Option<Date>,
) -> Result<String, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("text is required"));
    }

    if let (Some(start), Some(end)) = (start_date, end_date)
        && start > end
    {
        return Err(AppError::invalid_input(
            "start date must not be after end date",
        ));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{TodoList, validate_fields};
    use crate::model::Todo;
    use crate::storage::{JsonFileStore, MemoryStore, TodoStore};
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use time::{Date, Month};
    use tracing::Dispatch;

    fn june(day: u8) -> Date {
        Date::from_calendar_date(2024, Month::June, day).unwrap()
    }

    fn list_with(todos: Vec<Todo>) -> (TodoList<MemoryStore>, MemoryStore) {
        let store = MemoryStore::with_todos(todos);
        let mut list = TodoList::new(store.clone());
        list.load();
        (list, store)
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn add_appends_incomplete_todo_and_persists() {
        let (mut list, store) = list_with(Vec::new());

        let todo = list.add("  buy milk  ", None, None).unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(todo.text, "buy milk");
        assert!(!todo.completed);
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.stored().unwrap(), vec![todo]);
    }

    #[test]
    fn add_rejects_blank_text_without_saving() {
        let (mut list, store) = list_with(Vec::new());

        let empty = list.add("", None, None).unwrap_err();
        let blank = list.add("   ", None, None).unwrap_err();

        assert_eq!(empty.code(), "invalid_input");
        assert_eq!(blank.code(), "invalid_input");
        assert!(list.is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn add_rejects_start_after_end() {
        let (mut list, _) = list_with(Vec::new());

        let err = list.add("demo", Some(june(12)), Some(june(10))).unwrap_err();

        assert!(err.is_validation());
        assert!(list.is_empty());
    }

    #[test]
    fn add_accepts_single_day_and_open_ranges() {
        let (mut list, _) = list_with(Vec::new());

        list.add("same day", Some(june(10)), Some(june(10))).unwrap();
        list.add("start only", Some(june(12)), None).unwrap();
        list.add("end only", None, Some(june(1))).unwrap();

        assert_eq!(list.len(), 3);
    }

    #[test]
    fn add_preserves_insertion_order_and_unique_ids() {
        let (mut list, _) = list_with(Vec::new());

        let first = list.add("first", None, None).unwrap();
        let second = list.add("second", None, None).unwrap();
        let third = list.add("third", None, None).unwrap();

        let texts: Vec<&str> = list.todos().iter().map(|todo| todo.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert!(first.id < second.id);
        assert!(second.id < third.id);
    }

    #[test]
    fn add_never_reuses_loaded_ids() {
        let far_future = i64::MAX / 2;
        let (mut list, _) = list_with(vec![Todo::new(far_future, "loaded")]);

        let todo = list.add("fresh", None, None).unwrap();

        assert_eq!(todo.id, far_future + 1);
    }

    #[test]
    fn add_after_max_id_picks_an_unused_id() {
        let (mut list, _) = list_with(vec![Todo::new(i64::MAX, "loaded"), Todo::new(1, "one")]);

        let first = list.add("fresh", None, None).unwrap();
        let second = list.add("fresher", None, None).unwrap();

        assert_eq!(first.id, 2);
        assert_eq!(second.id, 3);
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn toggle_twice_restores_completion() {
        let (mut list, store) = list_with(vec![Todo::new(1, "demo")]);

        assert_eq!(list.toggle_completion(1), Some(true));
        assert!(list.get(1).unwrap().completed);
        assert_eq!(list.toggle_completion(1), Some(false));
        assert!(!list.get(1).unwrap().completed);
        assert_eq!(store.save_count(), 2);
    }

    #[test]
    fn toggle_unknown_id_is_silent() {
        let (mut list, store) = list_with(vec![Todo::new(1, "demo")]);

        assert_eq!(list.toggle_completion(99), None);
        assert!(!list.get(1).unwrap().completed);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn update_replaces_in_place() {
        let (mut list, store) = list_with(vec![
            Todo::new(1, "first"),
            Todo::new(2, "second"),
            Todo::new(3, "third"),
        ]);

        let mut edited = Todo::new(2, "  second, revised ").with_dates(Some(june(1)), Some(june(5)));
        edited.completed = true;
        list.update(edited).unwrap();

        let updated = &list.todos()[1];
        assert_eq!(updated.id, 2);
        assert_eq!(updated.text, "second, revised");
        assert!(updated.completed);
        assert_eq!(updated.end_date, Some(june(5)));
        assert_eq!(store.stored().unwrap()[1], *updated);
    }

    #[test]
    fn update_rejects_invalid_fields_without_mutation() {
        let original = Todo::new(1, "demo");
        let (mut list, store) = list_with(vec![original.clone()]);

        let blank = list.update(Todo::new(1, "  ")).unwrap_err();
        let reversed = list
            .update(Todo::new(1, "demo").with_dates(Some(june(20)), Some(june(10))))
            .unwrap_err();

        assert!(blank.is_validation());
        assert!(reversed.is_validation());
        assert_eq!(list.todos(), [original]);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn update_unknown_id_changes_nothing() {
        let original = Todo::new(1, "demo");
        let (mut list, _) = list_with(vec![original.clone()]);

        list.update(Todo::new(2, "ghost")).unwrap();

        assert_eq!(list.todos(), [original]);
    }

    #[test]
    fn delete_twice_is_noop_the_second_time() {
        let (mut list, _) = list_with(vec![Todo::new(1, "first"), Todo::new(2, "second")]);

        let removed = list.delete(1);
        let again = list.delete(1);

        assert_eq!(removed.map(|todo| todo.text), Some("first".to_string()));
        assert!(again.is_none());
        assert_eq!(list.len(), 1);
        assert_eq!(list.todos()[0].id, 2);
    }

    #[test]
    fn clear_all_empties_regardless_of_size() {
        let (mut list, store) = list_with(vec![Todo::new(1, "a"), Todo::new(2, "b")]);

        list.clear_all();
        assert!(list.is_empty());
        list.clear_all();
        assert!(list.is_empty());

        assert_eq!(store.stored(), Some(Vec::new()));
        assert_eq!(store.save_count(), 2);
    }

    #[test]
    fn load_replaces_sequence_wholesale() {
        let store = MemoryStore::with_todos(vec![Todo::new(5, "stored")]);
        let mut list = TodoList::new(store.clone());
        list.add("unsaved", None, None).unwrap();
        store.save(&[Todo::new(5, "stored")]).ok();

        list.load();

        assert_eq!(list.todos(), [Todo::new(5, "stored")]);
    }

    #[test]
    fn load_failure_degrades_to_empty() {
        let mut list = TodoList::new(MemoryStore::failing());

        list.load();

        assert!(list.is_empty());
        assert_eq!(
            list.last_storage_error().map(|err| err.code()),
            Some("storage_error")
        );
    }

    #[test]
    fn save_failure_keeps_in_memory_change() {
        let (mut list, store) = list_with(vec![Todo::new(1, "demo")]);
        store.set_failing(true);

        let added = list.add("kept", None, None).unwrap();
        list.toggle_completion(1);

        assert_eq!(list.len(), 2);
        assert!(list.get(1).unwrap().completed);
        assert!(list.get(added.id).is_some());
        assert!(list.last_storage_error().is_some());
        assert_eq!(store.stored().unwrap(), vec![Todo::new(1, "demo")]);

        store.set_failing(false);
        list.delete(added.id);
        assert!(list.last_storage_error().is_none());
    }

    #[test]
    fn save_failure_is_logged_through_injected_dispatch() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let mut list = TodoList::new(MemoryStore::failing()).with_dispatch(Dispatch::new(subscriber));

        list.clear_all();

        let output = log.contents();
        assert!(output.contains("failed to save todos"));
        assert!(output.contains("memory slot unavailable"));
    }

    #[test]
    fn file_store_round_trips_through_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");

        let mut list = TodoList::new(JsonFileStore::new(&path));
        list.load();
        list.add("dated", Some(june(1)), Some(june(20))).unwrap();
        let plain = list.add("plain", None, None).unwrap();
        list.toggle_completion(plain.id);

        let mut reloaded = TodoList::new(JsonFileStore::new(&path));
        reloaded.load();

        assert_eq!(reloaded.todos(), list.todos());
    }

    #[test]
    fn validate_fields_trims_text() {
        assert_eq!(validate_fields("  a  ", None, None).unwrap(), "a");
        assert!(validate_fields("a", Some(june(2)), Some(june(1))).is_err());
    }
}
