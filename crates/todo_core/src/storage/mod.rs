//! Durable single-slot storage for the todo sequence.

use crate::error::AppError;
use crate::model::Todo;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub mod json_store;

pub use json_store::JsonFileStore;

/// Gateway between the in-memory collection and its persistent slot.
///
/// `save` always receives the full sequence. `load` yields an empty sequence
/// when the slot is absent or its content cannot be understood; only failures
/// of the medium itself surface as errors.
pub trait TodoStore {
    fn load(&self) -> Result<Vec<Todo>, AppError>;

    fn save(&self, todos: &[Todo]) -> Result<(), AppError>;

    fn clear(&self) -> Result<(), AppError>;
}

/// In-process slot. Clones share the same slot, so a caller can keep a handle
/// for inspection after handing one to a `TodoList`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<Vec<Todo>>>>,
    saves: Rc<Cell<usize>>,
    failing: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_todos(todos: Vec<Todo>) -> Self {
        let store = Self::default();
        store.slot.replace(Some(todos));
        store
    }

    /// A store whose every operation fails with a storage error.
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn stored(&self) -> Option<Vec<Todo>> {
        self.slot.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.get() {
            Err(AppError::storage("memory slot unavailable"))
        } else {
            Ok(())
        }
    }
}

impl TodoStore for MemoryStore {
    fn load(&self) -> Result<Vec<Todo>, AppError> {
        self.check()?;
        Ok(self.slot.borrow().clone().unwrap_or_default())
    }

    fn save(&self, todos: &[Todo]) -> Result<(), AppError> {
        self.saves.set(self.saves.get() + 1);
        self.check()?;
        self.slot.replace(Some(todos.to_vec()));
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        self.check()?;
        self.slot.replace(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryStore, TodoStore};
    use crate::model::Todo;

    #[test]
    fn memory_store_clones_share_slot() {
        let store = MemoryStore::new();
        let handle = store.clone();

        store.save(&[Todo::new(1, "demo")]).unwrap();

        assert_eq!(handle.stored().unwrap().len(), 1);
        assert_eq!(handle.save_count(), 1);
    }

    #[test]
    fn memory_store_clear_empties_slot() {
        let store = MemoryStore::with_todos(vec![Todo::new(1, "demo")]);

        store.clear().unwrap();

        assert!(store.stored().is_none());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn failing_memory_store_reports_storage_errors() {
        let store = MemoryStore::failing();

        assert_eq!(store.load().unwrap_err().code(), "storage_error");
        assert_eq!(store.save(&[]).unwrap_err().code(), "storage_error");
        assert_eq!(store.clear().unwrap_err().code(), "storage_error");
        assert_eq!(store.save_count(), 1);
    }
}
