use crate::error::AppError;
use crate::model::Todo;
use crate::storage::TodoStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "todos.json";
const STORE_ENV_VAR: &str = "TODOLIST_STORE_PATH";

#[derive(Debug, Serialize, Deserialize)]
struct StoredTodos {
    schema_version: u32,
    todos: Vec<Todo>,
}

/// Slot content as written by this crate, or the bare array the browser
/// version kept under its storage key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredSlot {
    Document(StoredTodos),
    Bare(Vec<Todo>),
}

/// Resolve the slot location: environment override, then the configured
/// path, then the per-user default.
pub fn store_path(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("todolist").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("todolist")
            .join(STORE_FILE_NAME))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TodoStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Todo>, AppError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|err| AppError::storage(format!("{}: {}", self.path.display(), err)))?;

        match serde_json::from_str::<StoredSlot>(&content) {
            Ok(StoredSlot::Document(stored)) => {
                if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
                    tracing::warn!(
                        path = %self.path.display(),
                        schema_version = stored.schema_version,
                        "unsupported schema version, starting with an empty list"
                    );
                    return Ok(Vec::new());
                }
                Ok(stored.todos)
            }
            Ok(StoredSlot::Bare(todos)) => Ok(todos),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "unreadable todo slot, starting with an empty list"
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, todos: &[Todo]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|err| AppError::storage(err.to_string()))?;
        }

        let stored = StoredTodos {
            schema_version: SCHEMA_VERSION,
            todos: todos.to_vec(),
        };
        let content = serde_json::to_string_pretty(&stored)
            .map_err(|err| AppError::storage(err.to_string()))?;
        std::fs::write(&self.path, content).map_err(|err| AppError::storage(err.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, permissions)
                .map_err(|err| AppError::storage(err.to_string()))?;
        }

        tracing::debug!(path = %self.path.display(), count = todos.len(), "saved todos");
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::storage(err.to_string())),
        }
    }
}
