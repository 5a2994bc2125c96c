pub mod config;
pub mod date_status;
pub mod editing;
pub mod error;
pub mod model;
pub mod notify;
pub mod storage;
pub mod todo_list;

pub use date_status::{DateStatus, date_status};
pub use editing::{EditOutcome, EditSessions, RowState};
pub use error::AppError;
pub use model::{Todo, TodoId};
pub use storage::{JsonFileStore, MemoryStore, TodoStore};
pub use todo_list::TodoList;

/// The current calendar day in the local time zone, UTC when the offset
/// cannot be determined.
pub fn local_today() -> time::Date {
    let offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    time::OffsetDateTime::now_utc().to_offset(offset).date()
}
