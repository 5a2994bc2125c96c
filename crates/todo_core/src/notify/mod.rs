use crate::date_status::{DateStatus, todo_date_status};
use crate::error::AppError;
use crate::model::{Todo, TodoId};
use time::Date;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

pub trait Notifier {
    fn notify(&self, todo: &Todo, status: &DateStatus) -> Result<(), AppError>;

    fn notify_with_action(
        &self,
        todo: &Todo,
        status: &DateStatus,
        action: &str,
    ) -> Result<(), AppError> {
        let _ = action;
        self.notify(todo, status)
    }
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _todo: &Todo, _status: &DateStatus) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct NotificationOutcome {
    pub todos: Vec<Todo>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub todo_id: TodoId,
    pub error: AppError,
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var("TODOLIST_DISABLE_NOTIFICATIONS").is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(err) => match err {
            AppError::InvalidData(_) => Ok(Box::new(NoopNotifier)),
            other => Err(other),
        },
    }
}

/// Notify every incomplete todo that is overdue, due today or due tomorrow.
/// A failing notification is recorded and the remaining todos still go out.
///
/// `with_actions` attaches the "Open" action. Only pass `true` when the
/// process stays alive to receive it.
pub fn notify_due(
    todos: &[Todo],
    today: Date,
    notifier: &dyn Notifier,
    with_actions: bool,
) -> NotificationOutcome {
    let mut notified = Vec::new();
    let mut failures = Vec::new();

    for todo in todos {
        if todo.completed {
            continue;
        }

        let status = todo_date_status(todo, today);
        if !status.needs_attention() {
            continue;
        }

        let sent = if with_actions {
            notifier.notify_with_action(todo, &status, &activation_argument(todo.id))
        } else {
            notifier.notify(todo, &status)
        };
        match sent {
            Ok(()) => notified.push(todo.clone()),
            Err(error) => {
                tracing::warn!(id = todo.id, error = %error, "notification failed");
                failures.push(NotificationFailure {
                    todo_id: todo.id,
                    error,
                });
            }
        }
    }

    NotificationOutcome {
        todos: notified,
        failures,
    }
}

const ACTION_PREFIX: &str = "show:";

pub fn activation_argument(todo_id: TodoId) -> String {
    format!("{ACTION_PREFIX}{todo_id}")
}

pub fn parse_activation_argument(argument: &str) -> Option<TodoId> {
    argument
        .strip_prefix(ACTION_PREFIX)
        .and_then(|id| id.trim().parse().ok())
}

pub fn launch_show(todo_id: TodoId) -> Result<(), AppError> {
    let exe = std::env::current_exe().map_err(|err| AppError::io(err.to_string()))?;
    std::process::Command::new(exe)
        .arg("show")
        .arg(todo_id.to_string())
        .spawn()
        .map_err(|err| AppError::io(err.to_string()))?;
    Ok(())
}

fn notification_body(todo: &Todo, status: &DateStatus) -> String {
    format!("{} ({})", todo.text, status.message())
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
