use crate::date_status::DateStatus;
use crate::error::AppError;
use crate::model::Todo;
use crate::notify::{Notifier, launch_show, notification_body};
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, todo: &Todo, status: &DateStatus) -> Result<(), AppError> {
        self.notify_with_action(todo, status, "")
    }

    fn notify_with_action(
        &self,
        todo: &Todo,
        status: &DateStatus,
        action: &str,
    ) -> Result<(), AppError> {
        let mut notification = Notification::new();
        notification.summary("todo");
        notification.body(&notification_body(todo, status));
        if !action.trim().is_empty() {
            notification.action(action, "Open");
        }

        let handle = notification
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;

        if !action.trim().is_empty() {
            let action_key = action.to_string();
            let todo_id = todo.id;
            std::thread::spawn(move || {
                handle.wait_for_action(|selected| {
                    if selected == action_key || selected == "default" {
                        let _ = launch_show(todo_id);
                    }
                });
            });
        }

        Ok(())
    }
}
