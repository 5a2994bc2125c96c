use crate::date_status::DateStatus;
use crate::error::AppError;
use crate::model::Todo;
use crate::notify::{Notifier, launch_show, parse_activation_argument};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, todo: &Todo, status: &DateStatus) -> Result<(), AppError> {
        self.notify_with_action(todo, status, "")
    }

    fn notify_with_action(
        &self,
        todo: &Todo,
        status: &DateStatus,
        action: &str,
    ) -> Result<(), AppError> {
        let todo_id = todo.id;
        let action_value = action.to_string();
        let mut toast = Toast::new(Toast::POWERSHELL_APP_ID)
            .title("todo")
            .text1(&todo.text)
            .text2(&status.message());

        if !action_value.trim().is_empty() {
            toast = toast.add_button("Open", &action_value);
        }

        toast
            .on_activated(move |args| {
                let target = match args.as_deref() {
                    Some(args) if args == action_value => Some(todo_id),
                    Some(args) if args.trim().is_empty() => Some(todo_id),
                    Some(args) => parse_activation_argument(args),
                    None => Some(todo_id),
                };
                if let Some(id) = target {
                    let _ = launch_show(id);
                }
                Ok(())
            })
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
