use clap::{CommandFactory, Parser};
use std::io::{self, BufRead, Write};
use todo_cli::cli::{
    Cli, Command, DraftCommand, build_overrides, expand_alias, parse_date_arg, split_command_line,
};
use todo_cli::render;
use todo_core::config::{self, Config, Palette, merge_overrides, palette_for_theme};
use todo_core::model::{Todo, TodoId};
use todo_core::notify::{notifier_from_env, notify_due};
use todo_core::storage::json_store;
use todo_core::{AppError, EditOutcome, EditSessions, JsonFileStore, TodoList};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LOG_FILTER: &str = "warn";

struct Session {
    list: TodoList<JsonFileStore>,
    edits: EditSessions,
    palette: Palette,
    interactive: bool,
}

impl Session {
    fn open(config: &Config, interactive: bool) -> Result<Self, AppError> {
        let path = json_store::store_path(config.store_path.as_deref())?;
        tracing::debug!(path = %path.display(), "opening todo store");

        let mut list = TodoList::new(JsonFileStore::new(path));
        list.load();
        let mut edits = EditSessions::new();
        edits.reset(list.todos());

        Ok(Self {
            list,
            edits,
            palette: palette_for_theme(config.theme.as_deref()),
            interactive,
        })
    }

    fn existing(&self, id: TodoId) -> Result<Todo, AppError> {
        self.list
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::invalid_input("todo not found"))
    }

    /// Rebuild edit sessions after a mutation and surface a failed save.
    fn after_mutation(&mut self) {
        self.edits.sync(self.list.todos());
        if let Some(err) = self.list.last_storage_error() {
            eprintln!("warning: changes were not saved: {err}");
        }
    }
}

fn init_logging(config_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init();
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

/// Ask a yes/no question on `input`. Anything but `y`/`yes`, including end of
/// input, declines.
fn confirm(prompt: &str, input: &mut dyn BufRead) -> Result<bool, AppError> {
    print!("{prompt} [y/N] ");
    io::stdout()
        .flush()
        .map_err(|err| AppError::io(err.to_string()))?;

    let mut answer = String::new();
    let bytes = input
        .read_line(&mut answer)
        .map_err(|err| AppError::io(err.to_string()))?;
    if bytes == 0 {
        println!();
        return Ok(false);
    }

    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn print_todo(todo: &Todo, verb: &str, json: bool) {
    if json {
        println!("{}", render::todo_json(todo, todo_core::local_today()));
    } else {
        println!("{verb} todo: {} ({})", todo.text, todo.id);
    }
}

fn apply_draft_fields(
    session: &mut Session,
    id: TodoId,
    text: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(), AppError> {
    // Validate date syntax up front so a typo is reported against the flag.
    parse_date_arg(start, "start date")?;
    parse_date_arg(end, "end date")?;

    if let Some(text) = text {
        session.edits.set_text(id, text);
    }
    if let Some(start) = start {
        session.edits.set_start_date(id, start);
    }
    if let Some(end) = end {
        session.edits.set_end_date(id, end);
    }
    Ok(())
}

fn run_command(session: &mut Session, cli: Cli, input: &mut dyn BufRead) -> Result<(), AppError> {
    let today = todo_core::local_today();

    match cli.command {
        Command::Add { text, start, end } => {
            let text = match text {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("text is required")),
            };
            let start_date = parse_date_arg(start.as_deref(), "start date")?;
            let end_date = parse_date_arg(end.as_deref(), "end date")?;

            let todo = session.list.add(&text, start_date, end_date)?;
            session.after_mutation();
            print_todo(&todo, "Added", cli.json);
        }
        Command::List => {
            let todos = session.list.todos();
            if cli.json {
                println!("{}", render::todos_json(todos, today));
            } else if todos.is_empty() {
                println!("No todos.");
            } else {
                let rows = render::todo_rows(todos, &session.edits, today, &session.palette);
                println!("{}", render::render_table(rows));
            }
        }
        Command::Show { id } => {
            let todo = session.existing(id)?;
            if cli.json {
                println!("{}", render::todo_json(&todo, today));
            } else {
                println!("{}", render::todo_details(&todo, &session.edits, today));
            }
        }
        Command::Edit {
            id,
            text,
            start,
            end,
        } => {
            let todo = session.existing(id)?;
            if text.is_none() && start.is_none() && end.is_none() {
                return Err(AppError::invalid_input(
                    "nothing to edit: pass --text, --start or --end",
                ));
            }

            let was_editing = session.edits.is_editing(id);
            session.edits.start_edit(&todo);
            if let Err(err) =
                apply_draft_fields(session, id, text.as_deref(), start.as_deref(), end.as_deref())
            {
                if !was_editing {
                    session.edits.cancel_edit(id);
                }
                return Err(err);
            }

            match session.edits.save_edit(id, &mut session.list) {
                EditOutcome::Saved(todo) => {
                    session.after_mutation();
                    print_todo(&todo, "Updated", cli.json);
                }
                EditOutcome::Rejected(err) => {
                    if !was_editing {
                        session.edits.cancel_edit(id);
                    }
                    return Err(err);
                }
                EditOutcome::NotEditing => {
                    return Err(AppError::invalid_input("todo is not being edited"));
                }
            }
        }
        Command::Done { id } => {
            session.existing(id)?;
            session.edits.toggle_completion(id, &mut session.list);
            session.after_mutation();
            let todo = session.existing(id)?;
            let verb = if todo.completed { "Completed" } else { "Reopened" };
            print_todo(&todo, verb, cli.json);
        }
        Command::Delete { id, yes } => {
            let todo = session.existing(id)?;
            let prompt = format!(
                "Are you sure you want to delete this todo item?\n\n\"{}\"\n\nThis action cannot be undone.",
                todo.text
            );
            if !yes && !confirm(&prompt, input)? {
                println!("Delete cancelled.");
                return Ok(());
            }

            if let Some(removed) = session.list.delete(id) {
                session.after_mutation();
                print_todo(&removed, "Deleted", cli.json);
            }
        }
        Command::Clear { yes } => {
            let count = session.list.len();
            let prompt = format!(
                "Are you sure you want to delete all {count} todo item(s)?\n\nThis action cannot be undone and will permanently remove all your todos."
            );
            if !yes && !confirm(&prompt, input)? {
                println!("Clear cancelled.");
                return Ok(());
            }

            session.list.clear_all();
            session.after_mutation();
            if cli.json {
                println!("{}", serde_json::json!({ "cleared": count }));
            } else {
                println!("Cleared {count} todo(s).");
            }
        }
        Command::Notify => {
            let notifier = notifier_from_env()?;
            // One-shot runs exit before an "Open" click could be handled.
            let outcome = notify_due(
                session.list.todos(),
                today,
                notifier.as_ref(),
                session.interactive,
            );

            if cli.json {
                println!("{}", render::todos_json(&outcome.todos, today));
            } else if outcome.todos.is_empty() {
                println!("No todos need attention.");
            } else {
                for todo in &outcome.todos {
                    let status = todo_core::date_status::todo_date_status(todo, today);
                    println!("Notified todo: {} ({}) - {}", todo.text, todo.id, status);
                }
            }
            for failure in &outcome.failures {
                eprintln!("ERROR: {}: {}", failure.todo_id, failure.error);
            }
        }
        Command::Draft { draft } => run_draft(session, draft, cli.json)?,
    }

    Ok(())
}

fn run_draft(session: &mut Session, draft: DraftCommand, json: bool) -> Result<(), AppError> {
    match draft {
        DraftCommand::Start { id } => {
            let todo = session.existing(id)?;
            session.edits.start_edit(&todo);
            println!("Editing todo: {} ({})", todo.text, todo.id);
        }
        DraftCommand::Set {
            id,
            text,
            start,
            end,
        } => {
            session.existing(id)?;
            if !session.edits.is_editing(id) {
                return Err(AppError::invalid_input("todo is not being edited"));
            }
            apply_draft_fields(session, id, text.as_deref(), start.as_deref(), end.as_deref())?;
            if let Some(draft) = session.edits.draft(id) {
                println!(
                    "Draft: text={:?} start={:?} end={:?}",
                    draft.text, draft.start_date, draft.end_date
                );
            }
        }
        DraftCommand::Save { id } => match session.edits.save_edit(id, &mut session.list) {
            EditOutcome::Saved(todo) => {
                session.after_mutation();
                print_todo(&todo, "Updated", json);
            }
            EditOutcome::Rejected(err) => return Err(err),
            EditOutcome::NotEditing => {
                return Err(AppError::invalid_input("todo is not being edited"));
            }
        },
        DraftCommand::Cancel { id } => {
            if !session.edits.cancel_edit(id) {
                return Err(AppError::invalid_input("todo is not being edited"));
            }
            println!("Edit cancelled: {id}");
        }
    }

    Ok(())
}

fn run_interactive(session: &mut Session, config: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line)
            .and_then(|args| expand_alias(args, &config.aliases))
        {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("todo".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input("config overrides are only accepted on the command line")
            );
            continue;
        }

        if let Err(err) = run_command(session, cli, &mut stdin_lock) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn run() -> Result<(), AppError> {
    let loaded = config::load_config_with_fallback();
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() {
        init_logging(loaded.config.log_filter.as_deref());
        if let Some(err) = loaded.error {
            tracing::warn!(error = %err, "ignoring unreadable config");
        }
        let mut session = Session::open(&loaded.config, true)?;
        return run_interactive(&mut session, &loaded.config);
    }

    let args = expand_alias(args, &loaded.config.aliases)?;
    let cli = Cli::try_parse_from(std::iter::once("todo".to_string()).chain(args))
        .map_err(|err| {
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) {
                err.exit();
            }
            normalize_parse_error(err)
        })?;

    let overrides = build_overrides(&cli.config_override)?;
    let config = merge_overrides(&loaded.config, &overrides);
    init_logging(config.log_filter.as_deref());
    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "ignoring unreadable config");
    }

    let mut session = Session::open(&config, false)?;
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();
    run_command(&mut session, cli, &mut stdin_lock)
}

fn main() {
    if let Err(err) = run() {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
