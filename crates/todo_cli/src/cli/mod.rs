use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use todo_core::AppError;
use todo_core::config::{ConfigOverrides, canonical_key};
use todo_core::model::TodoId;
use todo_core::model::dates::parse_date;
use time::Date;

#[derive(Parser, Debug)]
#[command(author, version, about = "A to-do list with optional start and end dates", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new todo
    ///
    /// Example: todo add "Buy milk"
    /// Example: todo add "File taxes" --start 2024-06-01 --end 2024-06-15
    Add {
        text: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        start: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        end: Option<String>,
    },
    /// List all todos with their date status
    ///
    /// Example: todo list
    List,
    /// Show details of a todo
    ///
    /// Example: todo show 1718000000000
    Show { id: TodoId },
    /// Edit a todo's text or dates in one step (an empty date clears it)
    ///
    /// Example: todo edit 1718000000000 --text "Buy oat milk"
    /// Example: todo edit 1718000000000 --end ""
    Edit {
        id: TodoId,
        #[arg(long)]
        text: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        start: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        end: Option<String>,
    },
    /// Toggle a todo between completed and open
    ///
    /// Example: todo done 1718000000000
    Done { id: TodoId },
    /// Delete a todo after confirmation
    ///
    /// Example: todo delete 1718000000000
    /// Example: todo delete 1718000000000 --yes
    Delete {
        id: TodoId,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Delete every todo after confirmation
    ///
    /// Example: todo clear --yes
    Clear {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Send notifications for overdue and soon-due todos
    ///
    /// Example: todo notify
    Notify,
    /// Edit a todo across several steps (interactive mode)
    ///
    /// Example: draft start 1718000000000
    /// Example: draft set 1718000000000 --end 2024-06-20
    /// Example: draft save 1718000000000
    Draft {
        #[command(subcommand)]
        draft: DraftCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum DraftCommand {
    /// Start editing a todo
    Start { id: TodoId },
    /// Change fields of the todo being edited
    Set {
        id: TodoId,
        #[arg(long)]
        text: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        start: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        end: Option<String>,
    },
    /// Save the edited fields
    Save { id: TodoId },
    /// Discard the edited fields
    Cancel { id: TodoId },
}

/// Parse an optional command-line date. Blank input means "no date".
pub fn parse_date_arg(raw: Option<&str>, field: &str) -> Result<Option<Date>, AppError> {
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => parse_date(value)
            .map(Some)
            .ok_or_else(|| AppError::invalid_input(format!("{field} must be YYYY-MM-DD"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Alias(String),
    StorePath,
    LogFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field = canonical_key(field);
    if canonical_field.is_empty() {
        return Err("override key cannot be empty".to_string());
    }

    let scalar = |target: ConfigOverrideTarget| {
        if remainder.is_some() {
            Err(format!("{canonical_field} override cannot have subfields"))
        } else {
            Ok(ParsedConfigOverride {
                target,
                value: value.clone(),
            })
        }
    };

    match canonical_field.as_str() {
        "theme" => scalar(ConfigOverrideTarget::Theme),
        "store_path" | "store" => scalar(ConfigOverrideTarget::StorePath),
        "log_filter" | "log" => scalar(ConfigOverrideTarget::LogFilter),
        "aliases" | "alias" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "aliases override requires an alias name".to_string())?;
            Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias_name.to_string()),
                value,
            })
        }
        other => Err(format!("unknown config field '{other}'")),
    }
}

pub fn build_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    let mut aliases = HashMap::new();

    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::StorePath => {
                overrides.store_path = Some(PathBuf::from(parsed.value))
            }
            ConfigOverrideTarget::LogFilter => overrides.log_filter = Some(parsed.value),
            ConfigOverrideTarget::Alias(name) => {
                aliases.insert(name, parsed.value);
            }
        }
    }

    overrides.aliases = aliases;
    Ok(overrides)
}

/// Replace a leading alias with its expansion. Only the first word is
/// considered and expansions are not expanded again.
pub fn expand_alias(
    args: Vec<String>,
    aliases: &HashMap<String, String>,
) -> Result<Vec<String>, AppError> {
    let Some(first) = args.first() else {
        return Ok(args);
    };
    let Some(expansion) = aliases.get(first) else {
        return Ok(args);
    };

    let mut expanded = split_command_line(expansion)?;
    expanded.extend(args.into_iter().skip(1));
    Ok(expanded)
}

/// Split a line into arguments, honouring double quotes and backslash
/// escapes inside them.
pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}
