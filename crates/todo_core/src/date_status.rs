//! Urgency of a todo derived from its end date and the current day.
//!
//! Nothing here reads a clock: callers pass `today` explicitly.

use crate::model::Todo;
use crate::model::dates::parse_date;
use std::fmt;
use time::Date;

const DUE_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStatus {
    None,
    Overdue { days: i64 },
    DueToday,
    DueTomorrow,
    DueSoon { days: i64 },
    OnTrack { days: i64 },
}

impl DateStatus {
    /// Coarse bucket used for styling. Tomorrow shares the `due-soon` bucket.
    pub fn class(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Overdue { .. } => "overdue",
            Self::DueToday => "due-today",
            Self::DueTomorrow | Self::DueSoon { .. } => "due-soon",
            Self::OnTrack { .. } => "on-track",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Overdue { days } => format!("Overdue by {days} day(s)"),
            Self::DueToday => "Due today".to_string(),
            Self::DueTomorrow => "Due tomorrow".to_string(),
            Self::DueSoon { days } => format!("Due in {days} day(s)"),
            Self::OnTrack { days } => format!("{days} days remaining"),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Overdue, due today or due tomorrow.
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::Overdue { .. } | Self::DueToday | Self::DueTomorrow)
    }
}

impl fmt::Display for DateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

pub fn date_status(end_date: Option<Date>, today: Date) -> DateStatus {
    let Some(end_date) = end_date else {
        return DateStatus::None;
    };

    let diff_days = (end_date - today).whole_days();
    match diff_days {
        diff if diff < 0 => DateStatus::Overdue { days: -diff },
        0 => DateStatus::DueToday,
        1 => DateStatus::DueTomorrow,
        diff if diff <= DUE_SOON_DAYS => DateStatus::DueSoon { days: diff },
        diff => DateStatus::OnTrack { days: diff },
    }
}

pub fn todo_date_status(todo: &Todo, today: Date) -> DateStatus {
    date_status(todo.end_date, today)
}

/// Same rule applied to a raw date string; unparseable input has no status.
pub fn date_status_for_raw(raw: Option<&str>, today: Date) -> DateStatus {
    date_status(raw.and_then(parse_date), today)
}
