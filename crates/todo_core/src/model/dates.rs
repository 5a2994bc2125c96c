use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Parse a calendar date from user input or a stored slot.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 date-times (the date part is kept as
/// written). Blank or unparseable input yields `None`.
pub fn parse_date(raw: &str) -> Option<Date> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let calendar = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(trimmed, &calendar) {
        return Some(date);
    }

    OffsetDateTime::parse(trimmed, &Rfc3339)
        .ok()
        .map(|datetime| datetime.date())
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn format_optional_date(date: Option<Date>) -> String {
    date.map(format_date).unwrap_or_default()
}

/// Serde adapter for `Option<Date>` fields. Values that are not a parseable
/// date string read as `None` instead of failing the whole document.
pub mod optional_date {
    use super::{format_date, parse_date};
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_some(&format_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        let parsed = match raw.as_ref() {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(value)) if value.trim().is_empty() => None,
            Some(serde_json::Value::String(value)) => {
                let parsed = parse_date(value);
                if parsed.is_none() {
                    tracing::warn!(value = %value, "ignoring unparseable stored date");
                }
                parsed
            }
            Some(other) => {
                tracing::warn!(value = %other, "ignoring non-string stored date");
                None
            }
        };
        Ok(parsed)
    }
}
