//! Parses page dates and formats them for display. Dates are written either
//! as `YYYY-MM-DD HH:MM` or as `YYYY-MM-DD` (midnight).

use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::fmt::{self, Write};

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The short display format, e.g. `02 Jan 2020 at 10:30`.
pub const SHORT_FORMAT: &str = "%d %b %Y at %H:%M";

/// The long display format, e.g. `02 January 2020 at 10:30`.
pub const LONG_FORMAT: &str = "%d %B %Y at %H:%M";

/// The format of the `generated_date` stamped into every rendered page, e.g.
/// `Thu Jan 02 10:30 +01:00 2020`.
pub const GENERATED_FORMAT: &str = "%a %b %d %H:%M %Z %Y";

// Removed from the short and long formats so that dates without a time of
// day don't display one.
const MIDNIGHT_SUFFIX: &str = " at 00:00";

/// Parses `date` as `YYYY-MM-DD HH:MM`, falling back to `YYYY-MM-DD`.
pub fn parse(date: &str) -> Result<NaiveDateTime> {
    let date = date.trim();
    if let Ok(date_time) = NaiveDateTime::parse_from_str(date, DATE_TIME_FORMAT) {
        return Ok(date_time);
    }
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Error::InvalidDate(date.to_owned()))
}

/// Formats a parsed date with a strftime-style `format`. Unknown specifiers
/// are reported as errors rather than panicking inside `chrono`.
pub fn format_date_time(date_time: &NaiveDateTime, format: &str) -> Result<String> {
    let items: Vec<Item> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(Error::InvalidFormat(format.to_owned()));
    }
    let mut formatted = String::new();
    write!(formatted, "{}", date_time.format_with_items(items.iter()))
        .map_err(|fmt::Error| Error::InvalidFormat(format.to_owned()))?;
    Ok(formatted)
}

/// Parses `date` and formats it with `format`.
pub fn format(date: &str, format: &str) -> Result<String> {
    format_date_time(&parse(date)?, format)
}

/// Formats `date` with [`SHORT_FORMAT`], dropping a midnight time of day.
pub fn to_string(date: &str) -> Result<String> {
    Ok(format(date, SHORT_FORMAT)?.replace(MIDNIGHT_SUFFIX, ""))
}

/// Formats `date` with [`LONG_FORMAT`], dropping a midnight time of day.
pub fn to_long_string(date: &str) -> Result<String> {
    Ok(format(date, LONG_FORMAT)?.replace(MIDNIGHT_SUFFIX, ""))
}

/// The current local time in [`GENERATED_FORMAT`].
pub fn generated_date() -> String {
    Local::now().format(GENERATED_FORMAT).to_string()
}

/// The result of a fallible date operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a date that can't be parsed or a format that can't be applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Returned when a date is in neither supported form.
    InvalidDate(String),

    /// Returned when a format string has unknown or inapplicable specifiers.
    InvalidFormat(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidDate(date) => write!(
                f,
                "invalid date `{}`: expected `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`",
                date
            ),
            Error::InvalidFormat(format) => write!(f, "invalid date format `{}`", format),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_short_and_long_strings() -> Result<()> {
        assert_eq!("02 Jan 2020", to_string("2020-01-02")?);
        assert_eq!("02 January 2020", to_long_string("2020-01-02")?);
        assert_eq!("02 Jan 2020 at 10:30", to_string("2020-01-02 10:30")?);
        assert_eq!("02 January 2020 at 10:30", to_long_string("2020-01-02 10:30")?);
        assert_eq!("02 Jan 2020", to_string("2020-01-02 00:00")?);
        Ok(())
    }

    #[test]
    fn test_custom_format() -> Result<()> {
        assert_eq!("2020/03/01", format("2020-03-01", "%Y/%m/%d")?);
        Ok(())
    }

    #[test]
    fn test_parse_orders_by_time() -> Result<()> {
        assert!(parse("2020-01-01 23:59")? < parse("2020-01-02")?);
        assert!(parse("2020-01-02")? < parse("2020-01-02 00:01")?);
        Ok(())
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            Err(Error::InvalidDate("yesterday".to_owned())),
            to_string("yesterday")
        );
        assert_eq!(
            Err(Error::InvalidDate("2020-13-01".to_owned())),
            to_string("2020-13-01")
        );
        assert_eq!(
            Err(Error::InvalidFormat("%Q".to_owned())),
            format("2020-01-01", "%Q")
        );
    }
}
