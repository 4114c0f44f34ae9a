//! Portal date formats
//!
//! The portal serializes timestamps as `dd.MM.yyyy HH:mm` and plain dates as
//! `dd.MM.yyyy`. Parse failures are tolerated everywhere a portal string is
//! consumed, so the helpers return `Option` rather than `Result`.

use chrono::{NaiveDate, NaiveDateTime};

pub const PORTAL_DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M";
pub const PORTAL_DATE_FORMAT: &str = "%d.%m.%Y";

pub fn parse_portal_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, PORTAL_DATETIME_FORMAT).ok()
}

pub fn parse_portal_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, PORTAL_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_portal_datetime() {
        let parsed = parse_portal_datetime("15.01.2024 09:30").unwrap();
        assert_eq!(parsed.to_string(), "2024-01-15 09:30:00");
    }

    #[test]
    fn parses_portal_date() {
        let parsed = parse_portal_date("01.03.2024").unwrap();
        assert_eq!(parsed.to_string(), "2024-03-01");
    }

    #[test]
    fn malformed_strings_yield_none() {
        assert!(parse_portal_datetime("2024-01-15 09:30").is_none());
        assert!(parse_portal_datetime("15.01.2024").is_none());
        assert!(parse_portal_date("01/03/2024").is_none());
        assert!(parse_portal_date("").is_none());
    }
}
