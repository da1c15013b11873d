use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationBody {
    #[serde(alias = "reservationDate")]
    pub appt_date: Option<String>,
}

const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Accepts `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM[:SS]` or RFC 3339. The clock
/// time is kept as written, so an offset only validates the input.
pub fn parse_appt_date(raw: &str) -> Result<NaiveDateTime, AppError> {
    let raw = raw.trim();
    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
        .ok_or_else(|| AppError::invalid_argument("Invalid reservationDate format."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn accepts_space_and_iso_forms() {
        assert_eq!(parse_appt_date("2025-03-01 23:30").unwrap().hour(), 23);
        assert_eq!(parse_appt_date("2025-03-01T02:00").unwrap().hour(), 2);
        assert_eq!(parse_appt_date("2025-03-01T12:00:00+07:00").unwrap().hour(), 12);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_appt_date("tomorrow"), Err(AppError::InvalidArgument(_))));
    }
}
