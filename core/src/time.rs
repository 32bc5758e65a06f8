// src/time.rs
use chrono::{DateTime, Months, NaiveDate, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the epoch; used as the id of requests and appointments.
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Accepts a bare `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde hook for dates the date picker wrote as bare `YYYY-MM-DD`.
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw)))
}

/// en-US short date, e.g. "Jan 5, 2025".
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format("%b %-d, %Y").to_string()
}

pub fn add_months(dt: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    dt.checked_add_months(Months::new(months)).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_plain_dates_and_timestamps() {
        let d = parse_date("2030-06-01").unwrap();
        assert_eq!(d, Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap());

        let t = parse_date("2030-06-01T12:30:00+02:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2030, 6, 1, 10, 30, 0).unwrap());

        assert!(parse_date("next tuesday").is_none());
    }

    #[test]
    fn formats_like_en_us_short() {
        let d = Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
        assert_eq!(format_date(&d), "Jan 5, 2025");
    }

    #[test]
    fn add_months_clamps_to_month_end() {
        let d = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        assert_eq!(add_months(d, 1), Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }
}
