//! Time utilities: timezone-aware day boundaries and deadlines.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse().map_err(|_| Error::InvalidTimezone(tz.to_string()))
}

/// UTC instant of local midnight on `date`.
///
/// If midnight does not exist locally (DST jump at 00:00) the first instant
/// after the gap is used; if it is ambiguous, the earlier one.
pub fn local_start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// The calendar date `now` falls on in `tz`.
pub fn local_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Inclusive UTC bounds covering the local calendar days `from..=to`.
///
/// Either end may be open. The upper bound is the last instant before the
/// local midnight that follows `to`.
pub fn local_date_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    tz: Tz,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let start = from.map(|d| local_start_of_day(d, tz));
    let end = to.map(|d| local_start_of_day(d + Days::new(1), tz) - Duration::nanoseconds(1));
    (start, end)
}

/// Parse a deadline like "2026-02-20 23:59" in an IANA tz like "America/Chicago",
/// returning UTC.
pub fn parse_local_deadline_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let zone = parse_timezone(tz)?;

    let ndt = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M")
        .map_err(|e| Error::InvalidDateTime(format!("'{local}': {e}")))?;

    let local_dt = zone
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| Error::InvalidDateTime(format!("ambiguous or skipped local time (DST?): {local} {tz}")))?;

    Ok(local_dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chicago_deadline() {
        // Feb is CST (UTC-6)
        let utc = parse_local_deadline_to_utc("2026-02-20 23:59", "America/Chicago").unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-02-21T05:59:00+00:00");
    }

    #[test]
    fn test_invalid_timezone() {
        assert_eq!(
            parse_timezone("Mars/Olympus"),
            Err(Error::InvalidTimezone("Mars/Olympus".to_string()))
        );
    }

    #[test]
    fn test_local_start_of_day() {
        let tz = parse_timezone("Europe/Moscow").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        // MSK is UTC+3 year-round.
        assert_eq!(local_start_of_day(date, tz).to_rfc3339(), "2026-05-31T21:00:00+00:00");
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let tz = parse_timezone("America/Chicago").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 21, 3, 0, 0).unwrap();
        assert_eq!(local_date(now, tz), NaiveDate::from_ymd_opt(2026, 2, 20).unwrap());
    }

    #[test]
    fn test_local_date_range_uses_zone() {
        let tz = parse_timezone("Asia/Tokyo").unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 4, 15);
        let (from, to) = local_date_range(day, day, tz);
        // JST is UTC+9.
        assert_eq!(from, Some(Utc.with_ymd_and_hms(2026, 4, 14, 15, 0, 0).unwrap()));
        let to = to.unwrap();
        assert!(to < Utc.with_ymd_and_hms(2026, 4, 15, 15, 0, 0).unwrap());
        assert!(to > Utc.with_ymd_and_hms(2026, 4, 15, 14, 59, 59).unwrap());

        assert_eq!(local_date_range(None, None, tz), (None, None));
    }
}
