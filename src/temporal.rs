//! Same-day publication filter.
//!
//! Feeds fill the structured date fields inconsistently, so the publication
//! instant is looked up in two tiers: the parsed `published`/`updated` values
//! first, then the raw date strings through a lenient parser.

use crate::models::RawEntry;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Accepts entries published on `today` in `tz`.
///
/// `today` is injected rather than read from the clock, so the filter is a
/// pure function of its inputs.
#[derive(Debug, Clone, Copy)]
pub struct TemporalFilter {
    tz: Tz,
    today: NaiveDate,
}

impl TemporalFilter {
    pub fn new(tz: Tz, today: NaiveDate) -> Self {
        Self { tz, today }
    }

    /// Build a filter for the current date in `tz`.
    pub fn for_now(tz: Tz) -> Self {
        Self::new(tz, Utc::now().with_timezone(&tz).date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Publication instant of an entry in local time, if any can be found.
    pub fn local_instant(&self, entry: &RawEntry) -> Option<DateTime<Tz>> {
        entry
            .published
            .or(entry.updated)
            .or_else(|| entry.published_raw.as_deref().and_then(parse_date_lenient))
            .or_else(|| entry.updated_raw.as_deref().and_then(parse_date_lenient))
            .map(|dt| dt.with_timezone(&self.tz))
    }

    /// True iff the entry's local publication date is today. Entries with no
    /// usable timestamp are rejected.
    pub fn accepts(&self, entry: &RawEntry) -> bool {
        self.local_instant(entry)
            .is_some_and(|dt| dt.date_naive() == self.today)
    }
}

/// Naive layouts tried after the zone-aware ones. Values are taken as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a feed date string: RFC 2822, then RFC 3339, then a handful of
/// zone-less layouts (trailing `GMT`/`UTC`/`Z` ignored) interpreted as UTC.
pub fn parse_date_lenient(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let bare = s
        .trim_end_matches(" GMT")
        .trim_end_matches(" UTC")
        .trim_end_matches('Z')
        .trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(bare, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Mexico_City;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 9).unwrap()
    }

    fn filter() -> TemporalFilter {
        TemporalFilter::new(Mexico_City, today())
    }

    fn published_local(y: i32, m: u32, d: u32, h: u32, min: u32) -> RawEntry {
        let dt = Mexico_City.with_ymd_and_hms(y, m, d, h, min, 0).unwrap();
        RawEntry {
            published: Some(dt.fixed_offset()),
            ..Default::default()
        }
    }

    #[test]
    fn test_yesterday_late_evening_is_rejected() {
        assert!(!filter().accepts(&published_local(2025, 10, 8, 23, 59)));
    }

    #[test]
    fn test_today_midnight_is_accepted() {
        assert!(filter().accepts(&published_local(2025, 10, 9, 0, 0)));
    }

    #[test]
    fn test_missing_timestamp_is_rejected() {
        assert!(!filter().accepts(&RawEntry::default()));
        let garbage = RawEntry {
            published_raw: Some("jueves".into()),
            ..Default::default()
        };
        assert!(!filter().accepts(&garbage));
    }

    #[test]
    fn test_utc_timestamp_is_compared_in_local_time() {
        // 03:00 UTC on the 9th is still the 8th in Mexico City (UTC-6).
        let entry = RawEntry {
            published: Some(Utc.with_ymd_and_hms(2025, 10, 9, 3, 0, 0).unwrap().fixed_offset()),
            ..Default::default()
        };
        assert!(!filter().accepts(&entry));
    }

    #[test]
    fn test_updated_is_used_when_published_missing() {
        let entry = RawEntry {
            updated: Some(Utc.with_ymd_and_hms(2025, 10, 9, 18, 0, 0).unwrap().fixed_offset()),
            ..Default::default()
        };
        assert!(filter().accepts(&entry));
    }

    #[test]
    fn test_raw_string_fallback() {
        let entry = RawEntry {
            published_raw: Some("Thu, 9 Oct 2025 15:00:00 GMT".into()),
            ..Default::default()
        };
        assert!(filter().accepts(&entry));

        let updated_only = RawEntry {
            updated_raw: Some("2025-10-09 16:30:00".into()),
            ..Default::default()
        };
        assert!(filter().accepts(&updated_only));
    }

    #[test]
    fn test_parse_date_lenient_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 10, 9, 15, 0, 0).unwrap();
        assert_eq!(parse_date_lenient("Thu, 09 Oct 2025 15:00:00 +0000").unwrap(), expected);
        assert_eq!(parse_date_lenient("2025-10-09T09:00:00-06:00").unwrap(), expected);
        assert_eq!(parse_date_lenient("09 Oct 2025 15:00:00 UTC").unwrap(), expected);
        assert_eq!(parse_date_lenient("2025-10-09T15:00:00Z").unwrap(), expected);
        assert!(parse_date_lenient("").is_none());
        assert!(parse_date_lenient("ayer").is_none());
    }
}
