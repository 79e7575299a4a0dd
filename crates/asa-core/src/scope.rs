//! Time scope parsing and timezone resolution.
//!
//! A scope expression plus an IANA timezone name resolve to one half-open
//! `[start, end)` instant range in UTC. All downstream filtering compares
//! against this range in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono::LocalResult;
use chrono_tz::Tz;
use thiserror::Error;

/// Errors for user-supplied scope input. Both are fatal to the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error(
        "invalid time scope {0:?}: expected \"default\", \"YYYY/MM/DD\", or \"YYYY/MM/DD - YYYY/MM/DD\""
    )]
    InvalidScope(String),

    #[error("invalid timezone {0:?}: not a recognized IANA zone name")]
    InvalidTimezone(String),
}

/// A resolved, timezone-aware analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeScope {
    /// Inclusive start instant.
    pub start: DateTime<Utc>,
    /// Exclusive end instant.
    pub end: DateTime<Utc>,
    /// The zone the scope was expressed in, kept for display.
    pub timezone: Tz,
}

const DATE_FORMAT: &str = "%Y/%m/%d";

/// Step used to roll past spring-forward gaps. Some zones shift by less
/// than an hour, so probe in quarter-hour increments.
const GAP_STEP_MINUTES: i64 = 15;

/// Bounds the gap probe at 48 hours, enough for even date-line changes
/// where a zone skips an entire calendar day.
const MAX_GAP_STEPS: i64 = 48 * 60 / GAP_STEP_MINUTES;

impl TimeScope {
    /// Parse a scope expression in the given IANA zone.
    ///
    /// Accepted grammars:
    /// - `"default"`: the most recently completed Monday-to-Sunday week
    ///   relative to `reference`, never the current partial week
    /// - `"YYYY/MM/DD"`: that whole local day
    /// - `"YYYY/MM/DD - YYYY/MM/DD"`: inclusive of both boundary days
    pub fn parse(
        scope: &str,
        timezone: &str,
        reference: DateTime<Utc>,
    ) -> Result<Self, ScopeError> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| ScopeError::InvalidTimezone(timezone.to_string()))?;

        let (first_day, last_day) = if scope == "default" {
            let today = reference.with_timezone(&tz).date_naive();
            let this_monday =
                today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
            let last_monday = this_monday - Duration::days(7);
            (last_monday, this_monday - Duration::days(1))
        } else if let Some((start_str, end_str)) = scope.split_once(" - ") {
            let first = parse_date(start_str.trim(), scope)?;
            let last = parse_date(end_str.trim(), scope)?;
            if last < first {
                return Err(ScopeError::InvalidScope(scope.to_string()));
            }
            (first, last)
        } else {
            let day = parse_date(scope.trim(), scope)?;
            (day, day)
        };

        Ok(Self {
            start: local_midnight(tz, first_day),
            end: local_midnight(tz, last_day + Duration::days(1)),
            timezone: tz,
        })
    }

    /// Whether an instant falls inside the half-open range.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// The range formatted in the scope's own zone.
    #[must_use]
    pub fn display_range(&self) -> String {
        format!(
            "{} - {} ({})",
            self.start.with_timezone(&self.timezone).format("%Y/%m/%d %H:%M"),
            self.end.with_timezone(&self.timezone).format("%Y/%m/%d %H:%M"),
            self.timezone
        )
    }
}

fn parse_date(value: &str, scope: &str) -> Result<NaiveDate, ScopeError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| ScopeError::InvalidScope(scope.to_string()))
}

/// Local midnight of `date` as a UTC instant.
fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    resolve_local(tz, date.and_time(NaiveTime::MIN))
}

/// Resolve a local wall-clock time to a single UTC instant.
///
/// Ambiguous (fall-back) times resolve to the later candidate; times inside
/// a spring-forward gap roll forward to the first existing wall-clock time.
fn resolve_local(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    let mut probe = local;
    for _ in 0..MAX_GAP_STEPS {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(at) => return at.with_timezone(&Utc),
            LocalResult::Ambiguous(_, later) => return later.with_timezone(&Utc),
            LocalResult::None => probe += Duration::minutes(GAP_STEP_MINUTES),
        }
    }
    // Unreachable with real zone data; fall back to a UTC reading.
    Utc.from_utc_datetime(&local)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn single_day_in_utc() {
        let scope = TimeScope::parse("2026/01/12", "UTC", utc(2026, 2, 1, 0, 0)).unwrap();
        assert_eq!(scope.start, utc(2026, 1, 12, 0, 0));
        assert_eq!(scope.end, utc(2026, 1, 13, 0, 0));
    }

    #[test]
    fn range_includes_both_boundary_days() {
        let scope =
            TimeScope::parse("2026/01/10 - 2026/01/12", "UTC", utc(2026, 2, 1, 0, 0)).unwrap();
        assert_eq!(scope.start, utc(2026, 1, 10, 0, 0));
        assert_eq!(scope.end, utc(2026, 1, 13, 0, 0));
    }

    #[test]
    fn single_day_converts_through_zone() {
        let scope =
            TimeScope::parse("2026/01/05", "America/New_York", utc(2026, 2, 1, 0, 0)).unwrap();
        // EST midnight is 05:00 UTC.
        assert_eq!(scope.start, utc(2026, 1, 5, 5, 0));
        assert_eq!(scope.end, utc(2026, 1, 6, 5, 0));
    }

    #[test]
    fn default_resolves_to_last_completed_week() {
        // 2026-01-14 is a Wednesday; the last completed week is Mon Jan 5
        // through Sun Jan 11.
        let scope = TimeScope::parse("default", "UTC", utc(2026, 1, 14, 15, 0)).unwrap();
        assert_eq!(scope.start, utc(2026, 1, 5, 0, 0));
        assert_eq!(scope.end, utc(2026, 1, 12, 0, 0));
    }

    #[test]
    fn default_on_a_monday_excludes_the_new_week() {
        // Monday morning still reports on the week that just ended.
        let scope = TimeScope::parse("default", "UTC", utc(2026, 1, 12, 9, 0)).unwrap();
        assert_eq!(scope.start, utc(2026, 1, 5, 0, 0));
        assert_eq!(scope.end, utc(2026, 1, 12, 0, 0));
    }

    #[test]
    fn ambiguous_local_time_picks_later_instant() {
        // US fall-back 2025-11-02: 01:30 EDT and 01:30 EST both exist.
        let tz: Tz = "America/New_York".parse().unwrap();
        let local = NaiveDate::from_ymd_opt(2025, 11, 2)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        // Later candidate is EST (UTC-5).
        assert_eq!(resolve_local(tz, local), utc(2025, 11, 2, 6, 30));
    }

    #[test]
    fn gap_local_time_rolls_forward() {
        // US spring-forward 2026-03-08: 02:30 does not exist; first
        // existing wall-clock time is 03:00 EDT.
        let tz: Tz = "America/New_York".parse().unwrap();
        let local = NaiveDate::from_ymd_opt(2026, 3, 8)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(resolve_local(tz, local), utc(2026, 3, 8, 7, 0));
    }

    #[test]
    fn skipped_midnight_rolls_forward() {
        // Brazil's 2018 DST start skipped midnight: Sao Paulo clocks jumped
        // from 2018-11-04 00:00 straight to 01:00.
        let scope =
            TimeScope::parse("2018/11/04", "America/Sao_Paulo", utc(2019, 1, 1, 0, 0)).unwrap();
        // 01:00 BRST (UTC-2) == 03:00 UTC.
        assert_eq!(scope.start, utc(2018, 11, 4, 3, 0));
    }

    #[test]
    fn rejects_unknown_grammar() {
        for bad in ["last-week", "01/05/2026", "2026-01-05", "2026/13/01", ""] {
            assert_eq!(
                TimeScope::parse(bad, "UTC", utc(2026, 1, 1, 0, 0)),
                Err(ScopeError::InvalidScope(bad.to_string())),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn rejects_reversed_range() {
        assert_eq!(
            TimeScope::parse("2026/01/12 - 2026/01/10", "UTC", utc(2026, 2, 1, 0, 0)),
            Err(ScopeError::InvalidScope("2026/01/12 - 2026/01/10".to_string()))
        );
    }

    #[test]
    fn rejects_unknown_timezone() {
        assert_eq!(
            TimeScope::parse("2026/01/12", "Mars/Olympus_Mons", utc(2026, 2, 1, 0, 0)),
            Err(ScopeError::InvalidTimezone("Mars/Olympus_Mons".to_string()))
        );
    }

    #[test]
    fn contains_is_half_open() {
        let scope = TimeScope::parse("2026/01/12", "UTC", utc(2026, 2, 1, 0, 0)).unwrap();
        assert!(scope.contains(scope.start));
        assert!(scope.contains(scope.end - Duration::seconds(1)));
        assert!(!scope.contains(scope.end));
    }

    #[test]
    fn display_range_uses_scope_zone() {
        let scope =
            TimeScope::parse("2026/01/05", "America/New_York", utc(2026, 2, 1, 0, 0)).unwrap();
        assert_eq!(
            scope.display_range(),
            "2026/01/05 00:00 - 2026/01/06 00:00 (America/New_York)"
        );
    }
}
