//! Capture timestamps.
//!
//! Stored as microseconds since `2000-01-01 00:00:00` (no time zone), which
//! is how the host database persists its timestamp type. The binary slot uses
//! `i64::MIN` for "no value".

use serde::{Serialize, Serializer};
use std::fmt;

const USECS_PER_SEC: i64 = 1_000_000;
const SECS_PER_DAY: i64 = 86_400;
/// Days from 1970-01-01 to 2000-01-01.
const EPOCH_OFFSET_DAYS: i64 = 10_957;

/// Binary slot value meaning "no timestamp".
pub const NO_TIMESTAMP: i64 = i64::MIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_micros(micros: i64) -> Option<Self> {
        (micros != NO_TIMESTAMP).then_some(Self(micros))
    }

    pub fn micros(self) -> i64 {
        self.0
    }

    /// Build from calendar fields, rejecting out-of-range values.
    pub fn from_civil(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        if !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return None;
        }
        let days = days_from_civil(year, month, day) - EPOCH_OFFSET_DAYS;
        let secs = days * SECS_PER_DAY + (hour * 3600 + minute * 60 + second) as i64;
        Some(Self(secs * USECS_PER_SEC))
    }

    /// Calendar fields `(year, month, day, hour, minute, second)`.
    pub fn to_civil(self) -> (i32, u32, u32, u32, u32, u32) {
        let secs = self.0.div_euclid(USECS_PER_SEC);
        let days = secs.div_euclid(SECS_PER_DAY);
        let rem = secs.rem_euclid(SECS_PER_DAY) as u32;
        let (year, month, day) = civil_from_days(days + EPOCH_OFFSET_DAYS);
        (year, month, day, rem / 3600, rem / 60 % 60, rem % 60)
    }
}

/// Renders `YYYY-MM-DD HH:MM:SS`.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (y, mo, d, h, mi, s) = self.to_civil();
        write!(f, "{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}")
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Textual form of an optional timestamp; absent renders as an empty string.
pub fn format_optional(ts: Option<Timestamp>) -> String {
    ts.map(|t| t.to_string()).unwrap_or_default()
}

fn is_leap(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

// Proleptic Gregorian day counting relative to 1970-01-01 (H. Hinnant's algorithm).
fn days_from_civil(year: i32, month: u32, day: u32) -> i64 {
    let y = i64::from(if month <= 2 { year - 1 } else { year });
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month as i64 + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = (yoe + era * 400 + i64::from(month <= 2)) as i32;
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_zero() {
        assert_eq!(Timestamp::from_civil(2000, 1, 1, 0, 0, 0).unwrap().micros(), 0);
    }

    #[test]
    fn formats_zero_padded() {
        let ts = Timestamp::from_civil(2010, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(ts.to_string(), "2010-05-01 12:30:00");
        assert_eq!(ts.to_civil(), (2010, 5, 1, 12, 30, 0));
    }

    #[test]
    fn dates_before_epoch_roundtrip() {
        let ts = Timestamp::from_civil(1987, 12, 31, 23, 59, 59).unwrap();
        assert!(ts.micros() < 0);
        assert_eq!(ts.to_string(), "1987-12-31 23:59:59");
    }

    #[test]
    fn leap_days() {
        assert!(Timestamp::from_civil(2012, 2, 29, 0, 0, 0).is_some());
        assert!(Timestamp::from_civil(2011, 2, 29, 0, 0, 0).is_none());
        assert!(Timestamp::from_civil(1900, 2, 29, 0, 0, 0).is_none());
        assert!(Timestamp::from_civil(2000, 2, 29, 0, 0, 0).is_some());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(Timestamp::from_civil(2010, 0, 1, 0, 0, 0).is_none());
        assert!(Timestamp::from_civil(2010, 13, 1, 0, 0, 0).is_none());
        assert!(Timestamp::from_civil(2010, 4, 31, 0, 0, 0).is_none());
        assert!(Timestamp::from_civil(2010, 4, 30, 24, 0, 0).is_none());
        assert!(Timestamp::from_civil(2010, 4, 30, 0, 60, 0).is_none());
    }

    #[test]
    fn no_timestamp_slot_is_absent() {
        assert_eq!(Timestamp::from_micros(NO_TIMESTAMP), None);
        assert_eq!(format_optional(None), "");
    }
}
