//! Convert between [chrono::DateTime] and GPS seconds.
//!
//! GPS time counts SI seconds since 1980-01-06 00:00:00 UTC and does not
//! observe leap seconds, so it runs ahead of UTC by the number of leap
//! seconds inserted since that epoch.

use chrono::{DateTime, TimeZone, Utc};

/// Unix time of the GPS epoch, 1980-01-06 00:00:00 UTC.
pub const GPS_EPOCH_UNIX: i64 = 315_964_800;

/// Unix times at which the GPS-UTC offset increased by one second.
const LEAP_SECONDS_UNIX: &[i64] = &[
    362_793_600,   // 1981-07-01
    394_329_600,   // 1982-07-01
    425_865_600,   // 1983-07-01
    489_024_000,   // 1985-07-01
    567_993_600,   // 1988-01-01
    631_152_000,   // 1990-01-01
    662_688_000,   // 1991-01-01
    709_948_800,   // 1992-07-01
    741_484_800,   // 1993-07-01
    773_020_800,   // 1994-07-01
    820_454_400,   // 1996-01-01
    867_715_200,   // 1997-07-01
    915_148_800,   // 1999-01-01
    1_136_073_600, // 2006-01-01
    1_230_768_000, // 2009-01-01
    1_341_100_800, // 2012-07-01
    1_435_708_800, // 2015-07-01
    1_483_228_800, // 2017-01-01
];

/// Leap seconds between the GPS epoch and the given Unix time.
pub fn leap_seconds_at_unix(unix: i64) -> i64 {
    LEAP_SECONDS_UNIX.iter().filter(|t| **t <= unix).count() as i64
}

/// Whole GPS seconds of a datetime in any timezone.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use gps_time_conversion::datetime_to_gps;
///
/// let dt = Utc.with_ymd_and_hms(2011, 9, 14, 1, 46, 25).unwrap();
/// assert_eq!(datetime_to_gps(&dt), 1_000_000_000);
/// ```
pub fn datetime_to_gps<TZ>(dt: &DateTime<TZ>) -> i64
where
    TZ: TimeZone,
{
    let unix = dt.timestamp();
    unix - GPS_EPOCH_UNIX + leap_seconds_at_unix(unix)
}

/// The UTC datetime of a GPS time, or `None` when out of chrono's range.
pub fn gps_to_datetime(gps: i64) -> Option<DateTime<Utc>> {
    let leaps = LEAP_SECONDS_UNIX
        .iter()
        .enumerate()
        .filter(|(i, t)| **t - GPS_EPOCH_UNIX + (*i as i64 + 1) <= gps)
        .count() as i64;
    Utc.timestamp_opt(gps + GPS_EPOCH_UNIX - leaps, 0).single()
}

/// The current GPS time in whole seconds.
pub fn gps_now() -> i64 {
    datetime_to_gps(&Utc::now())
}

#[test]
fn test_epoch() {
    let epoch = Utc.with_ymd_and_hms(1980, 1, 6, 0, 0, 0).unwrap();
    assert_eq!(datetime_to_gps(&epoch), 0);
    assert_eq!(gps_to_datetime(0), Some(epoch));
}

#[test]
fn test_leap_boundary() {
    // 2017-01-01 00:00:00 UTC is the first second with an offset of 18.
    let after = Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap();
    let before = Utc.with_ymd_and_hms(2016, 12, 31, 23, 59, 59).unwrap();
    assert_eq!(datetime_to_gps(&after), 1_167_264_018);
    assert_eq!(datetime_to_gps(&before), 1_167_264_016);
    assert_eq!(gps_to_datetime(1_167_264_018), Some(after));
    assert_eq!(gps_to_datetime(1_167_264_016), Some(before));
}
