//! Daylight-saving calendars and session table selection
//!
//! Transitions are evaluated on calendar dates: a region switches at midnight
//! of its transition date, not at the legal 01:00/02:00 local changeover.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use fxsession_api::{DstRegion, DstStatus, TableVariant};

/// Number of days in a month, `None` for an invalid year/month
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}

/// The `n`th (1-based) `weekday` of a month
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

/// The last `weekday` of a month
pub fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)?)?;
    let back = (last.weekday().num_days_from_sunday() + 7 - weekday.num_days_from_sunday()) % 7;
    last.checked_sub_days(Days::new(u64::from(back)))
}

fn within(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    matches!((start, end), (Some(start), Some(end)) if date >= start && date < end)
}

/// Whether a region observes summer time on `date`
pub fn is_region_active(region: DstRegion, date: NaiveDate) -> bool {
    let year = date.year();
    match region {
        // 2nd Sunday of March until 1st Sunday of November
        DstRegion::Us => within(
            date,
            nth_weekday_of_month(year, 3, Weekday::Sun, 2),
            nth_weekday_of_month(year, 11, Weekday::Sun, 1),
        ),
        // Last Sunday of March until last Sunday of October
        DstRegion::Europe => within(
            date,
            last_weekday_of_month(year, 3, Weekday::Sun),
            last_weekday_of_month(year, 10, Weekday::Sun),
        ),
        // Southern hemisphere: 1st Sunday of October until 1st Sunday of
        // April of the following year
        DstRegion::Australia => match date.month() {
            10..=12 => nth_weekday_of_month(year, 10, Weekday::Sun, 1).is_some_and(|start| date >= start),
            1..=4 => nth_weekday_of_month(year, 4, Weekday::Sun, 1).is_some_and(|end| date < end),
            _ => false,
        },
    }
}

/// Session tables follow the northern-hemisphere centres: the daylight table
/// applies only while both the US and Europe are on summer time.
pub fn is_global_dst_active(date: NaiveDate) -> bool {
    is_region_active(DstRegion::Us, date) && is_region_active(DstRegion::Europe, date)
}

pub fn dst_status(date: NaiveDate) -> DstStatus {
    let us = is_region_active(DstRegion::Us, date);
    let europe = is_region_active(DstRegion::Europe, date);
    DstStatus {
        us,
        europe,
        australia: is_region_active(DstRegion::Australia, date),
        global: us && europe,
    }
}

/// Pick the effective session table.
///
/// A manual override wins; otherwise the DST calendar decides when
/// auto-detection is on, and the standard table applies when it is off.
pub fn select_table_variant(date: NaiveDate, manual_override: Option<bool>, auto_detect: bool) -> TableVariant {
    match manual_override {
        Some(daylight) => TableVariant::from_dst(daylight),
        None if auto_detect => TableVariant::from_dst(is_global_dst_active(date)),
        None => TableVariant::Standard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Asserts `start` is the first active day and `end` the first inactive one
    fn assert_transition(region: DstRegion, start: NaiveDate, end: NaiveDate) {
        assert!(!is_region_active(region, start.pred_opt().unwrap()), "{region} day before {start}");
        assert!(is_region_active(region, start), "{region} on {start}");
        assert!(is_region_active(region, end.pred_opt().unwrap()), "{region} day before {end}");
        assert!(!is_region_active(region, end), "{region} on {end}");
    }

    #[test]
    fn calendar_helpers() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2025, 2), Some(28));
        assert_eq!(days_in_month(2025, 12), Some(31));
        assert_eq!(days_in_month(2025, 13), None);

        assert_eq!(nth_weekday_of_month(2025, 3, Weekday::Sun, 2), Some(d(2025, 3, 9)));
        assert_eq!(nth_weekday_of_month(2025, 2, Weekday::Sun, 5), None);
        assert_eq!(last_weekday_of_month(2025, 3, Weekday::Sun), Some(d(2025, 3, 30)));
        // Month ending on the requested weekday
        assert_eq!(last_weekday_of_month(2025, 8, Weekday::Sun), Some(d(2025, 8, 31)));
    }

    #[test]
    fn us_transitions() {
        assert_transition(DstRegion::Us, d(2024, 3, 10), d(2024, 11, 3));
        assert_transition(DstRegion::Us, d(2025, 3, 9), d(2025, 11, 2));
        assert_transition(DstRegion::Us, d(2026, 3, 8), d(2026, 11, 1));
    }

    #[test]
    fn europe_transitions() {
        assert_transition(DstRegion::Europe, d(2024, 3, 31), d(2024, 10, 27));
        assert_transition(DstRegion::Europe, d(2025, 3, 30), d(2025, 10, 26));
        assert_transition(DstRegion::Europe, d(2026, 3, 29), d(2026, 10, 25));
    }

    #[test]
    fn australia_transitions() {
        for (end, start) in [
            (d(2024, 4, 7), d(2024, 10, 6)),
            (d(2025, 4, 6), d(2025, 10, 5)),
            (d(2026, 4, 5), d(2026, 10, 4)),
        ] {
            assert!(is_region_active(DstRegion::Australia, end.pred_opt().unwrap()));
            assert!(!is_region_active(DstRegion::Australia, end));
            assert!(!is_region_active(DstRegion::Australia, start.pred_opt().unwrap()));
            assert!(is_region_active(DstRegion::Australia, start));
        }

        // Wraps the calendar year
        assert!(is_region_active(DstRegion::Australia, d(2025, 12, 31)));
        assert!(is_region_active(DstRegion::Australia, d(2026, 1, 1)));
        assert!(!is_region_active(DstRegion::Australia, d(2025, 7, 1)));
    }

    #[test]
    fn global_dst_ignores_australia() {
        let status = dst_status(d(2025, 12, 5));
        assert!(!status.global);
        assert!(status.australia);
        assert!(!status.us && !status.europe);

        // Between the US and Europe spring transitions only the US is on DST
        let status = dst_status(d(2025, 3, 20));
        assert!(status.us);
        assert!(!status.europe);
        assert!(!status.global);

        assert!(is_global_dst_active(d(2025, 7, 1)));
    }

    #[test]
    fn table_selection() {
        let summer = d(2025, 7, 1);
        let winter = d(2025, 1, 15);

        assert_eq!(select_table_variant(summer, None, true), TableVariant::Daylight);
        assert_eq!(select_table_variant(winter, None, true), TableVariant::Standard);
        assert_eq!(select_table_variant(summer, None, false), TableVariant::Standard);
        assert_eq!(select_table_variant(winter, Some(true), true), TableVariant::Daylight);
        assert_eq!(select_table_variant(summer, Some(false), true), TableVariant::Standard);
        assert_eq!(select_table_variant(winter, Some(true), false), TableVariant::Daylight);
    }
}
