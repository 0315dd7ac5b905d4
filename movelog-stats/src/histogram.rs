//! Pure aggregation over joined records: date buckets, streaks, averages
//! and the calendar windows periods cover.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::types::{KeywordRecord, Period};

/// Per-date record counts, ordered by date.
pub type DailyHistogram = BTreeMap<NaiveDate, u64>;

/// Bucket records by their calendar date in the store's zone (UTC).
pub fn daily_counts<'a>(records: impl IntoIterator<Item = &'a KeywordRecord>) -> DailyHistogram {
    let mut histogram = DailyHistogram::new();
    for record in records {
        *histogram.entry(record.date()).or_insert(0) += 1;
    }
    histogram
}

/// Bucket records by their calendar date in `zone`.
///
/// Each timestamp is shifted into `zone` before its date is taken, so a
/// record late in the UTC day may land on the following local date.
pub fn daily_counts_in_zone<'a>(
    records: impl IntoIterator<Item = &'a KeywordRecord>,
    zone: FixedOffset,
) -> DailyHistogram {
    let mut histogram = DailyHistogram::new();
    for record in records {
        let local = record.timestamp.with_timezone(&zone).date_naive();
        *histogram.entry(local).or_insert(0) += 1;
    }
    histogram
}

/// Longest run of calendar-consecutive dates. Input order and duplicates
/// do not matter; returns 0 for no dates.
pub fn longest_streak(dates: impl IntoIterator<Item = NaiveDate>) -> u32 {
    let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
    dates.sort_unstable();
    dates.dedup();

    let Some(first) = dates.first().copied() else {
        return 0;
    };

    let mut max_streak = 1;
    let mut current_streak = 1;
    let mut previous = first;
    for date in dates.into_iter().skip(1) {
        if previous.succ_opt() == Some(date) {
            current_streak += 1;
            max_streak = max_streak.max(current_streak);
        } else {
            current_streak = 1;
        }
        previous = date;
    }
    max_streak
}

/// `numerator / denominator` rounded half-up to two decimals; 0.0 when the
/// denominator is zero.
pub fn ratio_half_up(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    // hundredths, rounded half-up in integer space
    let hundredths = (numerator * 200 + denominator) / (2 * denominator);
    hundredths as f64 / 100.0
}

/// Mean records per active day, two decimals half-up.
pub fn average_per_day(histogram: &DailyHistogram) -> f64 {
    let total: u64 = histogram.values().sum();
    ratio_half_up(total, histogram.len() as u64)
}

/// Largest single-day count, or 0.
pub fn max_per_day(histogram: &DailyHistogram) -> u64 {
    histogram.values().copied().max().unwrap_or(0)
}

/// Half-open date range `[start, end)` covered by a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The window `period` covers as of `today`; `None` for all time.
    pub fn for_period(period: Period, today: NaiveDate) -> Option<Self> {
        match period {
            Period::Daily => Some(Self::day(today)),
            Period::Weekly => {
                let offset = u64::from(today.weekday().num_days_from_monday());
                let start = today - Days::new(offset);
                Some(Self {
                    start,
                    end: start + Days::new(7),
                })
            }
            Period::Monthly => Some(Self::month(today.with_day(1).unwrap_or(today))),
            Period::Total => None,
        }
    }

    /// The single day `date`.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date + Days::new(1),
        }
    }

    /// The calendar month starting at `first` (which must be the 1st).
    pub fn month(first: NaiveDate) -> Self {
        Self {
            start: first,
            end: first + Months::new(1),
        }
    }

    /// Every date in the window, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|d| *d < self.end)
    }

    /// Window bounds as UTC instants, start inclusive and end exclusive.
    pub fn utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (utc_midnight(self.start), utc_midnight(self.end))
    }

    /// Window bounds for dates read in `zone`, as UTC instants.
    pub fn bounds_in(&self, zone: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let shift = chrono::Duration::seconds(i64::from(zone.local_minus_utc()));
        (
            utc_midnight(self.start) - shift,
            utc_midnight(self.end) - shift,
        )
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Parse a `yyyy-MM` month into its first day.
///
/// Surrounding whitespace and stray characters other than digits and `-`
/// are dropped before parsing.
pub fn parse_month(month: &str) -> Result<NaiveDate> {
    let cleaned: String = month
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();

    let invalid = || Error::InvalidArgument(format!("month must be yyyy-MM: {month:?}"));
    let (year, month_num) = cleaned.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month_num.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month_num: u32 = month_num.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month_num, 1).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, KeywordId, RecordId};
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record_at(ts: DateTime<Utc>) -> KeywordRecord {
        KeywordRecord {
            record_id: RecordId(1),
            keyword_id: KeywordId(1),
            noun: "running".into(),
            category: Category::Do,
            timestamp: ts,
        }
    }

    #[test]
    fn streak_of_empty_input_is_zero() {
        assert_eq!(longest_streak(Vec::new()), 0);
    }

    #[test]
    fn streak_of_single_date_is_one() {
        assert_eq!(longest_streak([date(2025, 1, 1)]), 1);
    }

    #[test]
    fn streak_ignores_order_and_duplicates() {
        let dates = [
            date(2025, 1, 5),
            date(2025, 1, 2),
            date(2025, 1, 1),
            date(2025, 1, 2),
            date(2025, 1, 3),
        ];

        assert_eq!(longest_streak(dates), 3);
    }

    #[test]
    fn streak_picks_the_longest_run() {
        let dates = [
            date(2025, 1, 1),
            date(2025, 1, 3),
            date(2025, 1, 4),
            date(2025, 1, 5),
            date(2025, 1, 6),
            date(2025, 1, 10),
            date(2025, 1, 11),
        ];

        assert_eq!(longest_streak(dates), 4);
    }

    #[test]
    fn streak_crosses_month_and_year_boundaries() {
        let dates = [date(2024, 12, 31), date(2025, 1, 1), date(2025, 1, 2)];

        assert_eq!(longest_streak(dates), 3);
    }

    #[test]
    fn ratio_rounds_half_up() {
        assert_eq!(ratio_half_up(7, 3), 2.33);
        assert_eq!(ratio_half_up(2, 3), 0.67);
        assert_eq!(ratio_half_up(1, 8), 0.13);
        assert_eq!(ratio_half_up(5, 7), 0.71);
        assert_eq!(ratio_half_up(6, 3), 2.0);
    }

    #[test]
    fn ratio_with_zero_denominator_is_zero() {
        assert_eq!(ratio_half_up(0, 0), 0.0);
        assert_eq!(ratio_half_up(5, 0), 0.0);
    }

    #[test]
    fn daily_counts_bucket_by_utc_date() {
        let records = [
            record_at(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            record_at(Utc.with_ymd_and_hms(2025, 1, 1, 23, 59, 59).unwrap()),
            record_at(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()),
        ];

        let histogram = daily_counts(&records);

        assert_eq!(histogram.get(&date(2025, 1, 1)), Some(&2));
        assert_eq!(histogram.get(&date(2025, 1, 2)), Some(&1));
        assert_eq!(max_per_day(&histogram), 2);
        assert_eq!(average_per_day(&histogram), 1.5);
    }

    #[test]
    fn zone_shift_happens_before_bucketing() {
        let seoul = FixedOffset::east_opt(9 * 3600).unwrap();
        let records = [record_at(Utc.with_ymd_and_hms(2025, 2, 28, 23, 30, 0).unwrap())];

        let histogram = daily_counts_in_zone(&records, seoul);

        assert_eq!(histogram.get(&date(2025, 3, 1)), Some(&1));
        assert!(!histogram.contains_key(&date(2025, 2, 28)));
    }

    #[test]
    fn empty_histogram_has_zero_aggregates() {
        let histogram = DailyHistogram::new();

        assert_eq!(average_per_day(&histogram), 0.0);
        assert_eq!(max_per_day(&histogram), 0);
    }

    #[test]
    fn weekly_window_starts_on_monday() {
        // 2025-01-15 is a Wednesday
        let window = DateWindow::for_period(Period::Weekly, date(2025, 1, 15)).unwrap();

        assert_eq!(window.start, date(2025, 1, 13));
        assert_eq!(window.end, date(2025, 1, 20));
        assert_eq!(window.days().count(), 7);
    }

    #[test]
    fn monthly_window_covers_whole_month() {
        let window = DateWindow::for_period(Period::Monthly, date(2024, 2, 10)).unwrap();

        assert_eq!(window.start, date(2024, 2, 1));
        assert_eq!(window.end, date(2024, 3, 1));
        assert_eq!(window.days().count(), 29);
        assert!(window.contains(date(2024, 2, 29)));
        assert!(!window.contains(date(2024, 3, 1)));
    }

    #[test]
    fn daily_window_is_one_day_and_total_has_none() {
        let window = DateWindow::for_period(Period::Daily, date(2025, 1, 31)).unwrap();
        assert_eq!(window.days().collect::<Vec<_>>(), vec![date(2025, 1, 31)]);

        assert!(DateWindow::for_period(Period::Total, date(2025, 1, 31)).is_none());
    }

    #[test]
    fn utc_bounds_are_midnights() {
        let window = DateWindow::month(date(2025, 12, 1));
        let (start, end) = window.utc_bounds();

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn zone_bounds_start_at_local_midnight() {
        let seoul = FixedOffset::east_opt(9 * 3600).unwrap();
        let (start, end) = DateWindow::day(date(2025, 3, 10)).bounds_in(seoul);

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 9, 15, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap());
    }

    #[test]
    fn parse_month_accepts_padded_input() {
        assert_eq!(parse_month(" 2025-02 ").unwrap(), date(2025, 2, 1));
        assert_eq!(parse_month("2025-02\"").unwrap(), date(2025, 2, 1));
    }

    #[test]
    fn parse_month_rejects_bad_input() {
        for bad in ["", "2025", "2025-13", "25-02", "2025-2", "February"] {
            assert!(
                matches!(parse_month(bad), Err(Error::InvalidArgument(_))),
                "accepted {bad:?}"
            );
        }
    }
}
