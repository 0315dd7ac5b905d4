//! Cache key layout.
//!
//! ```text
//! stats:daily:{category}:{yyyy-MM-dd}
//! stats:weekly:{category}:{yyyy-ww}     (ISO week-based year and week)
//! stats:monthly:{category}:{yyyy-MM}
//! stats:total:{category}
//! top_records_{category}
//! top_records_prev_{category}
//! ```
//!
//! `{category}` is the wire string (`did`, `ate`, `went`).

use chrono::{Datelike, NaiveDate};

use crate::types::{Category, Period};

pub const DAILY_PREFIX: &str = "stats:daily:";
pub const WEEKLY_PREFIX: &str = "stats:weekly:";
pub const MONTHLY_PREFIX: &str = "stats:monthly:";
pub const TOTAL_PREFIX: &str = "stats:total:";
pub const TOP_RECORDS_PREFIX: &str = "top_records_";
pub const PREVIOUS_TOP_RECORDS_PREFIX: &str = "top_records_prev_";

pub fn daily(category: Category, date: NaiveDate) -> String {
    format!("{DAILY_PREFIX}{category}:{}", date.format("%Y-%m-%d"))
}

pub fn weekly(category: Category, date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{WEEKLY_PREFIX}{category}:{:04}-{:02}", week.year(), week.week())
}

pub fn monthly(category: Category, date: NaiveDate) -> String {
    format!("{MONTHLY_PREFIX}{category}:{}", date.format("%Y-%m"))
}

pub fn total(category: Category) -> String {
    format!("{TOTAL_PREFIX}{category}")
}

/// Leaderboard baseline key.
pub fn top_records(category: Category) -> String {
    format!("{TOP_RECORDS_PREFIX}{category}")
}

/// Ranking that preceded the current baseline.
pub fn previous_top_records(category: Category) -> String {
    format!("{PREVIOUS_TOP_RECORDS_PREFIX}{category}")
}

/// Counter key for `period` as of `today`.
pub fn for_period(category: Category, period: Period, today: NaiveDate) -> String {
    match period {
        Period::Daily => daily(category, today),
        Period::Weekly => weekly(category, today),
        Period::Monthly => monthly(category, today),
        Period::Total => total(category),
    }
}

/// Every counter key a record dated `date` contributes to.
pub fn counters_for(category: Category, date: NaiveDate) -> [String; 4] {
    [
        daily(category, date),
        weekly(category, date),
        monthly(category, date),
        total(category),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn keys_follow_layout() {
        let d = date(2025, 3, 7);

        assert_eq!(daily(Category::Do, d), "stats:daily:did:2025-03-07");
        assert_eq!(weekly(Category::Eat, d), "stats:weekly:ate:2025-10");
        assert_eq!(monthly(Category::Go, d), "stats:monthly:went:2025-03");
        assert_eq!(total(Category::Do), "stats:total:did");
        assert_eq!(top_records(Category::Eat), "top_records_ate");
        assert_eq!(previous_top_records(Category::Eat), "top_records_prev_ate");
    }

    #[test]
    fn weekly_key_uses_iso_week_year() {
        // 2024-12-30 is Monday of ISO week 1 of 2025
        assert_eq!(weekly(Category::Do, date(2024, 12, 30)), "stats:weekly:did:2025-01");
        // 2027-01-01 is still in ISO week 53 of 2026
        assert_eq!(weekly(Category::Do, date(2027, 1, 1)), "stats:weekly:did:2026-53");
    }

    #[test]
    fn for_period_selects_matching_key() {
        let today = date(2025, 1, 15);

        assert_eq!(for_period(Category::Do, Period::Daily, today), daily(Category::Do, today));
        assert_eq!(for_period(Category::Do, Period::Weekly, today), weekly(Category::Do, today));
        assert_eq!(for_period(Category::Do, Period::Monthly, today), monthly(Category::Do, today));
        assert_eq!(for_period(Category::Do, Period::Total, today), total(Category::Do));
    }
}
