use chrono::NaiveDate;

/// Whole days from `start` to `end`; negative when `end` comes first.
pub fn days_in_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Closed date interval, either bound optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn days_in_between_counts_calendar_days() {
        assert_eq!(days_in_between(d(2024, 1, 1), d(2024, 1, 1)), 0);
        assert_eq!(days_in_between(d(2024, 2, 28), d(2024, 3, 1)), 2);
        assert_eq!(days_in_between(d(2024, 3, 1), d(2024, 2, 28)), -2);
    }

    #[test]
    fn only_a_range_without_bounds_is_unbounded() {
        assert!(DateRange::default().is_unbounded());
        assert!(!DateRange::new(Some(d(2024, 6, 1)), None).is_unbounded());
        assert!(!DateRange::between(d(2024, 1, 1), d(2024, 1, 31)).is_unbounded());
    }
}
