use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;

use crate::temporal::TimeDelta;

/// Two values in `-1.0..=1.0` derived from a hash of `id`, stable across runs.
pub fn stable_pair(id: &impl Hash) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%-d. %-m. %Y").to_string()
}

/// "3 years", "5 months" or "12 days", prefixed with "~" when imprecise.
pub fn format_span(delta: &TimeDelta) -> String {
    let (value, unit) = if delta.years > 0 {
        (delta.years, "year")
    } else if delta.months > 0 {
        (delta.months, "month")
    } else {
        (delta.days, "day")
    };
    let plural = if value == 1 { "" } else { "s" };
    let approx = if delta.is_precise { "" } else { "~" };
    format!("{approx}{value} {unit}{plural}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair(&"Ďurica");
        assert_eq!(first, stable_pair(&"Ďurica"));
        assert!((-1.0..=1.0).contains(&first.0) && (-1.0..=1.0).contains(&first.1));
    }

    #[test]
    fn spans_use_the_largest_whole_unit() {
        let span = |days: i64, is_precise: bool| TimeDelta {
            days,
            months: days / 30,
            years: days / 365,
            is_precise,
        };
        assert_eq!(format_span(&span(800, true)), "2 years");
        assert_eq!(format_span(&span(31, true)), "1 month");
        assert_eq!(format_span(&span(3, false)), "~3 days");
    }

    #[test]
    fn dates_are_day_first() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 7).expect("date");
        assert_eq!(format_date(date), "7. 3. 2021");
    }
}
