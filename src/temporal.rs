//! Time-relative facts derived from partial dates.
//!
//! Everything here is a pure function of its inputs and a cursor date. Intervals are
//! measured in whole days; months and years are the usual 30 and 365 day approximations.

use chrono::NaiveDate;

use crate::people::{PartialDate, RelationshipStatus, RelationshipStatusType};

const DAYS_PER_MONTH: i64 = 30;
const DAYS_PER_YEAR: i64 = 365;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeDelta {
    pub days: i64,
    pub months: i64,
    pub years: i64,
    /// False when either endpoint lacked a month or day.
    pub is_precise: bool,
}

impl TimeDelta {
    fn from_days(days: i64, is_precise: bool) -> Self {
        Self {
            days,
            months: days / DAYS_PER_MONTH,
            years: days / DAYS_PER_YEAR,
            is_precise,
        }
    }
}

/// Length of `earlier..later` as seen from `at`.
///
/// A missing `later` means the interval is ongoing and runs to `at`; a missing `earlier`
/// starts it at `at`. The end is clamped to `at` and the result is never negative, so an
/// interval that has not started yet has zero length.
pub fn elapsed(
    later: Option<&PartialDate>,
    earlier: Option<&PartialDate>,
    at: NaiveDate,
) -> TimeDelta {
    let end = later.map_or(at, PartialDate::resolve).min(at);
    let start = earlier.map_or(at, PartialDate::resolve);
    let days = end.signed_duration_since(start).num_days().max(0);
    let is_precise = later.is_none_or(PartialDate::is_precise)
        && earlier.is_none_or(PartialDate::is_precise);

    TimeDelta::from_days(days, is_precise)
}

/// Age as of `at`, frozen at `death` once it has happened.
pub fn age_at(birth: &PartialDate, death: Option<&PartialDate>, at: NaiveDate) -> TimeDelta {
    elapsed(death, Some(birth), at)
}

pub fn has_started(date: &PartialDate, at: NaiveDate) -> bool {
    date.resolve() <= at
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentStatus {
    pub status: RelationshipStatusType,
    /// Position in the relationship's newest-first status list.
    pub index: usize,
    pub is_ended: bool,
    pub elapsed: TimeDelta,
}

/// The latest status that has started by `at`; `statuses` must be sorted newest first.
pub fn current_status_as_of(statuses: &[RelationshipStatus], at: NaiveDate) -> Option<CurrentStatus> {
    statuses
        .iter()
        .enumerate()
        .find(|(_, status)| has_started(&status.date_start, at))
        .map(|(index, status)| CurrentStatus {
            status: status.status,
            index,
            is_ended: status.date_end.is_some_and(|end| end.resolve() < at),
            elapsed: elapsed(status.date_end.as_ref(), Some(&status.date_start), at),
        })
}

/// Time the relationship has lasted by `at`, summed over every status that has started.
pub fn relationship_duration(statuses: &[RelationshipStatus], at: NaiveDate) -> TimeDelta {
    let (days, is_precise) = statuses
        .iter()
        .filter(|status| has_started(&status.date_start, at))
        .map(|status| elapsed(status.date_end.as_ref(), Some(&status.date_start), at))
        .fold((0, true), |(days, is_precise), span| {
            (days + span.days, is_precise && span.is_precise)
        });
    TimeDelta::from_days(days, is_precise)
}

/// Sorted, de-duplicated instants at which some relationship changes, plus `today`.
pub fn event_dates<'a>(
    statuses: impl IntoIterator<Item = &'a RelationshipStatus>,
    today: NaiveDate,
) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = statuses
        .into_iter()
        .flat_map(|status| {
            std::iter::once(status.date_start.resolve())
                .chain(status.date_end.map(|end| end.resolve()))
        })
        .filter(|date| *date <= today)
        .chain(std::iter::once(today))
        .collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    fn date(year: i32, month: u32, d: u32) -> PartialDate {
        PartialDate::from(day(year, month, d))
    }

    fn status(
        status: RelationshipStatusType,
        start: PartialDate,
        end: Option<PartialDate>,
    ) -> RelationshipStatus {
        RelationshipStatus {
            status,
            date_start: start,
            date_end: end,
        }
    }

    #[test]
    fn age_of_twenty_year_old() {
        let age = age_at(&date(2000, 1, 1), None, day(2020, 1, 1));
        assert_eq!(age.days, 7305);
        assert_eq!(age.years, 20);
        assert!(age.is_precise);
    }

    #[test]
    fn age_freezes_at_death() {
        let birth = date(1950, 6, 1);
        let death = date(2000, 6, 1);
        let at_death = age_at(&birth, Some(&death), day(2000, 6, 1));
        let later = age_at(&birth, Some(&death), day(2030, 1, 1));
        assert_eq!(at_death, later);
        assert_eq!(later.years, 50);
    }

    #[test]
    fn imprecise_endpoints_are_flagged() {
        let start = PartialDate::new(2010, Some(5), None).expect("partial");
        let delta = elapsed(None, Some(&start), day(2011, 5, 1));
        assert_eq!(delta.days, 365);
        assert!(!delta.is_precise);
    }

    #[test]
    fn future_interval_has_zero_length() {
        let delta = elapsed(None, Some(&date(2030, 1, 1)), day(2020, 1, 1));
        assert_eq!(delta.days, 0);
        assert_eq!(delta.years, 0);
    }

    #[test]
    fn current_status_picks_latest_started() {
        // Newest first, as stored after ingestion.
        let statuses = [
            status(RelationshipStatusType::Married, date(2018, 6, 1), None),
            status(
                RelationshipStatusType::Dating,
                date(2015, 1, 1),
                Some(date(2018, 6, 1)),
            ),
        ];

        assert_eq!(current_status_as_of(&statuses, day(2014, 1, 1)), None);

        let dating = current_status_as_of(&statuses, day(2016, 1, 1)).expect("dating");
        assert_eq!(dating.status, RelationshipStatusType::Dating);
        assert_eq!(dating.index, 1);
        assert!(!dating.is_ended, "end date after the cursor still counts as ongoing");

        let married = current_status_as_of(&statuses, day(2020, 1, 1)).expect("married");
        assert_eq!(married.status, RelationshipStatusType::Married);
        assert!(!married.is_ended);
    }

    #[test]
    fn status_past_its_end_is_ended() {
        let statuses = [status(
            RelationshipStatusType::Rumour,
            date(2012, 1, 1),
            Some(date(2012, 3, 1)),
        )];
        let current = current_status_as_of(&statuses, day(2013, 1, 1)).expect("rumour");
        assert!(current.is_ended);
        assert_eq!(current.elapsed.days, 60);
    }

    #[test]
    fn relationship_duration_spans_all_started_statuses() {
        let statuses = [
            status(RelationshipStatusType::Married, date(2016, 1, 1), None),
            status(RelationshipStatusType::Engaged, date(2015, 1, 1), Some(date(2016, 1, 1))),
            status(RelationshipStatusType::Dating, date(2010, 1, 1), Some(date(2015, 1, 1))),
        ];

        assert_eq!(relationship_duration(&statuses, day(2015, 2, 1)).days, 1826 + 31);
        assert_eq!(relationship_duration(&statuses, day(2009, 1, 1)).days, 0);

        let mut vague = statuses.to_vec();
        vague[2].date_start = PartialDate::new(2010, None, None).expect("year only");
        assert!(!relationship_duration(&vague, day(2015, 2, 1)).is_precise);
    }

    #[test]
    fn event_dates_are_sorted_unique_and_capped_at_today() {
        let statuses = [
            status(
                RelationshipStatusType::Dating,
                date(2015, 1, 1),
                Some(date(2016, 1, 1)),
            ),
            status(RelationshipStatusType::Sibling, date(2015, 1, 1), None),
            status(RelationshipStatusType::Rumour, date(2040, 1, 1), None),
        ];
        let dates = event_dates(&statuses, day(2020, 5, 5));
        assert_eq!(dates, [day(2015, 1, 1), day(2016, 1, 1), day(2020, 5, 5)]);
    }

    fn partial_date() -> impl Strategy<Value = PartialDate> {
        (1900i32..2100, proptest::option::of((1u32..=12, proptest::option::of(1u32..=28))))
            .prop_map(|(year, month_day)| {
                let (month, day) = month_day.map_or((None, None), |(m, d)| (Some(m), d));
                PartialDate::new(year, month, day).expect("generated date is valid")
            })
    }

    fn cursor() -> impl Strategy<Value = NaiveDate> {
        (1900i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| day(y, m, d))
    }

    proptest! {
        #[test]
        fn open_interval_runs_to_cursor(start in partial_date(), at in cursor()) {
            let open = elapsed(None, Some(&start), at);
            let closed = elapsed(Some(&PartialDate::from(at)), Some(&start), at);
            prop_assert_eq!(open.days, closed.days);
        }

        #[test]
        fn age_never_decreases(
            birth in partial_date(),
            death in proptest::option::of(partial_date()),
            a in cursor(),
            b in cursor(),
        ) {
            let death = death.filter(|death| death.resolve() >= birth.resolve());
            let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
            let first = age_at(&birth, death.as_ref(), earlier);
            let second = age_at(&birth, death.as_ref(), later);
            prop_assert!(first.days <= second.days);

            if let Some(death) = death.filter(|death| death.resolve() <= earlier) {
                prop_assert_eq!(first.days, second.days);
                prop_assert_eq!(
                    first.days,
                    death.resolve().signed_duration_since(birth.resolve()).num_days()
                );
            }
        }
    }
}
