use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DateError;

/// A calendar date whose month and day may be unknown.
///
/// The resolved instant is computed once at construction: a missing month or day
/// defaults to the first of the period. Callers that care about the lost precision
/// check [`PartialDate::is_precise`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPartialDate", into = "RawPartialDate")]
pub struct PartialDate {
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
    resolved: NaiveDate,
}

impl PartialDate {
    pub fn new(year: i32, month: Option<u32>, day: Option<u32>) -> Result<Self, DateError> {
        if let Some(month) = month
            && !(1..=12).contains(&month)
        {
            return Err(DateError::MonthOutOfRange(month));
        }
        if let (None, Some(day)) = (month, day) {
            return Err(DateError::DayWithoutMonth { day });
        }

        let (resolved_month, resolved_day) = (month.unwrap_or(1), day.unwrap_or(1));
        let resolved = NaiveDate::from_ymd_opt(year, resolved_month, resolved_day).ok_or(
            DateError::NotACalendarDate {
                year,
                month: resolved_month,
                day: resolved_day,
            },
        )?;

        Ok(Self {
            year,
            month,
            day,
            resolved,
        })
    }

    pub fn is_precise(&self) -> bool {
        self.month.is_some() && self.day.is_some()
    }

    /// The concrete instant this date stands for (first of the period when imprecise).
    pub fn resolve(&self) -> NaiveDate {
        self.resolved
    }
}

impl From<NaiveDate> for PartialDate {
    fn from(date: NaiveDate) -> Self {
        use chrono::Datelike;

        Self {
            year: date.year(),
            month: Some(date.month()),
            day: Some(date.day()),
            resolved: date,
        }
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.month, self.day) {
            (Some(month), Some(day)) => write!(f, "{}-{month:02}-{day:02}", self.year),
            (Some(month), None) => write!(f, "{}-{month:02}", self.year),
            _ => write!(f, "{}", self.year),
        }
    }
}

impl FromStr for PartialDate {
    type Err = DateError;

    /// Accepts `YYYY`, `YYYY-MM` and `YYYY-MM-DD`, with `00` marking an unknown part.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let unparseable = || DateError::Unparseable(value.to_owned());
        let mut parts = value.trim().split('-');

        let year = parts
            .next()
            .filter(|part| part.len() == 4)
            .and_then(|part| part.parse::<i32>().ok())
            .ok_or_else(unparseable)?;
        let mut component = |name_len: usize| -> Result<Option<u32>, DateError> {
            match parts.next() {
                None => Ok(None),
                Some(part) if part.len() == name_len => part
                    .parse::<u32>()
                    .map(|number| (number != 0).then_some(number))
                    .map_err(|_| unparseable()),
                Some(_) => Err(unparseable()),
            }
        };
        let month = component(2)?;
        let day = component(2)?;
        if parts.next().is_some() {
            return Err(unparseable());
        }

        Self::new(year, month, day)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawPartialDate {
    Text(String),
    Parts {
        year: i32,
        #[serde(default)]
        month: Option<u32>,
        #[serde(default)]
        day: Option<u32>,
    },
}

impl TryFrom<RawPartialDate> for PartialDate {
    type Error = DateError;

    fn try_from(raw: RawPartialDate) -> Result<Self, Self::Error> {
        match raw {
            RawPartialDate::Text(text) => text.parse(),
            RawPartialDate::Parts { year, month, day } => Self::new(
                year,
                month.filter(|month| *month != 0),
                day.filter(|day| *day != 0),
            ),
        }
    }
}

impl From<PartialDate> for RawPartialDate {
    fn from(date: PartialDate) -> Self {
        Self::Parts {
            year: date.year,
            month: date.month,
            day: date.day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parts_resolve_to_first_of_period() {
        let year_only = PartialDate::new(1999, None, None).expect("year only");
        assert_eq!(
            year_only.resolve(),
            NaiveDate::from_ymd_opt(1999, 1, 1).expect("date")
        );
        assert!(!year_only.is_precise());

        let year_month = PartialDate::new(1999, Some(7), None).expect("year and month");
        assert_eq!(
            year_month.resolve(),
            NaiveDate::from_ymd_opt(1999, 7, 1).expect("date")
        );
        assert!(!year_month.is_precise());
    }

    #[test]
    fn rejects_day_without_month_and_impossible_dates() {
        assert_eq!(
            PartialDate::new(2001, None, Some(4)),
            Err(DateError::DayWithoutMonth { day: 4 })
        );
        assert_eq!(
            PartialDate::new(2001, Some(13), None),
            Err(DateError::MonthOutOfRange(13))
        );
        assert!(matches!(
            PartialDate::new(2001, Some(2), Some(29)),
            Err(DateError::NotACalendarDate { .. })
        ));
    }

    #[test]
    fn parses_string_form_with_zeroed_unknowns() {
        let date: PartialDate = "2004-03-00".parse().expect("parse");
        assert_eq!(
            date,
            PartialDate::new(2004, Some(3), None).expect("year and month")
        );
        assert_eq!(date.to_string(), "2004-03");

        let date: PartialDate = "2004-00-00".parse().expect("parse");
        assert_eq!(date.to_string(), "2004");

        assert!("04-03-01".parse::<PartialDate>().is_err());
        assert!("2004-3-1".parse::<PartialDate>().is_err());
        assert!("2004-00-05".parse::<PartialDate>().is_err());
    }

    #[test]
    fn deserializes_object_and_string_forms() {
        let from_object: PartialDate =
            serde_json::from_str(r#"{"year": 2010, "month": 0, "day": null}"#).expect("object");
        let from_missing: PartialDate =
            serde_json::from_str(r#"{"year": 2010}"#).expect("object without parts");
        let from_text: PartialDate = serde_json::from_str(r#""2010-00-00""#).expect("text");

        assert_eq!(from_object, from_missing);
        assert_eq!(from_object, from_text);
        assert!(serde_json::from_str::<PartialDate>(r#"{"year": 2010, "day": 3}"#).is_err());
    }
}
