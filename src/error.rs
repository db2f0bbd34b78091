use std::path::PathBuf;

use thiserror::Error;

use crate::people::{PersonId, RelationshipId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("month {0} is out of range")]
    MonthOutOfRange(u32),
    #[error("day {day} is given without a month")]
    DayWithoutMonth { day: u32 },
    #[error("{year}-{month:02}-{day:02} is not a calendar date")]
    NotACalendarDate { year: i32, month: u32, day: u32 },
    #[error("cannot parse partial date {0:?}")]
    Unparseable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: u8,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {what} JSON")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("person {0} appears more than once")]
    DuplicatePerson(PersonId),
    #[error("relationship {0} appears more than once")]
    DuplicateRelationship(RelationshipId),
    #[error("relationship {relationship} points at unknown person {person}")]
    DanglingEndpoint {
        relationship: RelationshipId,
        person: PersonId,
    },
    #[error("relationship {0} links a person to themselves")]
    SelfRelationship(RelationshipId),
    #[error("person {0} dies before being born")]
    DeathBeforeBirth(PersonId),
    #[error("membership of person {person} in {group} ends before it starts")]
    MembershipEndsBeforeStart { person: PersonId, group: String },
    #[error("a status of relationship {0} ends before it starts")]
    StatusEndsBeforeStart(RelationshipId),
    #[error("statuses of relationship {0} overlap in time")]
    OverlappingStatuses(RelationshipId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("unknown filter {0:?}")]
    UnknownFilter(String),
}
