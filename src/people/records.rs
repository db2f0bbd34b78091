use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::UnknownCode;

use super::PartialDate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub u64);

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Declares a closed enum stored on the wire as its numeric code.
macro_rules! coded_enum {
    ($name:ident, $kind:literal, { $($variant:ident = $code:literal),+ $(,)? }) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &[Self] = &[$(Self::$variant),+];
        }

        impl TryFrom<u8> for $name {
            type Error = UnknownCode;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(UnknownCode { kind: $kind, code }),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => $code),+
                }
            }
        }
    };
}

coded_enum!(Gender, "gender", {
    Male = 1,
    Female = 2,
    Other = 3,
});

coded_enum!(GroupCategory, "group category", {
    ElementarySchool = 1,
    HighSchool = 2,
    University = 3,
    Seminar = 4,
    Other = 5,
});

coded_enum!(RelationshipStatusType, "relationship status", {
    BloodRelative = 1,
    Sibling = 2,
    ParentChild = 3,
    Married = 4,
    Engaged = 5,
    Dating = 6,
    Rumour = 7,
});

/// Coarse grouping of status types used by the relationship filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationshipCategory {
    Serious,
    Rumour,
    BloodBound,
}

impl RelationshipCategory {
    pub const ALL: [Self; 3] = [Self::Serious, Self::Rumour, Self::BloodBound];

    pub fn label(self) -> &'static str {
        match self {
            Self::Serious => "serious",
            Self::Rumour => "rumour",
            Self::BloodBound => "blood-bound",
        }
    }
}

impl RelationshipStatusType {
    pub fn label(self) -> &'static str {
        match self {
            Self::BloodRelative => "Blood relatives",
            Self::Sibling => "Siblings",
            Self::ParentChild => "Parent-child",
            Self::Married => "Married",
            Self::Engaged => "Engaged",
            Self::Dating => "Dating",
            Self::Rumour => "Rumour",
        }
    }

    pub fn category(self) -> RelationshipCategory {
        match self {
            Self::BloodRelative | Self::Sibling | Self::ParentChild => {
                RelationshipCategory::BloodBound
            }
            Self::Married | Self::Engaged | Self::Dating => RelationshipCategory::Serious,
            Self::Rumour => RelationshipCategory::Rumour,
        }
    }
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

impl GroupCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::ElementarySchool => "Elementary school",
            Self::HighSchool => "High school",
            Self::University => "University",
            Self::Seminar => "Seminar",
            Self::Other => "Other",
        }
    }

    pub fn is_school(self) -> bool {
        matches!(
            self,
            Self::ElementarySchool | Self::HighSchool | Self::University
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub group_name: String,
    pub group_category: GroupCategory,
    pub date_started: PartialDate,
    #[serde(default)]
    pub date_ended: Option<PartialDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub maiden_name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    pub gender: Gender,
    pub birth_date: PartialDate,
    #[serde(default)]
    pub death_date: Option<PartialDate>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Nickname when one is set, otherwise "first last".
    pub fn label(&self) -> String {
        match self.nickname.as_deref().map(str::trim) {
            Some(nickname) if !nickname.is_empty() => nickname.to_owned(),
            _ => self.full_name(),
        }
    }

    pub fn seminar_memberships(&self) -> impl Iterator<Item = &Membership> {
        self.memberships
            .iter()
            .filter(|membership| membership.group_category == GroupCategory::Seminar)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipStatus {
    pub status: RelationshipStatusType,
    pub date_start: PartialDate,
    #[serde(default)]
    pub date_end: Option<PartialDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: RelationshipId,
    pub source: PersonId,
    pub target: PersonId,
    /// Newest first once the dataset has been validated.
    #[serde(default)]
    pub statuses: Vec<RelationshipStatus>,
}

impl Relationship {
    pub fn connects(&self, a: PersonId, b: PersonId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    pub fn other_end(&self, id: PersonId) -> Option<PersonId> {
        if self.source == id {
            Some(self.target)
        } else if self.target == id {
            Some(self.source)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_closed_enums() {
        let status: RelationshipStatusType = serde_json::from_str("7").expect("status");
        assert_eq!(status, RelationshipStatusType::Rumour);
        assert_eq!(status.category(), RelationshipCategory::Rumour);
        assert_eq!(u8::from(GroupCategory::Seminar), 4);
        assert!(serde_json::from_str::<Gender>("9").is_err());
        assert_eq!(RelationshipStatusType::ALL.len(), 7);
    }

    #[test]
    fn label_prefers_nickname() {
        let mut person: Person = serde_json::from_str(
            r#"{
                "id": 3,
                "firstName": "Jana",
                "lastName": "Kováčová",
                "nickname": "",
                "gender": 2,
                "birthDate": "1995-04-12"
            }"#,
        )
        .expect("person");
        assert_eq!(person.label(), "Jana Kováčová");
        assert!(person.memberships.is_empty());

        person.nickname = Some("Janka".to_owned());
        assert_eq!(person.label(), "Janka");
    }

    #[test]
    fn relationship_endpoints_are_unordered() {
        let relationship = Relationship {
            id: RelationshipId(1),
            source: PersonId(4),
            target: PersonId(9),
            statuses: Vec::new(),
        };
        assert!(relationship.connects(PersonId(9), PersonId(4)));
        assert_eq!(relationship.other_end(PersonId(9)), Some(PersonId(4)));
        assert_eq!(relationship.other_end(PersonId(5)), None);
    }
}
