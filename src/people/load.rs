use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::LoadError;

use super::{Person, Relationship, RelationshipId, RelationshipStatus};

const PEOPLE_FILE: &str = "people.json";
const RELATIONSHIPS_FILE: &str = "relationships.json";

/// Where the two JSON documents live on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataSource {
    pub people: PathBuf,
    pub relationships: PathBuf,
}

impl DataSource {
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            people: dir.join(PEOPLE_FILE),
            relationships: dir.join(RELATIONSHIPS_FILE),
        }
    }
}

/// People and relationships that passed validation.
#[derive(Clone, Debug)]
pub struct Dataset {
    people: Vec<Person>,
    relationships: Vec<Relationship>,
}

impl Dataset {
    /// Validates the records and sorts every relationship's statuses newest first.
    pub fn new(
        people: Vec<Person>,
        mut relationships: Vec<Relationship>,
    ) -> Result<Self, LoadError> {
        let mut person_ids = HashSet::with_capacity(people.len());
        for person in &people {
            if !person_ids.insert(person.id) {
                return Err(LoadError::DuplicatePerson(person.id));
            }
            validate_person(person)?;
        }

        let mut relationship_ids = HashSet::with_capacity(relationships.len());
        for relationship in &mut relationships {
            if !relationship_ids.insert(relationship.id) {
                return Err(LoadError::DuplicateRelationship(relationship.id));
            }
            for endpoint in [relationship.source, relationship.target] {
                if !person_ids.contains(&endpoint) {
                    return Err(LoadError::DanglingEndpoint {
                        relationship: relationship.id,
                        person: endpoint,
                    });
                }
            }
            if relationship.source == relationship.target {
                return Err(LoadError::SelfRelationship(relationship.id));
            }

            relationship
                .statuses
                .sort_by_key(|status| std::cmp::Reverse(status.date_start.resolve()));
            validate_statuses(relationship.id, &relationship.statuses)?;
        }

        Ok(Self {
            people,
            relationships,
        })
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn into_parts(self) -> (Vec<Person>, Vec<Relationship>) {
        (self.people, self.relationships)
    }
}

fn validate_person(person: &Person) -> Result<(), LoadError> {
    if let Some(death) = &person.death_date
        && death.resolve() < person.birth_date.resolve()
    {
        return Err(LoadError::DeathBeforeBirth(person.id));
    }

    for membership in &person.memberships {
        if let Some(ended) = &membership.date_ended
            && ended.resolve() < membership.date_started.resolve()
        {
            return Err(LoadError::MembershipEndsBeforeStart {
                person: person.id,
                group: membership.group_name.clone(),
            });
        }
    }

    Ok(())
}

/// Expects `statuses` newest first.
fn validate_statuses(id: RelationshipId, statuses: &[RelationshipStatus]) -> Result<(), LoadError> {
    for status in statuses {
        if let Some(end) = &status.date_end
            && end.resolve() < status.date_start.resolve()
        {
            return Err(LoadError::StatusEndsBeforeStart(id));
        }
    }

    for pair in statuses.windows(2) {
        let (newer, older) = (&pair[0], &pair[1]);
        match &older.date_end {
            None => return Err(LoadError::OverlappingStatuses(id)),
            // Imprecise boundaries resolve to the start of their period and cannot be compared.
            Some(end) if end.is_precise() && newer.date_start.is_precise() => {
                if end.resolve() > newer.date_start.resolve() {
                    return Err(LoadError::OverlappingStatuses(id));
                }
            }
            Some(_) => {}
        }
    }

    Ok(())
}

pub fn parse_dataset(people_json: &str, relationships_json: &str) -> Result<Dataset, LoadError> {
    let people: Vec<Person> = serde_json::from_str(people_json).map_err(|source| LoadError::Json {
        what: "people",
        source,
    })?;
    let relationships: Vec<Relationship> =
        serde_json::from_str(relationships_json).map_err(|source| LoadError::Json {
            what: "relationships",
            source,
        })?;

    Dataset::new(people, relationships)
}

pub fn load_dataset(source: &DataSource) -> Result<Dataset, LoadError> {
    let read = |path: &Path| {
        debug!(path = %path.display(), "reading dataset file");
        fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    let people_json = read(&source.people)?;
    let relationships_json = read(&source.relationships)?;
    let dataset = parse_dataset(&people_json, &relationships_json)?;

    info!(
        people = dataset.people().len(),
        relationships = dataset.relationships().len(),
        "dataset loaded"
    );
    Ok(dataset)
}
