//! People, memberships and relationships as they arrive from the JSON export.

mod date;
mod load;
mod records;

pub use date::PartialDate;
pub use load::{DataSource, Dataset, load_dataset, parse_dataset};
pub use records::{
    Gender, GroupCategory, Membership, Person, PersonId, Relationship, RelationshipCategory,
    RelationshipId, RelationshipStatus, RelationshipStatusType,
};
