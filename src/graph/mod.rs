use std::collections::HashMap;

use tracing::info;

use crate::error::LoadError;
use crate::people::{Dataset, Person, PersonId, Relationship, RelationshipId};

mod display;
mod search;

pub use display::{DEFAULT_NODE_COLOR, DisplayProjection, seminar_color, status_color};
pub use search::{SearchAttributes, search};

pub struct GraphNode {
    pub person: Person,
    pub search: SearchAttributes,
}

impl GraphNode {
    pub fn id(&self) -> PersonId {
        self.person.id
    }
}

pub struct GraphEdge {
    pub relationship: Relationship,
    pub source_index: usize,
    pub target_index: usize,
}

impl GraphEdge {
    pub fn id(&self) -> RelationshipId {
        self.relationship.id
    }

    pub fn source(&self) -> PersonId {
        self.relationship.source
    }

    pub fn target(&self) -> PersonId {
        self.relationship.target
    }
}

/// Every person and relationship, in input order, with id lookups built once.
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    node_index: HashMap<PersonId, usize>,
    edge_index: HashMap<RelationshipId, usize>,
    seminars: Vec<String>,
}

impl Graph {
    pub fn build(dataset: Dataset) -> Result<Self, LoadError> {
        let (people, relationships) = dataset.into_parts();

        let node_index: HashMap<PersonId, usize> = people
            .iter()
            .enumerate()
            .map(|(index, person)| (person.id, index))
            .collect();

        let mut seminars: Vec<String> = Vec::new();
        for membership in people.iter().flat_map(Person::seminar_memberships) {
            if !seminars.contains(&membership.group_name) {
                seminars.push(membership.group_name.clone());
            }
        }

        let resolve = |relationship: &Relationship, person: PersonId| {
            node_index
                .get(&person)
                .copied()
                .ok_or(LoadError::DanglingEndpoint {
                    relationship: relationship.id,
                    person,
                })
        };
        let edges = relationships
            .into_iter()
            .map(|relationship| {
                Ok(GraphEdge {
                    source_index: resolve(&relationship, relationship.source)?,
                    target_index: resolve(&relationship, relationship.target)?,
                    relationship,
                })
            })
            .collect::<Result<Vec<_>, LoadError>>()?;
        let edge_index = edges
            .iter()
            .enumerate()
            .map(|(index, edge)| (edge.id(), index))
            .collect();

        let nodes: Vec<GraphNode> = people
            .into_iter()
            .map(|person| GraphNode {
                search: SearchAttributes::new(&person),
                person,
            })
            .collect();

        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            seminars = seminars.len(),
            "graph built"
        );

        Ok(Self {
            nodes,
            edges,
            node_index,
            edge_index,
            seminars,
        })
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: PersonId) -> Option<&GraphNode> {
        self.node_index.get(&id).map(|index| &self.nodes[*index])
    }

    pub fn edge(&self, id: RelationshipId) -> Option<&GraphEdge> {
        self.edge_index.get(&id).map(|index| &self.edges[*index])
    }

    /// Seminar names in order of first appearance.
    pub fn seminars(&self) -> &[String] {
        &self.seminars
    }

    pub fn relationship_between(&self, a: PersonId, b: PersonId) -> Option<&Relationship> {
        self.edges
            .iter()
            .map(|edge| &edge.relationship)
            .find(|relationship| relationship.connects(a, b))
    }
}
