use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use unicode_normalization::UnicodeNormalization;

use crate::people::{Person, PersonId};

use super::Graph;

/// Lowercases and strips combining diacritics, so "Ďurica" matches "durica".
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchAttributes {
    pub first_name: String,
    pub last_name: String,
    pub nickname: Option<String>,
    pub maiden_name: Option<String>,
}

impl SearchAttributes {
    pub fn new(person: &Person) -> Self {
        let optional = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(normalize)
        };

        Self {
            first_name: normalize(&person.first_name),
            last_name: normalize(&person.last_name),
            nickname: optional(&person.nickname),
            maiden_name: optional(&person.maiden_name),
        }
    }

    fn fields(&self) -> impl Iterator<Item = &str> {
        [&self.first_name, &self.last_name]
            .into_iter()
            .chain(self.nickname.as_ref())
            .chain(self.maiden_name.as_ref())
            .map(String::as_str)
    }

    fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Ranks `candidates` against `query`, best match first.
///
/// Every name field is scored on its own as well as "first last", and a person's score is
/// the best of those. Ties keep candidate order.
pub fn search(graph: &Graph, candidates: &[PersonId], query: &str) -> Vec<PersonId> {
    let query = normalize(query.trim());
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, usize, PersonId)> = candidates
        .iter()
        .enumerate()
        .filter_map(|(order, id)| {
            let attributes = &graph.node(*id)?.search;
            let full_name = attributes.full_name();
            let best = attributes
                .fields()
                .chain(std::iter::once(full_name.as_str()))
                .filter_map(|field| matcher.fuzzy_match(field, &query))
                .max()?;
            Some((best, order, *id))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::sample_graph;

    #[test]
    fn normalize_strips_diacritics_and_case() {
        assert_eq!(normalize("Ďurica"), "durica");
        assert_eq!(normalize("KOVÁČOVÁ"), "kovacova");
        assert_eq!(normalize("Suši"), "susi");
    }

    #[test]
    fn finds_people_by_any_name_without_diacritics() {
        let graph = sample_graph();
        let everyone: Vec<PersonId> = graph.nodes().iter().map(|node| node.id()).collect();

        assert_eq!(search(&graph, &everyone, "tomi").first(), Some(&PersonId(7)));
        assert_eq!(search(&graph, &everyone, "simkova"), [PersonId(2)]);
        assert!(search(&graph, &everyone, "   ").is_empty());
        assert!(search(&graph, &everyone, "xyzzy").is_empty());
    }

    #[test]
    fn only_searches_the_given_candidates() {
        let graph = sample_graph();
        let hits = search(&graph, &[PersonId(1), PersonId(2)], "kovac");
        assert!(hits.contains(&PersonId(2)));
        assert!(!hits.contains(&PersonId(3)));
    }
}
