//! Aggregate quote store

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Quote, QuoteId};

/// Everything a user has saved, plus the derived tag list and a UI flag.
///
/// This is the unit of persistence on the local path: the whole value is
/// serialized on every write.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStore {
    /// Quotes in storage order (display order is computed on read)
    #[serde(default)]
    pub quotes: Vec<Quote>,
    /// Every tag referenced by a quote
    #[serde(default)]
    pub tags: Vec<String>,
    /// Landing page vs. quotes interface; not related to quote data
    #[serde(default)]
    pub force_quotes_interface: bool,
}

impl QuoteStore {
    /// Build a store from a fetched quote list, deriving tags from the quotes
    #[must_use]
    pub fn from_quotes(quotes: Vec<Quote>) -> Self {
        let tags = union_tags(&quotes);
        Self {
            quotes,
            tags,
            force_quotes_interface: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Find a quote by id
    #[must_use]
    pub fn find(&self, id: &QuoteId) -> Option<&Quote> {
        self.quotes.iter().find(|quote| &quote.id == id)
    }

    /// Quotes newest first
    #[must_use]
    pub fn sorted_quotes(&self) -> Vec<&Quote> {
        let mut quotes = self.quotes.iter().collect::<Vec<_>>();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        quotes
    }

    /// Quotes carrying `tag`, newest first
    #[must_use]
    pub fn quotes_with_tag(&self, tag: &str) -> Vec<&Quote> {
        self.sorted_quotes()
            .into_iter()
            .filter(|quote| quote.has_tag(tag))
            .collect()
    }

    /// Union of all quote tags in first-seen order
    #[must_use]
    pub fn tags_in_use(&self) -> Vec<String> {
        union_tags(&self.quotes)
    }

    /// Make `tags` exactly the set of tags still referenced by a quote.
    ///
    /// Surviving tags keep their current position; newly referenced tags are
    /// appended in the order they first appear across `quotes`.
    pub fn recompute_tags(&mut self) {
        let in_use = self.tags_in_use();
        let in_use_set = in_use.iter().map(String::as_str).collect::<HashSet<_>>();

        let mut seen = HashSet::new();
        let mut tags = self
            .tags
            .iter()
            .filter(|tag| in_use_set.contains(tag.as_str()) && seen.insert((*tag).clone()))
            .cloned()
            .collect::<Vec<_>>();

        for tag in in_use {
            if seen.insert(tag.clone()) {
                tags.push(tag);
            }
        }

        self.tags = tags;
    }
}

fn union_tags(quotes: &[Quote]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for tag in quotes.iter().flat_map(|quote| quote.tags.iter()) {
        if seen.insert(tag.as_str()) {
            tags.push(tag.clone());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quote(id: &str, created_at: i64, tags: &[&str]) -> Quote {
        Quote {
            id: QuoteId::from(id),
            text: format!("quote {id}"),
            author: None,
            tags: tags.iter().map(ToString::to_string).collect(),
            created_at,
            updated_at: None,
            user_id: None,
        }
    }

    #[test]
    fn sorted_quotes_are_newest_first() {
        let store = QuoteStore::from_quotes(vec![
            quote("a", 1, &[]),
            quote("b", 3, &[]),
            quote("c", 2, &[]),
        ]);

        let ids = store
            .sorted_quotes()
            .iter()
            .map(|quote| quote.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn from_quotes_derives_union_of_tags() {
        let store = QuoteStore::from_quotes(vec![
            quote("a", 1, &["life", "art"]),
            quote("b", 2, &["art", "wisdom"]),
        ]);
        assert_eq!(store.tags, vec!["life", "art", "wisdom"]);
    }

    #[test]
    fn recompute_tags_keeps_order_and_prunes_orphans() {
        let mut store = QuoteStore {
            quotes: vec![quote("a", 1, &["new", "kept"])],
            tags: vec!["orphan".to_string(), "kept".to_string()],
            force_quotes_interface: false,
        };

        store.recompute_tags();
        assert_eq!(store.tags, vec!["kept", "new"]);
    }

    #[test]
    fn deserializes_blob_without_optional_fields() {
        let raw = r#"{"quotes":[{"id":"x","text":"Hi","tags":[],"createdAt":5}],"tags":[]}"#;
        let store: QuoteStore = serde_json::from_str(raw).unwrap();
        assert_eq!(store.quotes.len(), 1);
        assert!(!store.force_quotes_interface);
        assert_eq!(store.quotes[0].author, None);
    }

    #[test]
    fn quotes_with_tag_filters_exact_matches() {
        let store = QuoteStore::from_quotes(vec![
            quote("a", 1, &["life"]),
            quote("b", 2, &["lifestyle"]),
        ]);
        let matches = store.quotes_with_tag("life");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id.as_str(), "a");
    }
}
