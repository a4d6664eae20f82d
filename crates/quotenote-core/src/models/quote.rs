//! Quote model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::util::{normalize_text_option, unix_timestamp_millis_now};

/// An opaque quote identifier.
///
/// Locally created quotes use UUID v7 strings (time-sortable); quotes that come
/// from the document backend carry whatever id the backend assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    /// Create a new unique quote ID using UUID v7
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for QuoteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("quote id must not be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<String> for QuoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for QuoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A saved quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Unique identifier
    pub id: QuoteId,
    /// Quote text
    pub text: String,
    /// Optional attribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Tags in the order they were entered
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation timestamp (Unix ms), never changes after creation
    pub created_at: i64,
    /// Last edit timestamp (Unix ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Owner when the quote lives in the cloud collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Quote {
    /// Build a brand new quote from user input with a fresh id and timestamp
    #[must_use]
    pub fn from_input(input: QuoteInput) -> Self {
        Self {
            id: QuoteId::generate(),
            text: input.text,
            author: input.author,
            tags: input.tags,
            created_at: unix_timestamp_millis_now(),
            updated_at: None,
            user_id: None,
        }
    }

    /// Replace the editable fields, keeping id and creation time
    pub fn apply(&mut self, input: QuoteInput) {
        self.text = input.text;
        self.author = input.author;
        self.tags = input.tags;
        self.updated_at = Some(unix_timestamp_millis_now());
    }

    /// The editable part of this quote
    #[must_use]
    pub fn to_input(&self) -> QuoteInput {
        QuoteInput {
            text: self.text.clone(),
            author: self.author.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Whether this quote carries the given tag (exact match)
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }
}

/// The user-editable fields of a quote (text, author, tags)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuoteInput {
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl QuoteInput {
    /// Normalize and validate raw form values.
    ///
    /// Text is trimmed and must not be empty. A blank author becomes `None`.
    /// Tags are trimmed and blank entries dropped; duplicates are kept as entered.
    pub fn new(
        text: impl Into<String>,
        author: Option<String>,
        tags: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(Error::InvalidInput("quote text cannot be empty".into()));
        }

        let tags = tags
            .into_iter()
            .filter_map(|tag| normalize_text_option(Some(tag)))
            .collect();

        Ok(Self {
            text,
            author: normalize_text_option(author),
            tags,
        })
    }
}

/// Split a comma-separated tag field into individual tags
#[must_use]
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|tag| normalize_text_option(Some(tag.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_id_unique() {
        let id1 = QuoteId::generate();
        let id2 = QuoteId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_quote_id_parse_rejects_blank() {
        assert!("   ".parse::<QuoteId>().is_err());
        let parsed: QuoteId = " abc ".parse().unwrap();
        assert_eq!(parsed.as_str(), "abc");
    }

    #[test]
    fn test_input_normalizes_fields() {
        let input = QuoteInput::new(
            "  Stay hungry.  ",
            Some("   ".to_string()),
            vec![" life ".to_string(), String::new(), "life".to_string()],
        )
        .unwrap();

        assert_eq!(input.text, "Stay hungry.");
        assert_eq!(input.author, None);
        assert_eq!(input.tags, vec!["life", "life"]);
    }

    #[test]
    fn test_input_rejects_empty_text() {
        assert!(QuoteInput::new(" \n ", None, Vec::new()).is_err());
    }

    #[test]
    fn test_apply_keeps_identity() {
        let mut quote = Quote::from_input(QuoteInput::new("Original", None, Vec::new()).unwrap());
        let id = quote.id.clone();
        let created_at = quote.created_at;

        quote.apply(
            QuoteInput::new("Edited", Some("Me".to_string()), vec!["x".to_string()]).unwrap(),
        );

        assert_eq!(quote.id, id);
        assert_eq!(quote.created_at, created_at);
        assert_eq!(quote.text, "Edited");
        assert!(quote.updated_at.is_some());
    }

    #[test]
    fn test_serializes_with_blob_field_names() {
        let quote = Quote {
            id: QuoteId::from("q1"),
            text: "Hello".to_string(),
            author: None,
            tags: vec!["a".to_string()],
            created_at: 42,
            updated_at: None,
            user_id: None,
        };

        let value = serde_json::to_value(&quote).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "q1", "text": "Hello", "tags": ["a"], "createdAt": 42})
        );
    }

    #[test]
    fn test_parse_tag_list() {
        assert_eq!(parse_tag_list("wisdom, life ,,art"), vec!["wisdom", "life", "art"]);
        assert!(parse_tag_list("  ").is_empty());
    }
}
