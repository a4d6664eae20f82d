//! Cloud persistence of quotes as per-user documents.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Quote, QuoteId, QuoteInput, QuoteStore};
use crate::selection::pick_random;
use crate::state::AuthState;
use crate::util::{normalize_text_option, unix_timestamp_millis_now};

/// A quote document as stored in the backend collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDocument {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Backend-generated creation time (RFC 3339)
    #[serde(default)]
    pub created_at: Option<String>,
}

impl QuoteDocument {
    /// Creation time in Unix ms, if present and parseable
    #[must_use]
    pub fn created_at_millis(&self) -> Option<i64> {
        self.created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
            .map(|date_time| date_time.timestamp_millis())
    }

    /// Map into the app model; missing fields get their defaults
    #[must_use]
    pub fn into_quote(self) -> Quote {
        let created_at = self
            .created_at_millis()
            .unwrap_or_else(unix_timestamp_millis_now);
        Quote {
            id: QuoteId::from(self.id),
            text: self.text,
            author: normalize_text_option(self.author),
            tags: self.tags.unwrap_or_default(),
            created_at,
            updated_at: None,
            user_id: self.user_id,
        }
    }
}

/// A hosted document collection of quotes, scoped per user
#[allow(async_fn_in_trait)]
pub trait QuoteCollection {
    /// All documents owned by `user_id`, newest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<QuoteDocument>>;

    /// Insert a new document; the backend assigns id and creation time
    async fn insert(&self, user_id: &str, input: &QuoteInput) -> Result<QuoteDocument>;

    /// Overwrite text/author/tags; `None` when no such document exists
    async fn update(
        &self,
        user_id: &str,
        id: &QuoteId,
        input: &QuoteInput,
    ) -> Result<Option<QuoteDocument>>;

    /// Remove a document; returns whether one was removed
    async fn delete(&self, user_id: &str, id: &QuoteId) -> Result<bool>;
}

/// The injected backend handle
pub enum RemoteBackend<C> {
    NotConfigured,
    Connected(C),
}

/// Remote adapter over a `QuoteCollection`.
///
/// The `try_*` operations propagate backend failures so callers can fall back.
/// The plain operations fail soft: they log and return an empty store, `None`
/// or `false`.
pub struct RemoteAdapter<C> {
    backend: RemoteBackend<C>,
}

impl<C: QuoteCollection> RemoteAdapter<C> {
    pub const fn new(collection: C) -> Self {
        Self {
            backend: RemoteBackend::Connected(collection),
        }
    }

    pub const fn not_configured() -> Self {
        Self {
            backend: RemoteBackend::NotConfigured,
        }
    }

    pub const fn is_configured(&self) -> bool {
        matches!(self.backend, RemoteBackend::Connected(_))
    }

    fn ready<'a>(&'a self, auth: &'a AuthState, operation: &str) -> Option<(&'a C, &'a str)> {
        let RemoteBackend::Connected(collection) = &self.backend else {
            tracing::warn!("Cloud storage not configured, skipping {}", operation);
            return None;
        };
        let Some(user_id) = auth.user_id() else {
            tracing::warn!("No authenticated user, skipping cloud {}", operation);
            return None;
        };
        Some((collection, user_id))
    }

    pub async fn try_load(&self, auth: &AuthState) -> Result<QuoteStore> {
        let Some((collection, user_id)) = self.ready(auth, "load") else {
            return Ok(QuoteStore::default());
        };

        let documents = collection.list_for_user(user_id).await?;
        let mut quotes = documents
            .into_iter()
            .map(QuoteDocument::into_quote)
            .collect::<Vec<_>>();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(QuoteStore::from_quotes(quotes))
    }

    pub async fn try_add(&self, auth: &AuthState, input: &QuoteInput) -> Result<Option<Quote>> {
        let Some((collection, user_id)) = self.ready(auth, "add") else {
            return Ok(None);
        };

        let document = collection.insert(user_id, input).await?;
        tracing::debug!("Added quote {} to cloud storage", document.id);
        Ok(Some(document.into_quote()))
    }

    pub async fn try_update(
        &self,
        auth: &AuthState,
        id: &QuoteId,
        input: &QuoteInput,
    ) -> Result<Option<Quote>> {
        let Some((collection, user_id)) = self.ready(auth, "update") else {
            return Ok(None);
        };

        let Some(document) = collection.update(user_id, id, input).await? else {
            tracing::debug!("Quote {} not found in cloud storage", id);
            return Ok(None);
        };

        // The stored creation time is untouched; when the backend does not echo
        // it back, the current time stands in for display.
        let mut quote = document.into_quote();
        quote.updated_at = Some(unix_timestamp_millis_now());
        Ok(Some(quote))
    }

    pub async fn try_delete(&self, auth: &AuthState, id: &QuoteId) -> Result<bool> {
        let Some((collection, user_id)) = self.ready(auth, "delete") else {
            return Ok(false);
        };

        collection.delete(user_id, id).await
    }

    pub async fn try_random_quote(
        &self,
        auth: &AuthState,
        exclude: Option<&QuoteId>,
    ) -> Result<Option<Quote>> {
        let store = self.try_load(auth).await?;
        Ok(pick_random(&store.quotes, exclude).cloned())
    }

    pub async fn load(&self, auth: &AuthState) -> QuoteStore {
        self.try_load(auth).await.unwrap_or_else(|error| {
            tracing::error!("Error loading from cloud storage: {}", error);
            QuoteStore::default()
        })
    }

    pub async fn add(&self, auth: &AuthState, input: &QuoteInput) -> Option<Quote> {
        self.try_add(auth, input).await.unwrap_or_else(|error| {
            tracing::error!("Error adding quote to cloud storage: {}", error);
            None
        })
    }

    pub async fn update(&self, auth: &AuthState, id: &QuoteId, input: &QuoteInput) -> Option<Quote> {
        self.try_update(auth, id, input).await.unwrap_or_else(|error| {
            tracing::error!("Error updating quote in cloud storage: {}", error);
            None
        })
    }

    pub async fn delete(&self, auth: &AuthState, id: &QuoteId) -> bool {
        self.try_delete(auth, id).await.unwrap_or_else(|error| {
            tracing::error!("Error deleting quote from cloud storage: {}", error);
            false
        })
    }

    pub async fn random_quote(&self, auth: &AuthState, exclude: Option<&QuoteId>) -> Option<Quote> {
        self.try_random_quote(auth, exclude)
            .await
            .unwrap_or_else(|error| {
                tracing::error!("Error getting random quote from cloud storage: {}", error);
                None
            })
    }
}

/// In-process `QuoteCollection`; clones share the same documents.
///
/// Can be switched offline to make every call fail like an unreachable backend,
/// or told to reject the next few inserts or listings.
#[derive(Debug, Clone, Default)]
pub struct MemoryQuoteCollection {
    documents: Arc<Mutex<Vec<QuoteDocument>>>,
    offline: Arc<AtomicBool>,
    rejected_inserts: Arc<AtomicUsize>,
    failed_lists: Arc<AtomicUsize>,
}

impl MemoryQuoteCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Reject the next `count` inserts with a backend error
    pub fn reject_next_inserts(&self, count: usize) {
        self.rejected_inserts.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` listings with a backend error
    pub fn fail_next_lists(&self, count: usize) {
        self.failed_lists.store(count, Ordering::SeqCst);
    }

    /// Snapshot of every stored document, regardless of owner
    pub async fn documents(&self) -> Vec<QuoteDocument> {
        self.documents.lock().await.clone()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(Error::Remote("backend unreachable".into()))
        } else {
            Ok(())
        }
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
            remaining.checked_sub(1)
        })
        .is_ok()
}

impl QuoteCollection for MemoryQuoteCollection {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<QuoteDocument>> {
        self.check_online()?;
        if take_one(&self.failed_lists) {
            return Err(Error::Remote("listing failed".into()));
        }
        let mut documents = self
            .documents
            .lock()
            .await
            .iter()
            .filter(|document| document.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect::<Vec<_>>();
        documents.sort_by_key(|document| std::cmp::Reverse(document.created_at_millis()));
        Ok(documents)
    }

    async fn insert(&self, user_id: &str, input: &QuoteInput) -> Result<QuoteDocument> {
        self.check_online()?;
        if take_one(&self.rejected_inserts) {
            return Err(Error::Remote("permission denied (403)".into()));
        }
        let document = QuoteDocument {
            id: Uuid::now_v7().to_string(),
            text: input.text.clone(),
            author: input.author.clone(),
            tags: Some(input.tags.clone()),
            user_id: Some(user_id.to_string()),
            created_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        };
        self.documents.lock().await.push(document.clone());
        Ok(document)
    }

    async fn update(
        &self,
        user_id: &str,
        id: &QuoteId,
        input: &QuoteInput,
    ) -> Result<Option<QuoteDocument>> {
        self.check_online()?;
        let mut documents = self.documents.lock().await;
        let Some(document) = documents.iter_mut().find(|document| {
            document.id == id.as_str() && document.user_id.as_deref() == Some(user_id)
        }) else {
            return Ok(None);
        };

        document.text.clone_from(&input.text);
        document.author.clone_from(&input.author);
        document.tags = Some(input.tags.clone());
        Ok(Some(document.clone()))
    }

    async fn delete(&self, user_id: &str, id: &QuoteId) -> Result<bool> {
        self.check_online()?;
        let mut documents = self.documents.lock().await;
        let before = documents.len();
        documents.retain(|document| {
            !(document.id == id.as_str() && document.user_id.as_deref() == Some(user_id))
        });
        Ok(documents.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(text: &str, tags: &[&str]) -> QuoteInput {
        QuoteInput::new(text, None, tags.iter().map(ToString::to_string)).unwrap()
    }

    fn connected() -> (RemoteAdapter<MemoryQuoteCollection>, MemoryQuoteCollection) {
        let collection = MemoryQuoteCollection::new();
        (RemoteAdapter::new(collection.clone()), collection)
    }

    #[test]
    fn document_defaults_missing_fields() {
        let before = unix_timestamp_millis_now();
        let document: QuoteDocument =
            serde_json::from_str(r#"{"id":"doc-1","text":"Hi","author":null}"#).unwrap();
        let quote = document.into_quote();

        assert_eq!(quote.id.as_str(), "doc-1");
        assert_eq!(quote.author, None);
        assert!(quote.tags.is_empty());
        assert!(quote.created_at >= before);
    }

    #[test]
    fn document_parses_backend_timestamp() {
        let document = QuoteDocument {
            id: "doc".to_string(),
            text: "Hi".to_string(),
            author: Some("A".to_string()),
            tags: Some(vec!["t".to_string()]),
            user_id: Some("u".to_string()),
            created_at: Some("2024-01-01T00:00:00.000+00:00".to_string()),
        };
        assert_eq!(document.into_quote().created_at, 1_704_067_200_000);
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_now() {
        let document = QuoteDocument {
            id: "doc".to_string(),
            text: "Hi".to_string(),
            author: None,
            tags: None,
            user_id: None,
            created_at: Some("yesterday".to_string()),
        };
        assert!(document.into_quote().created_at > 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn operations_fail_soft_when_anonymous() {
        let (remote, collection) = connected();
        let anonymous = AuthState::Anonymous;

        assert_eq!(remote.load(&anonymous).await, QuoteStore::default());
        assert!(remote.add(&anonymous, &input("Hi", &[])).await.is_none());
        assert!(!remote.delete(&anonymous, &QuoteId::from("x")).await);
        assert!(collection.documents().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn operations_fail_soft_when_not_configured() {
        let remote = RemoteAdapter::<MemoryQuoteCollection>::not_configured();
        let auth = AuthState::user("user-1");

        assert!(!remote.is_configured());
        assert_eq!(remote.load(&auth).await, QuoteStore::default());
        assert!(remote.add(&auth, &input("Hi", &[])).await.is_none());
        assert!(remote
            .update(&auth, &QuoteId::from("x"), &input("Hi", &[]))
            .await
            .is_none());
        assert!(remote.random_quote(&auth, None).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_is_scoped_to_user_and_derives_tags() {
        let (remote, _collection) = connected();
        let alice = AuthState::user("alice");
        let bob = AuthState::user("bob");

        remote.add(&alice, &input("A1", &["x", "y"])).await.unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        remote.add(&alice, &input("A2", &["y", "z"])).await.unwrap();
        remote.add(&bob, &input("B1", &["bob"])).await.unwrap();

        let store = remote.load(&alice).await;
        assert_eq!(store.quotes.len(), 2);
        assert_eq!(store.quotes[0].text, "A2");
        assert_eq!(store.tags, vec!["y", "z", "x"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_keeps_stored_creation_time() {
        let (remote, collection) = connected();
        let auth = AuthState::user("alice");

        let added = remote.add(&auth, &input("Draft", &[])).await.unwrap();
        let stored_created_at = collection.documents().await[0].created_at.clone();

        let updated = remote
            .update(&auth, &added.id, &input("Final", &["done"]))
            .await
            .unwrap();
        assert_eq!(updated.text, "Final");
        assert_eq!(collection.documents().await[0].created_at, stored_created_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn backend_failures_surface_through_try_operations() {
        let (remote, collection) = connected();
        let auth = AuthState::user("alice");
        collection.set_offline(true);

        assert!(remote.try_load(&auth).await.is_err());
        assert!(remote.try_add(&auth, &input("Hi", &[])).await.is_err());
        assert_eq!(remote.load(&auth).await, QuoteStore::default());
        assert!(!remote.delete(&auth, &QuoteId::from("x")).await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn one_shot_failures_clear_after_use() {
        let (remote, collection) = connected();
        let auth = AuthState::user("alice");
        collection.reject_next_inserts(1);
        collection.fail_next_lists(1);

        assert!(remote.try_add(&auth, &input("Rejected", &[])).await.is_err());
        assert!(remote.try_add(&auth, &input("Accepted", &[])).await.is_ok());
        assert!(remote.try_load(&auth).await.is_err());
        assert_eq!(remote.try_load(&auth).await.unwrap().quotes.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_reports_whether_document_existed() {
        let (remote, _collection) = connected();
        let auth = AuthState::user("alice");
        let added = remote.add(&auth, &input("Bye", &[])).await.unwrap();

        assert!(remote.delete(&auth, &added.id).await);
        assert!(!remote.delete(&auth, &added.id).await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn random_quote_refetches_and_excludes_current() {
        let (remote, _collection) = connected();
        let auth = AuthState::user("alice");
        let first = remote.add(&auth, &input("One", &[])).await.unwrap();
        remote.add(&auth, &input("Two", &[])).await.unwrap();

        for _ in 0..50 {
            let picked = remote.random_quote(&auth, Some(&first.id)).await.unwrap();
            assert_ne!(picked.id, first.id);
        }
    }
}
