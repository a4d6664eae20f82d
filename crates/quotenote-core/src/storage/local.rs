//! On-device persistence of the whole quote store as one serialized blob.

use crate::db::KeyValueStore;
use crate::models::{Quote, QuoteId, QuoteInput, QuoteStore};
use crate::selection::pick_random;

/// Storage key holding the serialized `QuoteStore`
pub const STORAGE_KEY: &str = "quote-note-data";

/// Local adapter over a key/value medium.
///
/// Every mutation rewrites the entire blob. When no medium is available the
/// adapter behaves as an always-empty store and writes are dropped.
pub struct LocalAdapter<K> {
    storage: Option<K>,
}

impl<K: KeyValueStore> LocalAdapter<K> {
    pub const fn new(storage: K) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// An adapter with no storage context
    pub const fn unavailable() -> Self {
        Self { storage: None }
    }

    pub const fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    /// Read the stored blob, degrading to an empty store on any problem
    pub async fn load(&self) -> QuoteStore {
        let Some(storage) = self.storage.as_ref() else {
            return QuoteStore::default();
        };

        let raw = match storage.get(STORAGE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return QuoteStore::default(),
            Err(error) => {
                tracing::error!("Error loading from local storage: {}", error);
                return QuoteStore::default();
            }
        };

        match serde_json::from_str::<QuoteStore>(&raw) {
            Ok(store) => store,
            Err(error) => {
                tracing::error!("Error parsing local quote store: {}", error);
                QuoteStore::default()
            }
        }
    }

    /// Overwrite the stored blob with `store`
    pub async fn save(&self, store: &QuoteStore) {
        let Some(storage) = self.storage.as_ref() else {
            return;
        };

        let raw = match serde_json::to_string(store) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::error!("Error serializing quote store: {}", error);
                return;
            }
        };

        if let Err(error) = storage.set(STORAGE_KEY, &raw).await {
            tracing::error!("Error saving to local storage: {}", error);
        }
    }

    pub async fn add(&self, store: &QuoteStore, input: QuoteInput) -> QuoteStore {
        let mut updated = store.clone();
        updated.quotes.push(Quote::from_input(input));
        updated.recompute_tags();

        self.save(&updated).await;
        updated
    }

    /// Replace text/author/tags of `id`; an unknown id returns the store unchanged
    pub async fn update(&self, store: &QuoteStore, id: &QuoteId, input: QuoteInput) -> QuoteStore {
        let Some(index) = store.quotes.iter().position(|quote| &quote.id == id) else {
            tracing::debug!("Quote {} not found locally; nothing to update", id);
            return store.clone();
        };

        let mut updated = store.clone();
        updated.quotes[index].apply(input);
        updated.recompute_tags();

        self.save(&updated).await;
        updated
    }

    /// Remove `id` and prune tags no longer referenced by any quote
    pub async fn delete(&self, store: &QuoteStore, id: &QuoteId) -> QuoteStore {
        if store.find(id).is_none() {
            tracing::debug!("Quote {} not found locally; nothing to delete", id);
            return store.clone();
        }

        let mut updated = store.clone();
        updated.quotes.retain(|quote| &quote.id != id);
        updated.recompute_tags();

        self.save(&updated).await;
        updated
    }

    pub fn random_quote(store: &QuoteStore, exclude: Option<&QuoteId>) -> Option<Quote> {
        pick_random(&store.quotes, exclude).cloned()
    }

    pub async fn set_force_quotes_interface(&self, store: &QuoteStore, force: bool) -> QuoteStore {
        let mut updated = store.clone();
        updated.force_quotes_interface = force;

        self.save(&updated).await;
        updated
    }

    /// Whether the persisted store holds any quotes
    pub async fn has_quotes(&self) -> bool {
        !self.load().await.is_empty()
    }

    /// Drop the persisted blob (used on sign-out)
    pub async fn clear(&self) {
        let Some(storage) = self.storage.as_ref() else {
            return;
        };

        if let Err(error) = storage.remove(STORAGE_KEY).await {
            tracing::error!("Error clearing local storage: {}", error);
        }
    }
}
