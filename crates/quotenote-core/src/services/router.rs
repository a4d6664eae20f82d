//! Per-operation dispatch between local and cloud storage.

use crate::db::KeyValueStore;
use crate::models::{Quote, QuoteId, QuoteInput, QuoteStore};
use crate::state::{AuthState, StorageMode};
use crate::storage::{LocalAdapter, QuoteCollection, RemoteAdapter};

/// Routes quote operations by authentication state.
///
/// Authenticated calls go to the cloud and fall back to the local adapter once
/// if the backend fails; anonymous calls go straight to the local adapter. The
/// router keeps no state of its own besides the two adapters.
pub struct StorageRouter<K, C> {
    local: LocalAdapter<K>,
    remote: RemoteAdapter<C>,
}

impl<K: KeyValueStore, C: QuoteCollection> StorageRouter<K, C> {
    pub const fn new(local: LocalAdapter<K>, remote: RemoteAdapter<C>) -> Self {
        Self { local, remote }
    }

    pub const fn local(&self) -> &LocalAdapter<K> {
        &self.local
    }

    pub const fn remote(&self) -> &RemoteAdapter<C> {
        &self.remote
    }

    pub const fn mode(auth: &AuthState) -> StorageMode {
        auth.storage_mode()
    }

    pub async fn load(&self, auth: &AuthState) -> QuoteStore {
        if !auth.is_authenticated() {
            return self.local.load().await;
        }

        match self.remote.try_load(auth).await {
            Ok(mut store) => {
                // UI flag lives on the device, not in the cloud collection
                store.force_quotes_interface = self.local.load().await.force_quotes_interface;
                store
            }
            Err(error) => {
                tracing::error!("Error getting store from cloud storage: {}", error);
                self.local.load().await
            }
        }
    }

    pub async fn add(&self, auth: &AuthState, store: &QuoteStore, input: QuoteInput) -> QuoteStore {
        self.add_with_id(auth, store, input).await.0
    }

    /// Like [`Self::add`], also returning the id the new quote was saved under
    pub async fn add_with_id(
        &self,
        auth: &AuthState,
        store: &QuoteStore,
        input: QuoteInput,
    ) -> (QuoteStore, Option<QuoteId>) {
        if !auth.is_authenticated() {
            return self.add_locally(store, input).await;
        }

        match self.remote.try_add(auth, &input).await {
            Ok(Some(quote)) => {
                let id = quote.id.clone();
                let updated = self
                    .refresh_after_remote_write(auth, store, |quotes| quotes.push(quote))
                    .await;
                (updated, Some(id))
            }
            Ok(None) => (store.clone(), None),
            Err(error) => {
                tracing::error!("Error adding quote to cloud storage: {}", error);
                self.add_locally(store, input).await
            }
        }
    }

    async fn add_locally(
        &self,
        store: &QuoteStore,
        input: QuoteInput,
    ) -> (QuoteStore, Option<QuoteId>) {
        let updated = self.local.add(store, input).await;
        // the local adapter appends
        let id = updated.quotes.last().map(|quote| quote.id.clone());
        (updated, id)
    }

    pub async fn update(
        &self,
        auth: &AuthState,
        store: &QuoteStore,
        id: &QuoteId,
        input: QuoteInput,
    ) -> QuoteStore {
        if !auth.is_authenticated() {
            return self.local.update(store, id, input).await;
        }

        match self.remote.try_update(auth, id, &input).await {
            Ok(Some(quote)) => {
                self.refresh_after_remote_write(auth, store, |quotes| {
                    if let Some(existing) = quotes.iter_mut().find(|existing| existing.id == quote.id)
                    {
                        *existing = quote;
                    }
                })
                .await
            }
            Ok(None) => store.clone(),
            Err(error) => {
                tracing::error!("Error updating quote in cloud storage: {}", error);
                self.local.update(store, id, input).await
            }
        }
    }

    pub async fn delete(&self, auth: &AuthState, store: &QuoteStore, id: &QuoteId) -> QuoteStore {
        if !auth.is_authenticated() {
            return self.local.delete(store, id).await;
        }

        match self.remote.try_delete(auth, id).await {
            Ok(true) => {
                self.refresh_after_remote_write(auth, store, |quotes| {
                    quotes.retain(|quote| &quote.id != id);
                })
                .await
            }
            Ok(false) => store.clone(),
            Err(error) => {
                tracing::error!("Error deleting quote from cloud storage: {}", error);
                self.local.delete(store, id).await
            }
        }
    }

    pub async fn random_quote(
        &self,
        auth: &AuthState,
        store: &QuoteStore,
        exclude: Option<&QuoteId>,
    ) -> Option<Quote> {
        if !auth.is_authenticated() {
            return LocalAdapter::<K>::random_quote(store, exclude);
        }

        match self.remote.try_random_quote(auth, exclude).await {
            Ok(quote) => quote,
            Err(error) => {
                tracing::error!("Error getting random quote from cloud storage: {}", error);
                LocalAdapter::<K>::random_quote(store, exclude)
            }
        }
    }

    /// Persist the landing/quotes interface flag on the device.
    ///
    /// When signed in only the flag is written locally, so cloud quotes never
    /// end up in the device blob.
    pub async fn set_force_quotes_interface(
        &self,
        auth: &AuthState,
        store: &QuoteStore,
        force: bool,
    ) -> QuoteStore {
        if !auth.is_authenticated() {
            return self.local.set_force_quotes_interface(store, force).await;
        }

        let local_store = self.local.load().await;
        self.local
            .set_force_quotes_interface(&local_store, force)
            .await;

        let mut updated = store.clone();
        updated.force_quotes_interface = force;
        updated
    }

    pub async fn has_local_quotes(&self) -> bool {
        self.local.has_quotes().await
    }

    /// Wipe device storage; the auth layer calls this on sign-out
    pub async fn clear_local(&self) {
        self.local.clear().await;
    }

    async fn refresh_after_remote_write(
        &self,
        auth: &AuthState,
        store: &QuoteStore,
        reshape: impl FnOnce(&mut Vec<Quote>),
    ) -> QuoteStore {
        match self.remote.try_load(auth).await {
            Ok(mut fresh) => {
                fresh.force_quotes_interface = store.force_quotes_interface;
                fresh
            }
            Err(error) => {
                tracing::warn!(
                    "Cloud write succeeded but reload failed ({}); reshaping local view",
                    error
                );
                let mut quotes = store.quotes.clone();
                reshape(&mut quotes);
                let mut reshaped = QuoteStore::from_quotes(quotes);
                reshaped.force_quotes_interface = store.force_quotes_interface;
                reshaped
            }
        }
    }
}
