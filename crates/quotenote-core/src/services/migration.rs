//! One-shot copy of device quotes into the signed-in user's cloud collection.

use std::collections::HashSet;

use crate::db::KeyValueStore;
use crate::services::StorageRouter;
use crate::state::AuthState;
use crate::storage::QuoteCollection;
use crate::util::normalized_quote_key;

/// Outcome of copying device quotes to the cloud
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// Local quotes whose text was not yet in the cloud
    pub pending: usize,
    /// How many of those the backend accepted
    pub transferred: usize,
}

impl TransferReport {
    /// Quotes that still live only on this device
    pub const fn remaining(&self) -> usize {
        self.pending.saturating_sub(self.transferred)
    }
}

/// Upload local quotes whose text is not already in the cloud.
///
/// Returns `true` only when at least one quote actually reached the cloud.
/// See [`transfer_local_quotes_with_report`] for partial outcomes.
pub async fn transfer_local_quotes_to_cloud<K, C>(
    router: &StorageRouter<K, C>,
    auth: &AuthState,
) -> bool
where
    K: KeyValueStore,
    C: QuoteCollection,
{
    transfer_local_quotes_with_report(router, auth)
        .await
        .transferred
        > 0
}

/// Upload local quotes whose text is not already in the cloud, counting results.
///
/// Quotes are matched on trimmed, case-insensitive text, and duplicates within
/// the device store upload once. A rejected upload is logged and the remaining
/// quotes are still tried. If the cloud cannot be read, every local quote is
/// reported as pending and none as transferred. Local data is never modified.
pub async fn transfer_local_quotes_with_report<K, C>(
    router: &StorageRouter<K, C>,
    auth: &AuthState,
) -> TransferReport
where
    K: KeyValueStore,
    C: QuoteCollection,
{
    if !auth.is_authenticated() {
        return TransferReport::default();
    }

    let local_store = router.local().load().await;
    if local_store.is_empty() {
        return TransferReport::default();
    }

    let remote_store = match router.remote().try_load(auth).await {
        Ok(store) => store,
        Err(error) => {
            tracing::error!("Error transferring quotes to cloud: {}", error);
            return TransferReport {
                pending: local_store.len(),
                transferred: 0,
            };
        }
    };

    let mut known = remote_store
        .quotes
        .iter()
        .map(|quote| normalized_quote_key(&quote.text))
        .collect::<HashSet<_>>();

    let mut report = TransferReport::default();
    for quote in &local_store.quotes {
        if !known.insert(normalized_quote_key(&quote.text)) {
            continue;
        }
        report.pending += 1;

        match router.remote().try_add(auth, &quote.to_input()).await {
            Ok(Some(_)) => report.transferred += 1,
            Ok(None) => {}
            Err(error) => {
                tracing::error!("Failed to transfer quote {}: {}", quote.id, error);
            }
        }
    }

    tracing::info!(
        "Transferred {} of {} local quotes to cloud storage",
        report.transferred,
        report.pending
    );
    report
}
