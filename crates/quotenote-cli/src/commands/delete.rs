use quotenote_core::db::KeyValueStore;
use quotenote_core::storage::QuoteCollection;

use crate::commands::common::{resolve_quote, QuoteContext};
use crate::error::CliError;

pub async fn run_delete<K: KeyValueStore, C: QuoteCollection>(
    ctx: &QuoteContext<K, C>,
    id: &str,
) -> Result<(), CliError> {
    let store = ctx.load().await;
    let quote_id = resolve_quote(&store, id)?.id.clone();

    let updated = ctx.router.delete(&ctx.auth, &store, &quote_id).await;
    if updated.find(&quote_id).is_some() {
        return Err(CliError::QuoteNotFound(quote_id.to_string()));
    }

    println!("{quote_id}");
    Ok(())
}
