use quotenote_core::db::KeyValueStore;
use quotenote_core::storage::QuoteCollection;
use quotenote_core::QuoteId;

use crate::commands::common::{quote_to_list_item, render_quote, resolve_quote, QuoteContext};
use crate::error::CliError;

pub async fn run_random<K: KeyValueStore, C: QuoteCollection>(
    ctx: &QuoteContext<K, C>,
    exclude: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let store = ctx.load().await;
    // an unknown exclude id is simply never matched
    let exclude = exclude.map(|query| {
        resolve_quote(&store, query)
            .map_or_else(|_| QuoteId::from(query.trim()), |quote| quote.id.clone())
    });

    let Some(quote) = ctx
        .router
        .random_quote(&ctx.auth, &store, exclude.as_ref())
        .await
    else {
        println!("No quotes yet. Add one with `quotenote add \"...\"`.");
        return Ok(());
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&quote_to_list_item(&quote))?);
    } else {
        println!("{}", render_quote(&quote));
    }
    Ok(())
}
