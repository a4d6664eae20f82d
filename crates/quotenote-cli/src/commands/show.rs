use quotenote_core::db::KeyValueStore;
use quotenote_core::storage::QuoteCollection;

use crate::commands::common::{quote_to_list_item, render_quote, resolve_quote, QuoteContext};
use crate::error::CliError;

pub async fn run_show<K: KeyValueStore, C: QuoteCollection>(
    ctx: &QuoteContext<K, C>,
    id: &str,
    as_json: bool,
) -> Result<(), CliError> {
    let store = ctx.load().await;
    let quote = resolve_quote(&store, id)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&quote_to_list_item(quote))?);
    } else {
        println!("{}", render_quote(quote));
    }
    Ok(())
}
