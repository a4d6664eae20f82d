use quotenote_core::db::KeyValueStore;
use quotenote_core::storage::QuoteCollection;
use quotenote_core::QuoteStore;

use crate::commands::common::QuoteContext;
use crate::error::CliError;

pub async fn run_tags<K: KeyValueStore, C: QuoteCollection>(
    ctx: &QuoteContext<K, C>,
) -> Result<(), CliError> {
    let store = ctx.load().await;
    for line in format_tag_lines(&store) {
        println!("{line}");
    }
    Ok(())
}

/// `#tag (count)` per tag, in store order
pub fn format_tag_lines(store: &QuoteStore) -> Vec<String> {
    store
        .tags
        .iter()
        .map(|tag| {
            let count = store.quotes.iter().filter(|quote| quote.has_tag(tag)).count();
            format!("#{tag} ({count})")
        })
        .collect()
}
