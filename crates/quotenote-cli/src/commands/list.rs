use quotenote_core::db::KeyValueStore;
use quotenote_core::storage::QuoteCollection;

use crate::commands::common::{format_quote_lines, quote_to_list_item, QuoteContext, QuoteListItem};
use crate::error::CliError;

pub async fn run_list<K: KeyValueStore, C: QuoteCollection>(
    ctx: &QuoteContext<K, C>,
    tag: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let store = ctx.load().await;
    let quotes = match tag.map(str::trim).filter(|tag| !tag.is_empty()) {
        Some(tag) => store.quotes_with_tag(tag),
        None => store.sorted_quotes(),
    };

    if as_json {
        let json_items = quotes
            .iter()
            .map(|quote| quote_to_list_item(quote))
            .collect::<Vec<QuoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if quotes.is_empty() {
        println!("{}", empty_message(tag));
    } else {
        for line in format_quote_lines(&quotes) {
            println!("{line}");
        }
    }

    Ok(())
}

fn empty_message(tag: Option<&str>) -> String {
    tag.map_or_else(
        || "No quotes yet. Add one with `quotenote add \"...\"`.".to_string(),
        |tag| format!("No quotes tagged #{tag}"),
    )
}
