use quotenote_core::db::KeyValueStore;
use quotenote_core::storage::QuoteCollection;
use quotenote_core::{Quote, QuoteInput};

use crate::commands::common::{parse_tags_flag, resolve_quote_text, QuoteContext};
use crate::error::CliError;

pub async fn run_add<K: KeyValueStore, C: QuoteCollection>(
    ctx: &QuoteContext<K, C>,
    text_parts: &[String],
    author: Option<String>,
    tags: Option<&str>,
) -> Result<(), CliError> {
    let text = resolve_quote_text(text_parts)?;
    let quote = add_quote(ctx, QuoteInput::new(text, author, parse_tags_flag(tags))?).await?;

    println!("{}", quote.id);
    Ok(())
}

/// Save `input` and return the stored quote (with its backend-assigned id)
pub async fn add_quote<K: KeyValueStore, C: QuoteCollection>(
    ctx: &QuoteContext<K, C>,
    input: QuoteInput,
) -> Result<Quote, CliError> {
    let store = ctx.load().await;
    let (updated, id) = ctx.router.add_with_id(&ctx.auth, &store, input).await;

    id.and_then(|id| updated.find(&id).cloned())
        .ok_or(CliError::NotSaved)
}
