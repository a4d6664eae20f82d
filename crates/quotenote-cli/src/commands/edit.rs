use quotenote_core::db::KeyValueStore;
use quotenote_core::models::parse_tag_list;
use quotenote_core::storage::QuoteCollection;
use quotenote_core::{Quote, QuoteInput};

use crate::commands::common::{capture_editor_input_with_initial, resolve_quote, QuoteContext};
use crate::error::CliError;

/// Field overrides from `edit` flags; `None` keeps the current value
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QuoteEdits {
    pub text: Option<String>,
    pub author: Option<String>,
    pub tags: Option<String>,
}

impl QuoteEdits {
    pub const fn is_empty(&self) -> bool {
        self.text.is_none() && self.author.is_none() && self.tags.is_none()
    }

    /// Merge onto `quote`; an empty author or tag list clears the field
    pub fn apply_to(self, quote: &Quote) -> Result<QuoteInput, CliError> {
        let text = self.text.unwrap_or_else(|| quote.text.clone());
        if text.trim().is_empty() {
            return Err(CliError::EmptyEditedContent);
        }
        let author = self.author.or_else(|| quote.author.clone());
        let tags = self
            .tags
            .map_or_else(|| quote.tags.clone(), |raw| parse_tag_list(&raw));

        Ok(QuoteInput::new(text, author, tags)?)
    }
}

pub async fn run_edit<K: KeyValueStore, C: QuoteCollection>(
    ctx: &QuoteContext<K, C>,
    id: &str,
    mut edits: QuoteEdits,
) -> Result<(), CliError> {
    let store = ctx.load().await;
    let quote = resolve_quote(&store, id)?;

    if edits.is_empty() {
        let Some(edited_text) = capture_editor_input_with_initial(&quote.text)? else {
            return Err(CliError::EmptyEditedContent);
        };
        edits.text = Some(edited_text);
    }

    let input = edits.apply_to(quote)?;
    if input == quote.to_input() {
        println!("{}", quote.id);
        return Ok(());
    }

    let updated = ctx.router.update(&ctx.auth, &store, &quote.id, input).await;
    let edited = updated
        .find(&quote.id)
        .ok_or_else(|| CliError::QuoteNotFound(quote.id.to_string()))?;
    println!("{}", edited.id);
    Ok(())
}
