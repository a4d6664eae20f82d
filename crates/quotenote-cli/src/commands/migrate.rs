use quotenote_core::db::KeyValueStore;
use quotenote_core::storage::QuoteCollection;
use quotenote_core::transfer_local_quotes_with_report;

use crate::commands::common::QuoteContext;
use crate::error::CliError;

pub async fn run_migrate<K: KeyValueStore, C: QuoteCollection>(
    ctx: &QuoteContext<K, C>,
) -> Result<(), CliError> {
    if !ctx.auth.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }

    println!("{}", migrate_local_quotes(ctx).await);
    Ok(())
}

/// Copy device quotes to the cloud and describe the outcome
pub async fn migrate_local_quotes<K: KeyValueStore, C: QuoteCollection>(
    ctx: &QuoteContext<K, C>,
) -> String {
    if !ctx.router.has_local_quotes().await {
        return "No quotes on this device to copy.".to_string();
    }

    let report = transfer_local_quotes_with_report(&ctx.router, &ctx.auth).await;
    if report.pending == 0 {
        "Nothing was copied; your cloud collection already has these quotes.".to_string()
    } else if report.remaining() == 0 {
        "Copied quotes from this device to your cloud collection.".to_string()
    } else {
        format!(
            "Copied {} of {} quotes; {} could not be uploaded and remain only on this device.",
            report.transferred,
            report.pending,
            report.remaining()
        )
    }
}
