use quotenote_core::db::KeyValueStore;
use quotenote_core::storage::QuoteCollection;

use crate::cli::InterfaceMode;
use crate::commands::common::QuoteContext;
use crate::error::CliError;

pub async fn run_interface<K: KeyValueStore, C: QuoteCollection>(
    ctx: &QuoteContext<K, C>,
    mode: Option<InterfaceMode>,
) -> Result<(), CliError> {
    let store = ctx.load().await;

    let current = match mode {
        Some(mode) => {
            let updated = ctx
                .router
                .set_force_quotes_interface(&ctx.auth, &store, mode.is_forced())
                .await;
            InterfaceMode::from_flag(updated.force_quotes_interface)
        }
        None => InterfaceMode::from_flag(store.force_quotes_interface),
    };

    println!("{}", interface_label(current));
    Ok(())
}

pub const fn interface_label(mode: InterfaceMode) -> &'static str {
    match mode {
        InterfaceMode::Landing => "landing",
        InterfaceMode::Quotes => "quotes",
    }
}
