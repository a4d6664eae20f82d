//! Quote Note CLI - save and revisit quotes from the terminal
//!
//! Quotes live on this device until you sign in; then they live in your cloud
//! collection.

mod auth;
mod bootstrap_manifest;
mod cli;
mod commands;
mod config_profiles;
mod error;
#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::{open_context, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, QuoteEdits};
use crate::commands::interface::run_interface;
use crate::commands::list::run_list;
use crate::commands::migrate::run_migrate;
use crate::commands::random::run_random;
use crate::commands::show::run_show;
use crate::commands::tags::run_tags;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let profile = cli.profile.as_deref();

    match cli.command {
        Some(Commands::Add { text, author, tags }) => {
            let ctx = open_context(&db_path, profile).await?;
            run_add(&ctx, &text, author, tags.as_deref()).await?;
        }
        Some(Commands::List { tag, json }) => {
            let ctx = open_context(&db_path, profile).await?;
            run_list(&ctx, tag.as_deref(), json).await?;
        }
        Some(Commands::Show { id, json }) => {
            let ctx = open_context(&db_path, profile).await?;
            run_show(&ctx, &id, json).await?;
        }
        Some(Commands::Edit {
            id,
            text,
            author,
            tags,
        }) => {
            let ctx = open_context(&db_path, profile).await?;
            run_edit(&ctx, &id, QuoteEdits { text, author, tags }).await?;
        }
        Some(Commands::Delete { id }) => {
            let ctx = open_context(&db_path, profile).await?;
            run_delete(&ctx, &id).await?;
        }
        Some(Commands::Random { exclude, json }) => {
            let ctx = open_context(&db_path, profile).await?;
            run_random(&ctx, exclude.as_deref(), json).await?;
        }
        Some(Commands::Tags) => {
            let ctx = open_context(&db_path, profile).await?;
            run_tags(&ctx).await?;
        }
        Some(Commands::Interface { mode }) => {
            let ctx = open_context(&db_path, profile).await?;
            run_interface(&ctx, mode).await?;
        }
        Some(Commands::Migrate) => {
            let ctx = open_context(&db_path, profile).await?;
            run_migrate(&ctx).await?;
        }
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        Some(Commands::Config { command }) => run_config(command, profile).await?,
        Some(Commands::Auth { command }) => run_auth(command, &db_path, profile).await?,
        None => {
            // Quick capture mode: quotenote "a quote worth keeping"
            if cli.quote.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                let ctx = open_context(&db_path, profile).await?;
                run_add(&ctx, &cli.quote, None, None).await?;
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "quotenote=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
