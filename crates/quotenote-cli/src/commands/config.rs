use std::env;

use quotenote_core::config::{
    BootstrapConfig, BOOTSTRAP_MANIFEST_URL_ENV, SUPABASE_ANON_KEY_ENV, SUPABASE_URL_ENV,
};
use quotenote_core::util::is_http_url;

use crate::bootstrap_manifest::fetch_bootstrap_manifest;
use crate::cli::ConfigCommands;
use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub async fn run_config(
    command: ConfigCommands,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            supabase_url,
            supabase_anon_key,
            bootstrap_url,
            no_activate,
        } => {
            run_config_init(
                profile.as_deref().or(global_profile),
                supabase_url,
                supabase_anon_key,
                bootstrap_url,
                no_activate,
            )
            .await
        }
    }
}

pub async fn run_config_init(
    profile_name: Option<&str>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    bootstrap_url: Option<String>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let explicit = BootstrapConfig {
        bootstrap_manifest_url: normalize_text_option(bootstrap_url),
        supabase_url: normalize_text_option(supabase_url),
        supabase_anon_key: normalize_text_option(supabase_anon_key),
    };
    let bootstrap_url = resolve_bootstrap_url(
        explicit.bootstrap_manifest_url.clone(),
        existing_profile.bootstrap_url.clone(),
    )?;

    let should_fetch_bootstrap = explicit.bootstrap_manifest_url.is_some()
        || explicit.supabase_credentials().is_none();
    let manifest = match bootstrap_url.as_deref() {
        Some(url) if should_fetch_bootstrap => {
            let manifest = fetch_bootstrap_manifest(url).await.map_err(|error| {
                CliError::Config(format!(
                    "Failed to load bootstrap manifest from {url}: {error}"
                ))
            })?;
            println!("Loaded bootstrap manifest from {url}");
            manifest
        }
        _ => BootstrapConfig::default(),
    };

    let merged = merge_profile_sources(explicit, manifest, &existing_profile);

    let profile = config.profile_mut_or_default(&profile_name);
    profile.supabase_url = merged.supabase_url;
    profile.supabase_anon_key = merged.supabase_anon_key;
    profile.bootstrap_url = bootstrap_url;

    validate_profile_urls(profile)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profile(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let missing_fields = missing_profile_fields(profile);
    if missing_fields.is_empty() {
        println!(
            "Cloud profile '{profile_name}' is ready. Run `quotenote auth signup` or `quotenote auth login`."
        );
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

/// Explicit flags, then the manifest, then the environment, then the saved profile
pub fn merge_profile_sources(
    explicit: BootstrapConfig,
    manifest: BootstrapConfig,
    existing: &CliProfile,
) -> BootstrapConfig {
    let from_env = BootstrapConfig {
        bootstrap_manifest_url: None,
        supabase_url: normalize_text_option(env::var(SUPABASE_URL_ENV).ok()),
        supabase_anon_key: normalize_text_option(env::var(SUPABASE_ANON_KEY_ENV).ok()),
    };

    explicit
        .or(manifest)
        .or(from_env)
        .or(existing.bootstrap_config())
}

pub fn missing_profile_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing_fields = Vec::new();
    if profile.supabase_url().is_none() {
        missing_fields.push("supabase_url");
    }
    if profile.supabase_anon_key().is_none() {
        missing_fields.push("supabase_anon_key");
    }
    missing_fields
}

pub fn resolve_bootstrap_url(
    explicit_bootstrap_url: Option<String>,
    existing_bootstrap_url: Option<String>,
) -> Result<Option<String>, CliError> {
    explicit_bootstrap_url
        .or_else(|| normalize_text_option(env::var(BOOTSTRAP_MANIFEST_URL_ENV).ok()))
        .or_else(|| normalize_text_option(existing_bootstrap_url))
        .map(normalize_bootstrap_url)
        .transpose()
}

pub fn normalize_bootstrap_url(url: String) -> Result<String, CliError> {
    let normalized = normalize_text_option(Some(url))
        .ok_or_else(|| CliError::Config("bootstrap_url must not be empty".to_string()))?;
    if !is_http_url(&normalized) {
        return Err(CliError::Config(
            "bootstrap_url must include http:// or https://".to_string(),
        ));
    }
    Ok(normalized.trim_end_matches('/').to_string())
}

fn validate_profile_urls(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.supabase_url() {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}
