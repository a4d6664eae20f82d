//! Bootstrap configuration for clients.
//!
//! `BootstrapConfig` tells a client where the hosted backend lives. Values come
//! from the environment, a CLI profile, or a published manifest.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::{compact_text, is_http_url, normalize_text_option};

const BOOTSTRAP_SCHEMA_VERSION: u32 = 1;
const BOOTSTRAP_HTTP_TIMEOUT_SECS: u64 = 4;

pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const BOOTSTRAP_MANIFEST_URL_ENV: &str = "QUOTENOTE_BOOTSTRAP_URL";

/// Public backend endpoints needed to sign in and reach the quote collection.
///
/// Only publishable values belong here. Secret credentials must never be stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub bootstrap_manifest_url: Option<String>,
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
}

impl BootstrapConfig {
    /// Read `SUPABASE_URL`, `SUPABASE_ANON_KEY` and `QUOTENOTE_BOOTSTRAP_URL`
    pub fn from_env() -> Self {
        Self {
            bootstrap_manifest_url: normalize_text_option(
                std::env::var(BOOTSTRAP_MANIFEST_URL_ENV).ok(),
            ),
            supabase_url: normalize_text_option(std::env::var(SUPABASE_URL_ENV).ok()),
            supabase_anon_key: normalize_text_option(std::env::var(SUPABASE_ANON_KEY_ENV).ok()),
        }
    }

    /// Fill fields missing here from `fallback`
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            bootstrap_manifest_url: normalize_text_option(self.bootstrap_manifest_url)
                .or(fallback.bootstrap_manifest_url),
            supabase_url: normalize_text_option(self.supabase_url).or(fallback.supabase_url),
            supabase_anon_key: normalize_text_option(self.supabase_anon_key)
                .or(fallback.supabase_anon_key),
        }
    }

    /// URL and anon key, when both are present
    pub fn supabase_credentials(&self) -> Option<(String, String)> {
        let url = normalize_text_option(self.supabase_url.clone())?;
        let anon_key = normalize_text_option(self.supabase_anon_key.clone())?;
        Some((url, anon_key))
    }
}

/// Resolve runtime bootstrap config by fetching the manifest URL.
///
/// If `bootstrap_manifest_url` is set, fetch/parse/validation failures are
/// returned as errors instead of falling back to the local values.
pub async fn resolve_bootstrap_config(
    fallback: BootstrapConfig,
) -> Result<BootstrapConfig, String> {
    let Some(manifest_url) = normalize_text_option(fallback.bootstrap_manifest_url.clone()) else {
        return Ok(fallback);
    };

    fetch_bootstrap_manifest(&manifest_url).await
}

/// Parse a bootstrap manifest from a raw JSON payload
pub fn parse_bootstrap_manifest(
    payload: &str,
    manifest_url: &str,
) -> Result<BootstrapConfig, String> {
    let manifest: BootstrapManifest = serde_json::from_str(payload)
        .map_err(|error| format!("invalid bootstrap manifest JSON: {error}"))?;
    manifest.into_runtime_config(manifest_url)
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct BootstrapManifest {
    schema_version: u32,
    manifest_version: String,
    supabase_url: String,
    supabase_anon_key: String,
}

impl BootstrapManifest {
    fn into_runtime_config(self, manifest_url: &str) -> Result<BootstrapConfig, String> {
        if self.schema_version != BOOTSTRAP_SCHEMA_VERSION {
            return Err(format!(
                "unsupported bootstrap schema_version {} (expected {})",
                self.schema_version, BOOTSTRAP_SCHEMA_VERSION
            ));
        }
        if self.manifest_version.trim().is_empty() {
            return Err("bootstrap manifest_version must not be empty".to_string());
        }

        Ok(BootstrapConfig {
            bootstrap_manifest_url: Some(manifest_url.to_string()),
            supabase_url: Some(normalize_required_http_url(
                self.supabase_url,
                "supabase_url",
            )?),
            supabase_anon_key: Some(normalize_required_value(
                self.supabase_anon_key,
                "supabase_anon_key",
            )?),
        })
    }
}

async fn fetch_bootstrap_manifest(url: &str) -> Result<BootstrapConfig, String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(BOOTSTRAP_HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|error| format!("failed to build bootstrap HTTP client: {error}"))?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|error| format!("bootstrap request failed: {error}"))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(format!(
            "bootstrap endpoint returned HTTP {status}: {}",
            compact_text(&body)
        ));
    }

    let body = response
        .text()
        .await
        .map_err(|error| format!("failed to read bootstrap response body: {error}"))?;
    parse_bootstrap_manifest(&body, url)
}

fn normalize_required_value(raw: String, field: &str) -> Result<String, String> {
    normalize_text_option(Some(raw)).ok_or_else(|| format!("bootstrap field '{field}' is required"))
}

fn normalize_required_http_url(raw: String, field: &str) -> Result<String, String> {
    let value = normalize_required_value(raw, field)?;
    if is_http_url(&value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(format!(
            "bootstrap field '{field}' must include http:// or https://"
        ))
    }
}
