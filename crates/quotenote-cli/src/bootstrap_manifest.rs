//! Bootstrap manifest client for CLI profile initialization.

use quotenote_core::config::{resolve_bootstrap_config, BootstrapConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("{0}")]
    Message(String),
}

impl From<String> for BootstrapError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

pub async fn fetch_bootstrap_manifest(
    bootstrap_url: &str,
) -> Result<BootstrapConfig, BootstrapError> {
    resolve_bootstrap_config(BootstrapConfig {
        bootstrap_manifest_url: Some(bootstrap_url.to_string()),
        ..Default::default()
    })
    .await
    .map_err(Into::into)
}
