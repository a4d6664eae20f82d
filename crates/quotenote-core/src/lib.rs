//! quotenote-core - Core library for Quote Note
//!
//! This crate contains the quote models, local and cloud storage adapters, the
//! storage router and the local-to-cloud migration used by every client.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod selection;
pub mod services;
pub mod state;
pub mod storage;
pub mod util;

pub use error::{Error, Result};
pub use models::{Quote, QuoteId, QuoteInput, QuoteStore};
pub use services::{
    transfer_local_quotes_to_cloud, transfer_local_quotes_with_report, StorageRouter,
    TransferReport,
};
pub use state::{AuthState, StorageMode};
