//! Local and cloud quote storage adapters.

mod local;
mod remote;
mod supabase;

pub use local::{LocalAdapter, STORAGE_KEY};
pub use remote::{MemoryQuoteCollection, QuoteCollection, QuoteDocument, RemoteAdapter, RemoteBackend};
pub use supabase::{normalize_rest_url, SupabaseQuoteCollection};
