//! Data models for Quote Note

mod quote;
mod store;

pub use quote::{parse_tag_list, Quote, QuoteId, QuoteInput};
pub use store::QuoteStore;
