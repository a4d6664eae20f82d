//! Storage routing and local-to-cloud migration.

mod migration;
mod router;

pub use migration::{
    transfer_local_quotes_to_cloud, transfer_local_quotes_with_report, TransferReport,
};
pub use router::StorageRouter;
