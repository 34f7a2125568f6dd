//! Customer code allocation and calendar reconciliation

pub mod codes;
pub mod ports;
pub mod sync;

pub use codes::{generate_next_code, next_after, CodeAllocator, WatermarkAllocator};
pub use sync::{diff_fields, CustomerSyncService};
