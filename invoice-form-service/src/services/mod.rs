//! Services module for invoice-form-service.

pub mod database;
pub mod metrics;
pub mod page_cache;
pub mod store;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
pub use page_cache::PageCache;
pub use store::{InvoiceStore, MemoryInvoiceStore, StoreError};
