//! Domain models for invoice-form-service.

mod invoice;

pub use invoice::{Invoice, InvoiceChanges, InvoiceStatus, NewInvoice};
