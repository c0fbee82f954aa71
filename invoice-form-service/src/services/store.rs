//! Invoice store abstraction and an in-memory implementation.

use crate::models::{Invoice, InvoiceChanges, NewInvoice};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for invoices. Each call is a single statement; callers get
/// a uniform `Result` whether the operation is an insert, update or delete.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert(&self, invoice: &NewInvoice) -> Result<(), StoreError>;

    /// Update the writable fields of `id`. Updating an unknown id is not an error.
    async fn update(&self, id: &str, changes: &InvoiceChanges) -> Result<(), StoreError>;

    /// Delete `id`, returning the number of rows removed.
    async fn delete(&self, id: &str) -> Result<u64, StoreError>;

    /// All invoices, newest date first.
    async fn list(&self) -> Result<Vec<Invoice>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Mutex-guarded map standing in for Postgres.
///
/// `set_failing(true)` makes every call fail, which is how tests exercise the
/// store-error path.
#[derive(Default)]
pub struct MemoryInvoiceStore {
    invoices: Mutex<HashMap<String, Invoice>>,
    failing: AtomicBool,
}

impl MemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Seed a row with a known id.
    pub fn seed(&self, invoice: Invoice) -> Result<(), StoreError> {
        self.rows()?.insert(invoice.id.clone(), invoice);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Invoice>, StoreError> {
        Ok(self.rows()?.get(id).cloned())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store set to fail".to_string()));
        }
        Ok(())
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Invoice>>, StoreError> {
        self.invoices
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Memory store mutex poisoned: {}", e)))
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn insert(&self, invoice: &NewInvoice) -> Result<(), StoreError> {
        self.check_available()?;
        let id = Uuid::new_v4().to_string();
        self.rows()?.insert(
            id.clone(),
            Invoice {
                id,
                customer_id: invoice.customer_id.clone(),
                amount: invoice.amount_cents,
                status: invoice.status.as_str().to_string(),
                date: invoice.date,
            },
        );
        Ok(())
    }

    async fn update(&self, id: &str, changes: &InvoiceChanges) -> Result<(), StoreError> {
        self.check_available()?;
        if let Some(row) = self.rows()?.get_mut(id) {
            row.customer_id = changes.customer_id.clone();
            row.amount = changes.amount_cents;
            row.status = changes.status.as_str().to_string();
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self.rows()?.remove(id).map_or(0, |_| 1))
    }

    async fn list(&self) -> Result<Vec<Invoice>, StoreError> {
        self.check_available()?;
        let mut invoices: Vec<Invoice> = self.rows()?.values().cloned().collect();
        invoices.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(invoices)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
