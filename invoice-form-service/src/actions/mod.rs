//! Invoice mutation actions.
//!
//! Each action validates its input, issues exactly one statement against the
//! injected store and reports an [`ActionOutcome`]. Cache revalidation and
//! navigation are left to the caller, which acts on `ActionOutcome::Success`.

use crate::forms::{InvoiceFields, InvoiceForm, State};
use crate::models::{InvoiceChanges, NewInvoice};
use crate::services::metrics::ACTIONS_TOTAL;
use crate::services::InvoiceStore;
use chrono::{NaiveDate, Utc};
use tracing::{error, info, instrument, warn};

/// Route of the invoices listing page.
pub const INVOICES_PATH: &str = "/dashboard/invoices";

pub const INSERT_FAILED_MESSAGE: &str = "Cannot insert into DB";
pub const UPDATE_FAILED_MESSAGE: &str = "cannot update item in db";
pub const DELETE_FAILED_MESSAGE: &str = "cannot delete item in db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Field-level failures; the store was not touched.
    ValidationError(State),
    /// The statement failed; the state carries an opaque message only.
    StoreError(State),
    /// The write went through. `revalidate` must be invalidated and, when set,
    /// the caller navigates to `redirect_to`.
    Success {
        revalidate: &'static str,
        redirect_to: Option<&'static str>,
    },
}

impl ActionOutcome {
    fn label(&self) -> &'static str {
        match self {
            ActionOutcome::ValidationError(_) => "validation_error",
            ActionOutcome::StoreError(_) => "store_error",
            ActionOutcome::Success { .. } => "success",
        }
    }

    fn record(self, action: &str) -> Self {
        ACTIONS_TOTAL
            .with_label_values(&[action, self.label()])
            .inc();
        self
    }
}

/// Create an invoice dated `today`.
#[instrument(skip(store, form))]
pub async fn create_invoice_on(
    store: &dyn InvoiceStore,
    form: &InvoiceForm,
    today: NaiveDate,
) -> ActionOutcome {
    let fields = match InvoiceFields::try_from(form) {
        Ok(fields) => fields,
        Err(errors) => {
            warn!(errors = %errors, "Invoice form rejected");
            return ActionOutcome::ValidationError(State::from_validation(&errors))
                .record("create");
        }
    };

    let invoice = NewInvoice {
        customer_id: fields.customer_id,
        amount_cents: fields.amount_cents,
        status: fields.status,
        date: today,
    };

    if let Err(e) = store.insert(&invoice).await {
        error!(error = %e, customer_id = %invoice.customer_id, "Failed to insert invoice");
        return ActionOutcome::StoreError(State::with_message(INSERT_FAILED_MESSAGE))
            .record("create");
    }

    info!(
        customer_id = %invoice.customer_id,
        amount_cents = invoice.amount_cents,
        status = invoice.status.as_str(),
        date = %invoice.date,
        "Invoice created"
    );

    ActionOutcome::Success {
        revalidate: INVOICES_PATH,
        redirect_to: Some(INVOICES_PATH),
    }
    .record("create")
}

/// Create an invoice dated today (UTC).
pub async fn create_invoice(store: &dyn InvoiceStore, form: &InvoiceForm) -> ActionOutcome {
    create_invoice_on(store, form, Utc::now().date_naive()).await
}

/// Overwrite customer, amount and status of invoice `id`. The date is kept.
#[instrument(skip(store, form))]
pub async fn update_invoice(
    store: &dyn InvoiceStore,
    id: &str,
    form: &InvoiceForm,
) -> ActionOutcome {
    let fields = match InvoiceFields::try_from(form) {
        Ok(fields) => fields,
        Err(errors) => {
            warn!(errors = %errors, "Invoice form rejected");
            return ActionOutcome::ValidationError(State::from_validation(&errors))
                .record("update");
        }
    };

    let changes = InvoiceChanges {
        customer_id: fields.customer_id,
        amount_cents: fields.amount_cents,
        status: fields.status,
    };

    if let Err(e) = store.update(id, &changes).await {
        error!(error = %e, "Failed to update invoice");
        return ActionOutcome::StoreError(State::with_message(UPDATE_FAILED_MESSAGE))
            .record("update");
    }

    info!(
        amount_cents = changes.amount_cents,
        status = changes.status.as_str(),
        "Invoice updated"
    );

    ActionOutcome::Success {
        revalidate: INVOICES_PATH,
        redirect_to: Some(INVOICES_PATH),
    }
    .record("update")
}

/// Delete invoice `id`. Deleting an id with no row still succeeds.
#[instrument(skip(store))]
pub async fn delete_invoice(store: &dyn InvoiceStore, id: &str) -> ActionOutcome {
    match store.delete(id).await {
        Ok(rows) => {
            info!(rows_affected = rows, "Invoice deleted");
            ActionOutcome::Success {
                revalidate: INVOICES_PATH,
                redirect_to: None,
            }
            .record("delete")
        }
        Err(e) => {
            error!(error = %e, "Failed to delete invoice");
            ActionOutcome::StoreError(State::with_message(DELETE_FAILED_MESSAGE)).record("delete")
        }
    }
}
