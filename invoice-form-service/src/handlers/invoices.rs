//! Invoice form handlers.
//!
//! Handlers run the action and then carry out what a successful outcome asks
//! for: revalidate the listing page and, for create/update, redirect to it.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use service_core::error::AppError;

use crate::actions::{self, ActionOutcome, INVOICES_PATH};
use crate::forms::InvoiceForm;
use crate::startup::AppState;

pub const CACHE_STATUS_HEADER: &str = "x-cache";

fn respond(state: &AppState, outcome: ActionOutcome) -> Response {
    match outcome {
        ActionOutcome::Success {
            revalidate,
            redirect_to,
        } => {
            state.page_cache.revalidate_path(revalidate);
            match redirect_to {
                Some(path) => Redirect::to(path).into_response(),
                None => StatusCode::NO_CONTENT.into_response(),
            }
        }
        ActionOutcome::ValidationError(form_state) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(form_state)).into_response()
        }
        ActionOutcome::StoreError(form_state) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(form_state)).into_response()
        }
    }
}

/// Create an invoice from a form submission.
pub async fn create_invoice(
    State(state): State<AppState>,
    Form(form): Form<InvoiceForm>,
) -> Response {
    let outcome = actions::create_invoice(state.store.as_ref(), &form).await;
    respond(&state, outcome)
}

/// Update the invoice named in the path from a form submission.
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<InvoiceForm>,
) -> Response {
    let outcome = actions::update_invoice(state.store.as_ref(), &id, &form).await;
    respond(&state, outcome)
}

/// Delete the invoice named in the path.
pub async fn delete_invoice(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let outcome = actions::delete_invoice(state.store.as_ref(), &id).await;
    respond(&state, outcome)
}

/// Invoices listing, served from the page cache when it is fresh.
pub async fn list_invoices(State(state): State<AppState>) -> Result<Response, AppError> {
    if let Some(body) = state.page_cache.get(INVOICES_PATH) {
        return Ok(json_page(body, "hit"));
    }

    let generation = state.page_cache.generation(INVOICES_PATH);
    let invoices = state
        .store
        .list()
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;
    let body = serde_json::to_string(&invoices).map_err(anyhow::Error::new)?;

    state
        .page_cache
        .put_if_fresh(INVOICES_PATH, generation, body.clone());
    tracing::debug!(count = invoices.len(), "Invoices listing rendered");

    Ok(json_page(body, "miss"))
}

fn json_page(body: String, cache_status: &'static str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::HeaderName::from_static(CACHE_STATUS_HEADER), cache_status),
        ],
        body,
    )
        .into_response()
}
