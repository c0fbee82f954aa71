//! Listing cache under a read that overlaps a mutation.

mod common;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use common::body_json;
use invoice_form_service::actions::INVOICES_PATH;
use invoice_form_service::handlers::invoices::CACHE_STATUS_HEADER;
use invoice_form_service::models::{Invoice, InvoiceChanges, NewInvoice};
use invoice_form_service::services::{InvoiceStore, MemoryInvoiceStore, StoreError};
use invoice_form_service::startup::{build_router, AppState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tower::ServiceExt;

/// Memory store whose next `list` takes its snapshot and then waits to be
/// released before returning it.
#[derive(Default)]
struct HeldListStore {
    inner: MemoryInvoiceStore,
    hold_next_list: AtomicBool,
    listed: Notify,
    release: Notify,
}

#[async_trait]
impl InvoiceStore for HeldListStore {
    async fn insert(&self, invoice: &NewInvoice) -> Result<(), StoreError> {
        self.inner.insert(invoice).await
    }

    async fn update(&self, id: &str, changes: &InvoiceChanges) -> Result<(), StoreError> {
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<Invoice>, StoreError> {
        let rows = self.inner.list().await?;
        if self.hold_next_list.swap(false, Ordering::SeqCst) {
            self.listed.notify_one();
            self.release.notified().await;
        }
        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}

async fn send(router: Router, request: Request<Body>) -> Response<Body> {
    router
        .oneshot(request)
        .await
        .expect("Failed to execute request")
}

fn listing_request() -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(INVOICES_PATH)
        .body(Body::empty())
        .expect("Failed to build request")
}

#[tokio::test]
async fn listing_read_overlapping_create_does_not_repopulate_cache() {
    common::init_tracing();

    let store = Arc::new(HeldListStore::default());
    let state = AppState::new(store.clone());
    let page_cache = state.page_cache.clone();
    let router = build_router(state);

    store.hold_next_list.store(true, Ordering::SeqCst);
    let reader = tokio::spawn(send(router.clone(), listing_request()));
    store.listed.notified().await;

    let created = send(
        router.clone(),
        Request::builder()
            .method("POST")
            .uri("/dashboard/invoices/create")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("customerId=c1&amount=3&status=paid"))
            .expect("Failed to build request"),
    )
    .await;
    assert_eq!(created.status(), StatusCode::SEE_OTHER);

    store.release.notify_one();
    let overlapping = reader.await.expect("Listing task panicked");
    assert_eq!(overlapping.status(), StatusCode::OK);
    assert_eq!(body_json(overlapping).await, serde_json::json!([]));
    assert!(!page_cache.contains(INVOICES_PATH));

    let listing = send(router, listing_request()).await;
    assert_eq!(listing.headers()[CACHE_STATUS_HEADER], "miss");
    let body = body_json(listing).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["amount"], 300);
}
