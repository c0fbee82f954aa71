//! Common test utilities for invoice-form-service integration tests.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use invoice_form_service::services::{MemoryInvoiceStore, PageCache};
use invoice_form_service::startup::{build_router, AppState};
use std::sync::{Arc, Once};
use tower::ServiceExt;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,invoice_form_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Router wired to an in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryInvoiceStore>,
    pub page_cache: PageCache,
}

impl TestApp {
    pub fn spawn() -> Self {
        init_tracing();

        let store = Arc::new(MemoryInvoiceStore::new());
        let state = AppState::new(store.clone());
        let page_cache = state.page_cache.clone();

        TestApp {
            router: build_router(state),
            store,
            page_cache,
        }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .expect("Failed to build request"),
        )
        .await
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request")
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}
