//! Router-level tests for the click endpoint.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{post_click, seeded_store, test_router};
use dealstack::domain::entities::OfferRecord;
use dealstack::domain::types::CouponKind;
use serde_json::json;
use time::macros::datetime;
use uuid::Uuid;

async fn wait_for_audit(store: &common::FakeStore, expected: usize) {
    for _ in 0..50 {
        if store.audit.lock().expect("lock").len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("audit queue never drained to {expected} records");
}

#[tokio::test]
async fn canonical_click_reveals_code_and_counts() {
    let store = seeded_store();
    let router = test_router(store.clone());

    let (status, body) = post_click(
        &router,
        "7",
        Some(json!({ "referrer": "https://search.example", "platform": "web" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["code"], "SAVE7");
    assert_eq!(body["redirect_url"], "https://aff.example/acme");
    assert_eq!(body["clicks"], 1);

    let clicks = store
        .offers
        .lock()
        .expect("lock")
        .iter()
        .find(|offer| offer.id == 7)
        .expect("offer 7")
        .click_count;
    assert_eq!(clicks, 1);

    wait_for_audit(&store, 1).await;
    let audit = store.audit.lock().expect("lock");
    assert_eq!(audit[0].offer_ref, "7");
    assert_eq!(audit[0].client_ip, "203.0.113.9");
    assert_eq!(audit[0].referrer.as_deref(), Some("https://search.example"));
}

#[tokio::test]
async fn block_click_uses_the_block_redirect_and_skips_counting() {
    let store = seeded_store();
    let router = test_router(store.clone());

    let (status, body) = post_click(&router, "trending-42-1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["code"], serde_json::Value::Null);
    assert_eq!(body["redirect_url"], "https://go.example/spring");
    assert!(body.get("clicks").is_none());

    let counted: i64 = store
        .offers
        .lock()
        .expect("lock")
        .iter()
        .map(|offer| offer.click_count)
        .sum();
    assert_eq!(counted, 0);

    wait_for_audit(&store, 1).await;
    let audit = store.audit.lock().expect("lock");
    assert_eq!(audit[0].offer_ref, "h2-42-0");
    assert_eq!(audit[0].block_index, Some(0));
}

#[tokio::test]
async fn legacy_merchant_reference_without_blocks_is_not_found() {
    let store = seeded_store();
    let router = test_router(store);

    let (status, body) = post_click(&router, "merchant-43", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn offer_without_any_valid_merchant_url_redirects_nowhere() {
    let store = seeded_store();
    store.offers.lock().expect("lock").push(OfferRecord {
        id: 90,
        uuid: Uuid::new_v4(),
        kind: CouponKind::Deal,
        title: "globex deal".to_string(),
        description: "no links".to_string(),
        code: None,
        ends_at: None,
        click_count: 0,
        featured: false,
        locale: "en".to_string(),
        merchant_id: 43,
        merchant_slug: "globex".to_string(),
        created_at: datetime!(2026-03-01 00:00 UTC),
    });
    let router = test_router(store);

    let (status, body) = post_click(&router, "90", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["redirect_url"], serde_json::Value::Null);
    assert_eq!(body["code"], serde_json::Value::Null);
}

#[tokio::test]
async fn unresolvable_reference_is_not_found() {
    let store = seeded_store();
    let router = test_router(store);

    let (status, body) = post_click(&router, "banner-42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);

    let (status, _) = post_click(&router, "h3-42-9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn thirteenth_click_in_a_window_is_rate_limited() {
    let store = seeded_store();
    let router = test_router(store);

    for _ in 0..12 {
        let (status, _) = post_click(&router, "7", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = post_click(&router, "7", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["ok"], false);

    // a different offer for the same client is still admitted
    let (status, _) = post_click(&router, "8", None).await;
    assert_eq!(status, StatusCode::OK);
}
