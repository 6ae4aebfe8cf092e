//! Integration tests for the hotel catalog.

use std::sync::atomic::Ordering;

use reqwest::StatusCode;
use staybook_integration_tests::TestContext;

fn card_count(html: &str) -> usize {
    html.matches(r#"<article class="hotel-card"#).count()
}

#[tokio::test]
async fn test_search_narrows_listing() {
    let ctx = TestContext::start().await;

    let resp = ctx
        .client
        .get(ctx.url("/hotels?search=lisbon"))
        .send()
        .await
        .expect("Failed to get hotels");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read response");
    assert_eq!(card_count(&body), 4);
    assert!(body.contains("Alfama Rooms"));
    assert!(!body.contains("Canal Inn"));
    assert!(body.contains("Clear filters"));
}

#[tokio::test]
async fn test_price_band_and_availability_filter() {
    let ctx = TestContext::start().await;

    let body = ctx
        .client
        .get(ctx.url("/hotels?min_price=50&max_price=150&available_only=true"))
        .send()
        .await
        .expect("Failed to get hotels")
        .text()
        .await
        .expect("Failed to read response");

    assert_eq!(card_count(&body), 4);
    for name in ["Alfama Rooms", "Tagus View", "Chiado House", "Ringstrasse Hotel"] {
        assert!(body.contains(name), "{name} missing");
    }
    assert!(!body.contains("Prater Stay"));
    assert_eq!(ctx.mock.counts().hotels.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unfiltered_listing_shows_everything() {
    let ctx = TestContext::start().await;

    let body = ctx
        .client
        .get(ctx.url("/hotels"))
        .send()
        .await
        .expect("Failed to get hotels")
        .text()
        .await
        .expect("Failed to read response");

    assert_eq!(card_count(&body), 10);
    assert!(!body.contains("Clear filters"));
}

#[tokio::test]
async fn test_price_sort_and_availability() {
    let ctx = TestContext::start().await;

    let body = ctx
        .client
        .get(ctx.url("/hotels?available_only=true&sort_by=price_low&max_price=100"))
        .send()
        .await
        .expect("Failed to get hotels")
        .text()
        .await
        .expect("Failed to read response");

    // Prater Stay ($75) is unavailable
    assert_eq!(card_count(&body), 2);
    let hostel = body.find("Old Town Hostel").expect("hostel listed");
    let alfama = body.find("Alfama Rooms").expect("alfama listed");
    assert!(hostel < alfama);
    assert!(!body.contains("Prater Stay"));
}

#[tokio::test]
async fn test_invalid_price_is_reported_without_request() {
    let ctx = TestContext::start().await;

    let body = ctx
        .client
        .get(ctx.url("/hotels?min_price=cheap"))
        .send()
        .await
        .expect("Failed to get hotels")
        .text()
        .await
        .expect("Failed to read response");

    assert!(body.contains("alert-error"));
    assert_eq!(card_count(&body), 0);
    assert_eq!(ctx.mock.counts().hotels.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_home_shows_featured_hotels() {
    let ctx = TestContext::start().await;

    let body = ctx
        .client
        .get(ctx.url("/"))
        .send()
        .await
        .expect("Failed to get home page")
        .text()
        .await
        .expect("Failed to read response");

    assert_eq!(card_count(&body), 6);
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::start().await;

    let resp = ctx
        .client
        .get(ctx.url("/health"))
        .send()
        .await
        .expect("Failed to get health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}
