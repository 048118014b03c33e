//! Store directory, store pages and favorites.

use bento_integration_tests::{TestContext, location};

#[tokio::test]
async fn test_home_lists_stores() {
    let ctx = TestContext::start().await;
    ctx.services.add_store("s1", "Sakura Bento");
    ctx.services.add_store("s2", "Umami House");

    let html = ctx.page("/").await;
    assert!(html.contains("Sakura Bento"));
    assert!(html.contains("/stores/s2"));
}

#[tokio::test]
async fn test_home_empty_state() {
    let ctx = TestContext::start().await;
    let html = ctx.page("/").await;
    assert!(html.contains("No stores are open right now."));
}

#[tokio::test]
async fn test_store_page_resolves_images() {
    let ctx = TestContext::start().await;
    ctx.services.add_store("s1", "Sakura Bento");
    ctx.services.add_item("s1", "42", "Pork Bento", 3);
    ctx.services.add_item("s1", "43", "Salmon Bento", 0);
    ctx.services.add_item("s2", "99", "Other Store Bento", 5);

    let html = ctx.page("/stores/s1").await;
    assert!(html.contains("Pork Bento"));
    assert!(html.contains("https://cdn.bento.test/42.jpg"));
    assert!(html.contains("3 left"));
    assert!(html.contains("Sold out"));
    assert!(!html.contains("Other Store Bento"));
    assert_eq!(ctx.services.calls_to("/images/url"), 2);
}

#[tokio::test]
async fn test_unresolvable_image_uses_placeholder() {
    let ctx = TestContext::start().await;
    ctx.services.add_item("s1", "42", "Pork Bento", 3);
    ctx.services.state().images.clear();

    let html = ctx.page("/stores/s1").await;
    assert!(html.contains("/static/images/bento-placeholder.svg"));
}

#[tokio::test]
async fn test_store_page_for_store_without_bentos() {
    let ctx = TestContext::start().await;
    let html = ctx.page("/stores/nobody").await;
    assert!(html.contains("This store has no bentos yet."));
}

// ============================================================================
// Favorites
// ============================================================================

#[tokio::test]
async fn test_anonymous_favorite_asks_for_login() {
    let ctx = TestContext::start().await;
    ctx.services.add_item("s1", "42", "Pork Bento", 3);

    let response = ctx
        .post_form(
            "/favorites/42",
            &[("favorite", "true"), ("return_to", "/stores/s1")],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/stores/s1?alert=login_required");
    assert_eq!(ctx.services.calls_to("/favorites/set"), 0);
}

#[tokio::test]
async fn test_consumer_favorites_round_trip() {
    let ctx = TestContext::start().await;
    ctx.services.add_item("s1", "42", "Pork Bento", 3);
    ctx.login("consumer", "c1").await;

    let html = ctx.page("/stores/s1").await;
    assert!(html.contains("Favorite</button>"));
    assert!(!html.contains("Favorited"));

    let response = ctx
        .post_form(
            "/favorites/42",
            &[("favorite", "true"), ("return_to", "/stores/s1")],
        )
        .await;
    assert_eq!(location(&response), "/stores/s1");
    assert!(
        ctx.services
            .state()
            .favorites
            .contains(&("c1".to_string(), "42".to_string()))
    );

    let html = ctx.page("/stores/s1").await;
    assert!(html.contains("Favorited"));

    ctx.post_form(
        "/favorites/42",
        &[("favorite", "false"), ("return_to", "/stores/s1")],
    )
    .await;
    assert!(ctx.services.state().favorites.is_empty());
}

#[tokio::test]
async fn test_store_account_cannot_favorite() {
    let ctx = TestContext::start().await;
    ctx.services.add_item("s1", "42", "Pork Bento", 3);
    ctx.login("store", "s1").await;

    let html = ctx.page("/stores/s1").await;
    assert!(!html.contains("Favorite</button>"));

    let response = ctx
        .post_form(
            "/favorites/42",
            &[("favorite", "true"), ("return_to", "/stores/s1")],
        )
        .await;
    assert_eq!(location(&response), "/stores/s1?alert=consumer_only");
}

#[tokio::test]
async fn test_favorite_return_path_must_be_local() {
    let ctx = TestContext::start().await;

    let response = ctx
        .post_form(
            "/favorites/42",
            &[("favorite", "true"), ("return_to", "https://evil.test/")],
        )
        .await;
    assert_eq!(location(&response), "/?alert=login_required");
}
