//! Hosted-UI login, callback and logout.

use bento_integration_tests::{GARBLED_TOKEN_CODE, TestContext, location};

#[tokio::test]
async fn test_login_redirects_to_hosted_ui() {
    let ctx = TestContext::start().await;

    let response = ctx.get("/auth/login/store").await;
    assert_eq!(response.status(), 303);
    let target = location(&response);
    assert!(target.contains("/oauth2/authorize?"));
    assert!(target.contains("client_id=store-client"));
    assert!(target.contains("state="));
}

#[tokio::test]
async fn test_unknown_principal_is_rejected() {
    let ctx = TestContext::start().await;
    let response = ctx.get("/auth/login/admin").await;
    assert_eq!(location(&response), "/?alert=login_failed");
}

#[tokio::test]
async fn test_consumer_login_shows_name() {
    let ctx = TestContext::start().await;

    let response = ctx.login("consumer", "c1").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/");

    let html = ctx.page("/").await;
    assert!(html.contains("c1"));
    assert!(html.contains("Log out"));
    assert!(!html.contains(r#"href="/console""#));
}

#[tokio::test]
async fn test_store_login_shows_console_link() {
    let ctx = TestContext::start().await;
    ctx.login("store", "s1").await;

    let html = ctx.page("/").await;
    assert!(html.contains(r#"href="/console""#));
}

#[tokio::test]
async fn test_callback_with_wrong_state_fails() {
    let ctx = TestContext::start().await;
    ctx.get("/auth/login/consumer").await;

    let response = ctx.get("/auth/callback?code=c1&state=forged").await;
    assert_eq!(location(&response), "/?alert=login_failed");

    let html = ctx.page("/").await;
    assert!(html.contains("Log in"));
}

#[tokio::test]
async fn test_callback_for_other_pool_fails() {
    let ctx = TestContext::start().await;
    let response = ctx.get("/auth/login/consumer").await;
    let state = location(&response)
        .split("state=")
        .nth(1)
        .unwrap_or_default()
        .to_string();

    let response = ctx
        .get(&format!("/auth/callback/store?code=s1&state={state}"))
        .await;
    assert_eq!(location(&response), "/?alert=login_failed");
}

#[tokio::test]
async fn test_rejected_code_fails() {
    let ctx = TestContext::start().await;
    let response = ctx.login("consumer", "denied").await;
    assert_eq!(location(&response), "/?alert=login_failed");
}

#[tokio::test]
async fn test_undecodable_token_logs_visitor_out() {
    let ctx = TestContext::start().await;
    ctx.login("consumer", "c1").await;
    assert!(ctx.page("/").await.contains("Log out"));

    let response = ctx.login("consumer", GARBLED_TOKEN_CODE).await;
    assert_eq!(location(&response), "/?alert=login_failed");

    let html = ctx.page("/").await;
    assert!(html.contains("Log in"));
    assert!(!html.contains("Log out"));
    assert!(!html.contains(r#"<span class="who">c1</span>"#));
}

#[tokio::test]
async fn test_provider_error_fails() {
    let ctx = TestContext::start().await;
    ctx.get("/auth/login/consumer").await;

    let response = ctx
        .get("/auth/callback?error=access_denied&error_description=nope")
        .await;
    assert_eq!(location(&response), "/?alert=login_failed");
}

#[tokio::test]
async fn test_logout_clears_session() {
    let ctx = TestContext::start().await;
    ctx.login("consumer", "c1").await;

    let response = ctx.post_form("/auth/logout", &[]).await;
    assert_eq!(response.status(), 303);
    let target = location(&response);
    assert!(target.contains("/logout?client_id=consumer-client"));
    assert!(target.contains("logout_uri="));

    let html = ctx.page("/").await;
    assert!(html.contains("Log in"));
    assert!(!html.contains("Log out"));
}
