//! Store owner console: profile, create, edit and delete.

use bento_integration_tests::{TestContext, bento_form, location};

async fn store_owner() -> TestContext {
    let ctx = TestContext::start().await;
    ctx.services.add_store("s1", "Sakura Bento");
    ctx.services.add_item("s1", "42", "Pork Bento", 3);
    ctx.login("store", "s1").await;
    ctx
}

#[tokio::test]
async fn test_console_requires_store_login() {
    let ctx = TestContext::start().await;
    let response = ctx.get("/console").await;
    assert_eq!(location(&response), "/auth/login/store");

    ctx.login("consumer", "c1").await;
    let response = ctx.get("/console").await;
    assert_eq!(location(&response), "/auth/login/store");
}

#[tokio::test]
async fn test_console_lists_own_bentos() {
    let ctx = store_owner().await;
    ctx.services.add_item("s2", "99", "Other Store Bento", 1);

    let html = ctx.page("/console").await;
    assert!(html.contains("Sakura Bento"));
    assert!(html.contains("Pork Bento"));
    assert!(!html.contains("Other Store Bento"));
}

#[tokio::test]
async fn test_save_new_store_profile_falls_back_to_set() {
    let ctx = TestContext::start().await;
    ctx.login("store", "s9").await;

    let response = ctx
        .post_form(
            "/console/store",
            &[
                ("name", "New Shop"),
                ("address", "1 Main St"),
                ("phone", "555-0100"),
                ("description", "Fresh daily"),
            ],
        )
        .await;
    assert_eq!(response.status(), 200);
    let html = response.text().await.unwrap_or_default();
    assert!(html.contains("New Shop"));
    assert!(html.contains("Saved."));

    assert_eq!(ctx.services.calls_to("/stores/update"), 1);
    assert_eq!(ctx.services.calls_to("/stores/set"), 1);

    // The directory is refreshed after the save.
    let html = ctx.page("/").await;
    assert!(html.contains("New Shop"));
}

#[tokio::test]
async fn test_create_bento_resyncs() {
    let ctx = store_owner().await;

    let form = bento_form("Chicken Bento", "Teriyaki", "5").part(
        "image",
        reqwest::multipart::Part::bytes(vec![0xff, 0xd8, 0xff])
            .file_name("chicken.jpg")
            .mime_str("image/jpeg")
            .unwrap_or_else(|_| reqwest::multipart::Part::bytes(Vec::new())),
    );
    let response = ctx.post_multipart("/console/items", form).await;
    assert_eq!(response.status(), 200);
    let html = response.text().await.unwrap_or_default();
    assert!(html.contains("Chicken Bento"));
    assert!(html.contains("Pork Bento"));
    assert!(html.contains("-upload.jpg"));

    let state = ctx.services.state();
    let (path, body) = state.writes.last().cloned().unwrap_or_default();
    assert_eq!(path, "/items/create");
    assert_eq!(body["storeId"], "s1");
    assert_eq!(body["quantity"], 5);
    assert_eq!(body["contentType"], "image/jpeg");
    assert!(!body["itemId"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_create_bento_rejects_bad_quantity() {
    let ctx = store_owner().await;

    let response = ctx
        .post_multipart("/console/items", bento_form("Chicken Bento", "", "lots"))
        .await;
    assert_eq!(location(&response), "/console?alert=invalid_input");
    assert_eq!(ctx.services.calls_to("/items/create"), 0);
}

#[tokio::test]
async fn test_edit_selected_bento() {
    let ctx = store_owner().await;

    let html = ctx.page("/console?selected=42").await;
    assert!(html.contains("Edit Pork Bento"));

    let response = ctx
        .post_multipart("/console/items/42", bento_form("Pork Bento Deluxe", "", "7"))
        .await;
    assert_eq!(response.status(), 200);
    let html = response.text().await.unwrap_or_default();
    assert!(html.contains("Pork Bento Deluxe"));
    assert!(!html.contains("Edit Pork Bento"));

    let state = ctx.services.state();
    let (path, body) = state.writes.last().cloned().unwrap_or_default();
    assert_eq!(path, "/items/update");
    assert_eq!(body["quantity"], 7);
    assert!(body.get("image").is_none());
}

#[tokio::test]
async fn test_save_without_selection_is_refused() {
    let ctx = store_owner().await;

    let response = ctx
        .post_multipart("/console/items/42", bento_form("Pork Bento", "", "1"))
        .await;
    assert_eq!(location(&response), "/console?alert=no_selection");
    assert_eq!(ctx.services.calls_to("/items/update"), 0);
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let ctx = store_owner().await;

    let html = ctx.page("/console/items/42/delete").await;
    assert!(html.contains("Delete Pork Bento?"));

    let response = ctx
        .post_form("/console/items/42/delete", &[("confirm", "no")])
        .await;
    assert_eq!(location(&response), "/console");
    assert_eq!(ctx.services.calls_to("/items/delete"), 0);

    let response = ctx
        .post_form("/console/items/42/delete", &[("confirm", "yes")])
        .await;
    assert_eq!(response.status(), 200);
    let html = response.text().await.unwrap_or_default();
    assert!(html.contains("Deleted."));
    assert!(!html.contains("Pork Bento"));
    assert_eq!(ctx.services.calls_to("/items/delete"), 1);
}

#[tokio::test]
async fn test_failed_write_leaves_catalog_alone() {
    let ctx = store_owner().await;
    ctx.services.state().fail_writes = true;

    let response = ctx
        .post_form("/console/items/42/delete", &[("confirm", "yes")])
        .await;
    assert_eq!(location(&response), "/console?alert=delete_failed");

    let html = ctx.page("/console").await;
    assert!(html.contains("Pork Bento"));
}

#[tokio::test]
async fn test_writes_carry_bearer_credential() {
    let ctx = store_owner().await;
    ctx.post_multipart("/console/items", bento_form("Chicken Bento", "", "1"))
        .await;

    // The fake API answers 401 to writes without a bearer token.
    let html = ctx.page("/console").await;
    assert!(html.contains("Chicken Bento"));
}
