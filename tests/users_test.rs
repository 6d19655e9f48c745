mod common;

use common::spawn_app;
use serde_json::{json, Value};

#[tokio::test]
async fn register_login_and_draft_privacy() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/users/register"))
        .json(&json!({ "email": "alice@example.com", "password": "pw1", "name": "Alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["name"], "Alice");
    assert!(body.get("password").is_none());
    let alice = body["token"].as_str().unwrap().to_string();

    let response = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": "alice@example.com", "password": "pw1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());

    let response = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": "alice@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid password");

    let draft = app
        .create_post("alice@example.com", "Secret plans", "life", false)
        .await;
    assert!(draft.get("published").is_none());
    let draft_id = draft["id"].as_i64().unwrap();
    let draft_url = app.url(&format!("/api/posts/drafts/{draft_id}"));

    let response = app
        .client
        .get(&draft_url)
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["title"], "Secret plans");

    let bob = app.register("bob@example.com", "pw2", "Bob").await;
    let response = app
        .client
        .get(&draft_url)
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = app.client.get(&draft_url).send().await.unwrap();
    assert_eq!(response.status(), 401);

    // The draft never shows up among published posts.
    let posts: Vec<Value> = app
        .client
        .get(app.url("/api/posts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn login_with_unknown_email_is_not_found() {
    let app = spawn_app().await;
    let response = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": "nobody@example.com", "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = spawn_app().await;
    app.register("alice@example.com", "pw1", "Alice").await;

    let response = app
        .client
        .post(app.url("/api/users/register"))
        .json(&json!({ "email": "alice@example.com", "password": "other" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Email already exists");

    let response = app
        .client
        .post(app.url("/api/users/register"))
        .json(&json!({ "email": "carol@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn registration_sends_welcome_email() {
    let app = spawn_app().await;
    app.register("alice@example.com", "pw1", "Alice").await;

    let mailer = app.mailer.clone();
    assert!(
        app.eventually(|| !mailer.sent_to("alice@example.com").is_empty())
            .await
    );
    let mail = &app.mailer.sent_to("alice@example.com")[0];
    assert!(mail.body.contains("Alice"));
}

#[tokio::test]
async fn profile_requires_token_and_checks_current_password() {
    let app = spawn_app().await;
    let alice = app.register("alice@example.com", "pw1", "Alice").await;
    let profile = app.url("/api/users/profile");

    let response = app.client.get(&profile).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let body: Value = app
        .client
        .get(&profile)
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["email"], "alice@example.com");

    let response = app
        .client
        .put(&profile)
        .bearer_auth(&alice)
        .json(&json!({ "password": "pw9", "currentPassword": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = app
        .client
        .put(&profile)
        .bearer_auth(&alice)
        .json(&json!({ "email": "mallory@example.com", "name": "Mallory" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = app
        .client
        .put(&profile)
        .bearer_auth(&alice)
        .json(&json!({ "name": "Alice B.", "password": "pw9", "currentPassword": "pw1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Alice B.");

    let response = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": "alice@example.com", "password": "pw9" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn user_search_pages_and_short_terms() {
    let app = spawn_app().await;
    app.register("alice@example.com", "pw", "Alice").await;
    app.register("alan@example.com", "pw", "Alan").await;
    app.register("bob@example.com", "pw", "Bob").await;

    let body: Value = app
        .client
        .get(app.url("/api/users/search?query=al&size=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalElements"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["content"][0]["name"], "Alan");

    // Out-of-range paging is clamped rather than rejected.
    let body: Value = app
        .client
        .get(app.url("/api/users/search?query=al&page=-4&size=500"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["number"], 0);
    assert_eq!(body["size"], 10);

    let body: Value = app
        .client
        .get(app.url(&format!("/api/users/search?query=al&page={}", i64::MAX)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalElements"], 2);
    assert!(body["content"].as_array().unwrap().is_empty());

    let users: Vec<Value> = app
        .client
        .get(app.url("/api/users?search=a"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(users.is_empty());

    let body: Value = app
        .client
        .get(app.url("/api/users/by-initial/b"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalElements"], 1);
    assert_eq!(body["content"][0]["email"], "bob@example.com");
}

#[tokio::test]
async fn unknown_route_and_health() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/api/nope")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("nope"));

    let body: Value = app
        .client
        .get(app.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");

    let text = app
        .client
        .get(app.url("/check_health"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(text, "alive");
}
