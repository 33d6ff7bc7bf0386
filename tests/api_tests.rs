mod common;

use common::{ADMIN_PASSWORD, ADMIN_USERNAME, seeded_repo, test_state};
use postdesk::{
    PostPolicy, create_router,
    models::{LoginResponse, PostListResponse, PostResponse, PostStatus},
};
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

/// Serves the full router on an ephemeral port, backed by the in-memory store.
async fn spawn_app(policy: PostPolicy) -> TestApp {
    let (repo, _) = seeded_repo().await;
    let router = create_router(test_state(repo, policy));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

async fn login(client: &reqwest::Client, app: &TestApp) -> String {
    let response = client
        .post(format!("{}/login", app.address))
        .json(&serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(response.status(), 200);
    let body: LoginResponse = response.json().await.unwrap();
    body.token
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app(PostPolicy::Publishing).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app(PostPolicy::Publishing).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api-docs/openapi.json", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let doc: serde_json::Value = response.json().await.unwrap();
    assert!(doc["paths"].get("/login").is_some());
    assert!(doc["paths"].get("/posts/{id}").is_some());
}

#[tokio::test]
async fn test_post_lifecycle_hard_delete() {
    let app = spawn_app(PostPolicy::Publishing).await;
    let client = reqwest::Client::new();
    let token = login(&client, &app).await;

    // Create
    let response = client
        .post(format!("{}/posts", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "Hello", "content": "# Body", "category": "news" }))
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), 201);
    let created: PostResponse = response.json().await.unwrap();
    assert_eq!(created.data.status, PostStatus::Published);

    // Read back
    let fetched: PostResponse = client
        .get(format!("{}/posts/{}", app.address, created.data.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched.data, created.data);

    // Update
    let response = client
        .put(format!("{}/posts/{}", app.address, created.data.id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "Hello again", "content": "# Body", "category": "news" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let updated: PostResponse = response.json().await.unwrap();
    assert_eq!(updated.data.title, "Hello again");
    assert!(updated.data.updated_at > created.data.updated_at);

    // Delete
    let response = client
        .delete(format!("{}/posts/{}", app.address, created.data.id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let list: PostListResponse = client
        .get(format!("{}/posts", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.count, 0);
    assert!(list.data.is_empty());
}

#[tokio::test]
async fn test_drafting_deployment_keeps_caller_status() {
    let app = spawn_app(PostPolicy::Drafting).await;
    let client = reqwest::Client::new();
    let token = login(&client, &app).await;

    let response = client
        .post(format!("{}/posts", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Ready", "content": "c", "category": "news", "status": "published"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let created: PostResponse = response.json().await.unwrap();
    assert_eq!(created.data.status, PostStatus::Published);
}
