// tests/api_tests.rs

use std::sync::Arc;

use blog_backend::{config::Config, repository::MemoryStore, routes, state::AppState};
use serde_json::{Value, json};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let config = Config::for_tests("test_secret_for_integration_tests");
    let state = AppState::new(Arc::new(MemoryStore::new()), config);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Registers a fresh user and returns its bearer token.
async fn register(client: &reqwest::Client, address: &str, name: &str) -> String {
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn create_category(client: &reqwest::Client, address: &str, token: &str, name: &str) -> i64 {
    let response = client
        .post(format!("{}/api/categories", address))
        .bearer_auth(token)
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

async fn create_post(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    payload: Value,
) -> Value {
    let response = client
        .post(format!("{}/api/posts", address))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    body["data"].clone()
}

#[tokio::test]
async fn unknown_route_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn health_reports_ok() {
    let address = spawn_app().await;

    let body: Value = reqwest::get(format!("{}/api/health", address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body, json!({ "success": true, "data": { "status": "ok" } }));
}

#[tokio::test]
async fn register_then_login_and_me() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    register(&client, &address, "Alice").await;

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": "ALICE@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert!(body["data"]["user"].get("password").is_none());

    let me: Value = client
        .get(format!("{}/api/auth/me", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["data"]["name"], "Alice");
    assert_eq!(me["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn register_rejects_duplicate_email_and_bad_input() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    register(&client, &address, "Bob").await;

    let duplicate = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "name": "Bobby", "email": "bob@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status().as_u16(), 409);

    let invalid = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "name": "Carl", "email": "not-an-email", "password": "123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status().as_u16(), 400);
    let body: Value = invalid.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    register(&client, &address, "Dora").await;

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": "dora@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Malformed body too: authentication must reject first.
    let response = client
        .post(format!("{}/api/posts", address))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": false, "error": "Not authorized, no token" })
    );

    let response = client
        .delete(format!("{}/api/posts/1", address))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Not authorized, token failed");
}

#[tokio::test]
async fn create_post_assigns_slug_and_author() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register(&client, &address, "Erin").await;
    let category = create_category(&client, &address, &token, "Rust").await;

    let payload = json!({
        "title": "  Hello, World!  ",
        "content": "First post",
        "category": category,
        "tags": ["intro", " ", "rust "]
    });
    let first = create_post(&client, &address, &token, payload.clone()).await;
    let second = create_post(&client, &address, &token, payload).await;

    assert_eq!(first["title"], "Hello, World!");
    assert_eq!(first["slug"], "hello-world");
    assert_eq!(second["slug"], "hello-world-1");
    assert_eq!(first["author"]["name"], "Erin");
    assert_eq!(first["category"]["name"], "Rust");
    assert_eq!(first["tags"], json!(["intro", "rust"]));
    assert_eq!(first["isPublished"], true);
    assert_eq!(first["viewCount"], 0);
    assert_eq!(first["comments"], json!([]));
}

#[tokio::test]
async fn create_post_validation_errors() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register(&client, &address, "Finn").await;

    let response = client
        .post(format!("{}/api/posts", address))
        .bearer_auth(&token)
        .json(&json!({ "title": "No category", "content": "Body" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0]["field"], "category");

    let response = client
        .post(format!("{}/api/posts", address))
        .bearer_auth(&token)
        .json(&json!({ "title": "Unknown category", "content": "Body", "category": 999 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(format!("{}/api/posts", address))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{\"title\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn list_posts_paginates() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register(&client, &address, "Gina").await;
    let category = create_category(&client, &address, &token, "General").await;

    for i in 0..15 {
        create_post(
            &client,
            &address,
            &token,
            json!({ "title": format!("Post {}", i), "content": "body", "category": category }),
        )
        .await;
    }

    let body: Value = client
        .get(format!("{}/api/posts?page=2&limit=10", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 5);
    assert_eq!(body["total"], 15);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pages"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    // Newest first: the last page holds the oldest posts.
    assert_eq!(body["data"][4]["title"], "Post 0");

    // Garbage numbers fall back to the defaults.
    let body: Value = client
        .get(format!("{}/api/posts?page=abc&limit=-3", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["page"], 1);
    assert_eq!(body["count"], 10);
}

#[tokio::test]
async fn list_posts_filters_by_search_and_category() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register(&client, &address, "Hank").await;
    let news = create_category(&client, &address, &token, "News").await;
    let misc = create_category(&client, &address, &token, "Misc").await;

    for (title, content, category) in [
        ("Hello World", "intro", news),
        ("Greetings", "I say hello to you", misc),
        ("Unrelated", "nothing here", news),
        ("100% done", "progress", misc),
    ] {
        create_post(
            &client,
            &address,
            &token,
            json!({ "title": title, "content": content, "category": category }),
        )
        .await;
    }

    let search = |query: String| {
        let client = client.clone();
        let address = address.clone();
        async move {
            let body: Value = client
                .get(format!("{}/api/posts?{}", address, query))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            body
        }
    };

    let body = search("search=HELLO".to_string()).await;
    assert_eq!(body["total"], 2);

    let body = search(format!("search=hello&category={}", news)).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Hello World");

    // LIKE wildcards are matched literally.
    let body = search("search=%25".to_string()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "100% done");

    // Blank filters are ignored.
    let body = search("search=&category=".to_string()).await;
    assert_eq!(body["total"], 4);

    let response = client
        .get(format!("{}/api/posts?category=abc", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn get_post_counts_views() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register(&client, &address, "Ivy").await;
    let category = create_category(&client, &address, &token, "Views").await;
    let post = create_post(
        &client,
        &address,
        &token,
        json!({ "title": "Popular", "content": "body", "category": category }),
    )
    .await;
    let id = post["id"].as_i64().unwrap();

    for expected in 1..=3 {
        let body: Value = client
            .get(format!("{}/api/posts/{}", address, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["data"]["viewCount"], expected);
    }

    let missing = client
        .get(format!("{}/api/posts/424242", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let malformed = client
        .get(format!("{}/api/posts/not-a-number", address))
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status().as_u16(), 404);
    let body: Value = malformed.json().await.unwrap();
    assert_eq!(body["error"], "Resource not found");
}

#[tokio::test]
async fn only_author_may_update_or_delete() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = register(&client, &address, "Jack").await;
    let intruder = register(&client, &address, "Kate").await;
    let category = create_category(&client, &address, &owner, "Owned").await;
    let post = create_post(
        &client,
        &address,
        &owner,
        json!({ "title": "Mine", "content": "body", "category": category }),
    )
    .await;
    let id = post["id"].as_i64().unwrap();
    let url = format!("{}/api/posts/{}", address, id);

    let response = client
        .put(&url)
        .bearer_auth(&intruder)
        .json(&json!({ "title": "Stolen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client.delete(&url).bearer_auth(&intruder).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .put(&url)
        .bearer_auth(&owner)
        .json(&json!({ "title": "Mine Renamed", "excerpt": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Mine Renamed");
    assert_eq!(body["data"]["slug"], "mine-renamed");
    assert_eq!(body["data"]["excerpt"], "short");

    let response = client.delete(&url).bearer_auth(&owner).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "data": {} }));

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn comments_require_content() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let author = register(&client, &address, "Liam").await;
    let reader = register(&client, &address, "Mona").await;
    let category = create_category(&client, &address, &author, "Talk").await;
    let post = create_post(
        &client,
        &address,
        &author,
        json!({ "title": "Discuss", "content": "body", "category": category }),
    )
    .await;
    let url = format!("{}/api/posts/{}/comments", address, post["id"]);

    let response = client
        .post(&url)
        .bearer_auth(&reader)
        .json(&json!({ "content": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Please provide comment content");

    let response = client
        .post(&url)
        .bearer_auth(&reader)
        .json(&json!({ "content": "Nice post" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    let comments = body["data"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["content"], "Nice post");
    assert_eq!(comments[0]["user"]["name"], "Mona");

    let response = client
        .post(format!("{}/api/posts/424242/comments", address))
        .bearer_auth(&reader)
        .json(&json!({ "content": "Hello?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn categories_endpoints() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register(&client, &address, "Nora").await;

    let zebra = create_category(&client, &address, &token, "Zebra Facts").await;
    create_category(&client, &address, &token, "Apples").await;

    let body: Value = client
        .get(format!("{}/api/categories", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["name"], "Apples");
    assert_eq!(body["data"][1]["slug"], "zebra-facts");

    let body: Value = client
        .get(format!("{}/api/categories/{}", address, zebra))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["name"], "Zebra Facts");

    let duplicate = client
        .post(format!("{}/api/categories", address))
        .bearer_auth(&token)
        .json(&json!({ "name": "Apples" }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status().as_u16(), 409);

    let blank = client
        .post(format!("{}/api/categories", address))
        .bearer_auth(&token)
        .json(&json!({ "name": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status().as_u16(), 400);

    let missing = client
        .get(format!("{}/api/categories/999", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}
