// tests/postgres_tests.rs
//
// Runs the same flows against PgStore. Skipped unless DATABASE_URL is set.

use std::sync::Arc;

use blog_backend::{
    client::BlogClient,
    config::Config,
    models::{
        post::{PostQuery, PostRequest},
        user::RegisterRequest,
    },
    repository::PgStore,
    routes,
    state::AppState,
};
use reqwest::StatusCode;
use sqlx::postgres::PgPoolOptions;

/// Returns `None` when no database is configured.
async fn spawn_app() -> Option<String> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping Postgres test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let mut config = Config::for_tests("test_secret_for_postgres_tests");
    config.database_url = Some(database_url);
    let state = AppState::new(Arc::new(PgStore::new(pool)), config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(address)
}

#[tokio::test]
async fn postgres_post_lifecycle() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let unique = uuid::Uuid::new_v4().simple().to_string();

    let mut client = BlogClient::new(&address).unwrap();
    client
        .register(&RegisterRequest {
            name: "Sam".to_string(),
            email: format!("sam_{}@example.com", unique),
            password: "password123".to_string(),
        })
        .await
        .unwrap();

    let category = client
        .create_category(&format!("Pg {}", unique), None)
        .await
        .unwrap();

    let title = format!("Postgres {} 50% off", unique);
    let request = PostRequest {
        title: Some(title.clone()),
        content: Some("Indexes and joins".to_string()),
        category: Some(category.id),
        tags: Some(vec!["db".to_string()]),
        ..Default::default()
    };
    let first = client.create_post(&request).await.unwrap();
    let second = client.create_post(&request).await.unwrap();
    let base = first.slug.clone().unwrap();
    assert_eq!(second.slug, Some(format!("{}-1", base)));

    assert_eq!(client.get_post(first.id).await.unwrap().view_count, 1);
    assert_eq!(client.get_post(first.id).await.unwrap().view_count, 2);

    let page = client
        .list_posts(
            &PostQuery::new(1, 1)
                .with_category(category.id)
                .with_search("50% OFF"),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.pages, 2);
    assert_eq!(page.posts[0].id, second.id);

    let commented = client.add_comment(first.id, "Solid").await.unwrap();
    assert_eq!(commented.comments[0].author_name(), "Sam");

    client.delete_post(first.id).await.unwrap();
    client.delete_post(second.id).await.unwrap();
    let err = client.get_post(first.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    let err = client
        .create_post(&PostRequest {
            category: Some(i64::MAX),
            ..request
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}
