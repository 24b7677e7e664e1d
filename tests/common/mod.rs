#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use vidstream::services::cache::CacheService;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::set_var("BCRYPT_COST", "4");
        let config = vidstream::config::jwt::JwtConfig::from_env().unwrap();
        let _ = vidstream::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub cache: CacheService,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }

    /// Raw SQL count helper for asserting on stored rows.
    pub async fn count_rows(&self, sql: &str, values: Vec<sea_orm::Value>) -> i64 {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                sql,
                values,
            ))
            .await
            .expect("count query failed")
            .expect("count query returned no row");
        row.try_get_by_index::<i64>(0).expect("count column")
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_with_cache(CacheService::disabled()).await
}

/// Like [`spawn_app`] but with the Redis count cache switched on. Returns
/// `None` when `REDIS_URL` is unreachable so the caller can skip.
pub async fn spawn_app_with_redis() -> Option<TestApp> {
    init_env();
    let mut conn = match vidstream::config::redis::get_redis().await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("skipping: redis unavailable: {e}");
            return None;
        }
    };

    // Ids restart with every truncate, so counts cached by an earlier run
    // would otherwise be served for the new rows.
    let keys: Vec<String> = redis::cmd("KEYS")
        .arg("reactions:count:*")
        .query_async(&mut conn)
        .await
        .expect("Failed to list cached counts");
    if !keys.is_empty() {
        redis::cmd("DEL")
            .arg(keys)
            .query_async::<()>(&mut conn)
            .await
            .expect("Failed to clear cached counts");
    }

    Some(spawn_with_cache(CacheService::new(conn)).await)
}

async fn spawn_with_cache(cache: CacheService) -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        vidstream::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    cleanup_tables(&db).await;

    let hub = vidstream::websocket::hub::NotificationHub::new();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(vidstream::routes::create_routes())
        .layer(axum::middleware::from_fn(
            vidstream::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(hub))
        .layer(axum::extract::Extension(cache.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        cache,
        client: Client::new(),
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "refresh_tokens",
        "notifications",
        "reactions",
        "reviews",
        "comments",
        "videos",
        "members",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub token: String,
    pub refresh_token: String,
}

/// Register a member with a unique name derived from `prefix`.
pub async fn create_test_user(app: &TestApp, prefix: &str) -> TestUser {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let username = format!("{}_{}", prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@test.com", username),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: Value = resp.json().await.expect("register response is JSON");
    assert!(
        body["success"].as_bool().unwrap_or(false),
        "Failed to register '{}': status={}, body={}",
        username,
        status,
        body
    );

    TestUser {
        id: body["data"]["member_id"].as_i64().expect("member_id") as i32,
        username,
        token: body["data"]["token"].as_str().expect("token").to_string(),
        refresh_token: body["data"]["refresh_token"]
            .as_str()
            .expect("refresh_token")
            .to_string(),
    }
}

/// Create a video owned by `token`'s member and return its id.
pub async fn create_test_video(app: &TestApp, token: &str) -> i32 {
    let resp = app
        .client
        .post(app.url("/videos"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": "Test Video",
            "description": "A test video",
            "kind": "video"
        }))
        .send()
        .await
        .expect("Failed to create video");

    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().expect("video id") as i32
}

/// Post a comment on `video_id` and return its id.
pub async fn create_test_comment(
    app: &TestApp,
    token: &str,
    video_id: i32,
    parent_id: Option<i32>,
) -> i32 {
    let resp = app
        .client
        .post(app.url(&format!("/videos/{}/comments", video_id)))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "content": "Nice one",
            "parent_id": parent_id
        }))
        .send()
        .await
        .expect("Failed to create comment");

    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().expect("comment id") as i32
}

/// Make a member admin by directly updating the database.
pub async fn make_admin(db: &DatabaseConnection, member_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE members SET role = 'admin' WHERE id = $1",
        vec![member_id.into()],
    ))
    .await
    .expect("Failed to make member admin");
}

pub async fn notification_count(app: &TestApp, recipient_id: i32, kind: &str) -> i64 {
    app.count_rows(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND kind = $2",
        vec![recipient_id.into(), kind.into()],
    )
    .await
}
