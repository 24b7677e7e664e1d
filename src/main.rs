use axum::{extract::Extension, middleware, response::IntoResponse, routing::get, Json, Router};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use vidstream::config::{self, app::AppConfig};
use vidstream::services::cache::CacheService;
use vidstream::websocket::hub::NotificationHub;
use vidstream::{handlers, migration, utils};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh_token,
        handlers::auth::logout,
        handlers::auth::get_current_member,
        // Video routes
        handlers::video::create_video,
        handlers::video::list_videos,
        handlers::video::get_video,
        handlers::video::delete_video,
        // Comment routes
        handlers::comment::list_comments,
        handlers::comment::create_comment,
        handlers::comment::delete_comment,
        // Review routes
        handlers::review::create_review,
        handlers::review::list_reviews,
        // Reaction routes
        handlers::reaction::toggle_reaction,
        handlers::reaction::get_counts,
        handlers::reaction::get_user_reaction,
        // Notification routes
        handlers::notification::list_notifications,
        handlers::notification::unread_count,
        handlers::notification::mark_all_read,
        handlers::notification::mark_read,
    ),
    components(
        schemas(
            vidstream::response::ApiResponse<serde_json::Value>,
            vidstream::response::PaginatedResponse<serde_json::Value>,
            vidstream::response::PaginationQuery,
            vidstream::error::AppError,
            // Auth
            handlers::auth::RegisterRequest,
            handlers::auth::LoginRequest,
            handlers::auth::RefreshTokenRequest,
            handlers::auth::AuthResponse,
            handlers::auth::TokenResponse,
            handlers::auth::MemberResponse,
            // Video
            handlers::video::CreateVideoRequest,
            handlers::video::VideoResponse,
            handlers::video::VideoListQuery,
            vidstream::services::video::VideoKind,
            // Comment
            handlers::comment::CreateCommentRequest,
            handlers::comment::CommentResponse,
            handlers::comment::CommentThreadResponse,
            // Review
            handlers::review::CreateReviewRequest,
            handlers::review::ReviewResponse,
            // Reaction
            handlers::reaction::ToggleReactionRequest,
            handlers::reaction::ReactionResponse,
            handlers::reaction::RemovedResponse,
            vidstream::services::reaction::TargetType,
            vidstream::services::reaction::ReactionCounts,
            vidstream::services::reaction::UserReaction,
            // Notification
            vidstream::models::NotificationModel,
            handlers::notification::UnreadCount,
            handlers::notification::MarkedRead,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and token rotation"),
        (name = "videos", description = "Video catalog"),
        (name = "comments", description = "Video comments and replies"),
        (name = "reviews", description = "Video reviews"),
        (name = "reactions", description = "Like/dislike toggling and counts"),
        (name = "notifications", description = "Member notifications"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let app_config = AppConfig::from_env();
    init_tracing(app_config.json_logs);

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!(env = ?app_config.env, "Starting vidstream v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let hub = NotificationHub::new();

    // Redis is optional; reaction counts fall back to direct reads
    let cache = match config::redis::get_redis().await {
        Ok(conn) => {
            tracing::info!("Redis connected successfully");
            CacheService::new(conn)
        }
        Err(e) => {
            tracing::warn!("Redis unavailable, running without cache: {}", e);
            CacheService::disabled()
        }
    };

    let app = create_app()
        .layer(Extension(db))
        .layer(Extension(hub))
        .layer(Extension(cache));

    let addr = app_config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn init_tracing(json_logs: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vidstream=debug,tower_http=debug,axum=debug".into());

    let (json_layer, plain_layer) = if json_logs {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(plain_layer)
        .init();
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<config::jwt::JwtConfig> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // Checked here for an early error; the connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(vidstream::routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(
            vidstream::middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "vidstream",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
