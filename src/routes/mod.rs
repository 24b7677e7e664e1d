use crate::config::rate_limit::{RateLimitConfig, RouteGroup};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use crate::websocket;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        // Authenticated inside the handler through the `token` query parameter
        .route("/ws", routing::get(websocket::notification::ws_handler))
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::auth::register))
        .route("/auth/login", routing::post(handlers::auth::login))
        .route(
            "/auth/refresh",
            routing::post(handlers::auth::refresh_token),
        );

    with_optional_rate_limit(router, config, RouteGroup::Auth)
}

fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Videos
        .route("/videos", routing::get(handlers::video::list_videos))
        .route("/videos/{id}", routing::get(handlers::video::get_video))
        .route(
            "/videos/{id}/comments",
            routing::get(handlers::comment::list_comments),
        )
        .route(
            "/videos/{id}/reviews",
            routing::get(handlers::review::list_reviews),
        )
        // Reactions
        .route(
            "/likes-dislikes/{target_type}/{target_id}",
            routing::get(handlers::reaction::get_counts),
        );

    with_optional_rate_limit(router, config, RouteGroup::Public)
}

fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::auth::get_current_member))
        .route("/auth/logout", routing::post(handlers::auth::logout))
        // Videos
        .route("/videos", routing::post(handlers::video::create_video))
        .route(
            "/videos/{id}",
            routing::delete(handlers::video::delete_video),
        )
        // Comments
        .route(
            "/videos/{id}/comments",
            routing::post(handlers::comment::create_comment),
        )
        .route(
            "/comments/{id}",
            routing::delete(handlers::comment::delete_comment),
        )
        // Reviews
        .route(
            "/videos/{id}/reviews",
            routing::post(handlers::review::create_review),
        )
        // Reactions
        .route(
            "/likes-dislikes",
            routing::post(handlers::reaction::toggle_reaction),
        )
        .route(
            "/likes-dislikes/user/{target_type}/{target_id}",
            routing::get(handlers::reaction::get_user_reaction),
        )
        // Notifications
        .route(
            "/notifications",
            routing::get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            routing::get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/read-all",
            routing::put(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            routing::put(handlers::notification::mark_read),
        );

    with_optional_rate_limit(router, config, RouteGroup::Protected)
}

fn with_optional_rate_limit(router: Router, config: &RateLimitConfig, group: RouteGroup) -> Router {
    if !config.enabled {
        return router;
    }

    let rule = config.rule(group);
    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::warn!(?group, ?rule, "invalid rate limit rule, group left unlimited");
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}
