//! services/api/src/web/routes.rs
//!
//! Assembles the full application router.

use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::rest::{root_handler, seed_handler, ApiDoc};
use crate::web::state::AppState;
use crate::web::{auth, external, personalization, titles};

/// Builds the `/api` router plus Swagger UI, with CORS and request tracing applied.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let auth_routes = Router::new()
        .route("/login", get(auth::login_handler))
        .route("/callback", get(auth::callback_handler))
        .route("/user/{id}", get(auth::get_user_handler));

    let title_routes = Router::new()
        .route(
            "/",
            get(titles::list_titles_handler).post(titles::create_title_handler),
        )
        .route("/featured", get(titles::featured_titles_handler))
        .route("/trending", get(titles::trending_titles_handler))
        .route("/recent", get(titles::recent_titles_handler))
        .route("/genres", get(titles::genres_handler))
        .route(
            "/{id}",
            get(titles::get_title_handler)
                .put(titles::update_title_handler)
                .delete(titles::delete_title_handler),
        )
        .route(
            "/{id}/episodes",
            get(titles::list_episodes_handler).post(titles::add_episode_handler),
        )
        .route(
            "/{id}/episodes/{number}",
            delete(titles::remove_episode_handler),
        );

    let user_routes = Router::new()
        .route("/{user_id}/watchlist", get(personalization::get_watchlist_handler))
        .route(
            "/{user_id}/watchlist/{title_id}",
            post(personalization::add_to_watchlist_handler)
                .delete(personalization::remove_from_watchlist_handler),
        )
        .route(
            "/{user_id}/watchlist/{title_id}/check",
            get(personalization::check_watchlist_handler),
        )
        .route("/{user_id}/favorites", get(personalization::get_favorites_handler))
        .route(
            "/{user_id}/favorites/{title_id}",
            post(personalization::add_to_favorites_handler)
                .delete(personalization::remove_from_favorites_handler),
        )
        .route(
            "/{user_id}/favorites/{title_id}/check",
            get(personalization::check_favorites_handler),
        )
        .route(
            "/{user_id}/history",
            get(personalization::get_history_handler).post(personalization::record_history_handler),
        );

    let external_routes = Router::new()
        .route("/search", get(external::search_handler))
        .route("/import/{external_id}", post(external::import_handler));

    let api_router = Router::new()
        .route("/api", get(root_handler))
        .route("/api/", get(root_handler))
        .route("/api/seed", post(seed_handler))
        .nest("/api/auth", auth_routes)
        .nest("/api/titles", title_routes)
        .nest("/api/users", user_routes)
        .nest("/api/external", external_routes)
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(methods)
        .allow_headers(Any)
}
