pub mod auth;
pub mod categories;
pub mod error;
pub mod health;
pub mod middleware;
pub mod permissions;
pub mod sentences;
pub mod state;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use state::AppState;

/// Every route the service exposes. Authentication is enforced per handler
/// through the `AuthUser` extractor, so public and protected routes share
/// one router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Users
        .route("/user/", post(users::register))
        .route("/user/token", post(auth::login))
        .route("/user/me", get(users::me))
        .route("/user/{id}", patch(users::update_user))
        // Categories
        .route(
            "/sentence/category",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/sentence/category/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        // Moderation
        .route("/sentence/admin/paginated", get(sentences::paginated))
        .route("/sentence/admin/batch/status", post(sentences::batch_status))
        .route("/sentence/admin/batch/delete", post(sentences::batch_delete))
        // Likes
        .route("/sentence/like/{id}", post(sentences::like))
        .route("/sentence/unlike/{id}", post(sentences::unlike))
        // Sentences
        .route("/sentence/", post(sentences::create_sentences))
        .route(
            "/sentence/{id}",
            get(sentences::sample)
                .put(sentences::update_sentence)
                .delete(sentences::delete_sentence),
        )
        .with_state(state)
}
