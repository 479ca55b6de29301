pub mod about;
pub mod auth;
pub mod cache;
pub mod error;
pub mod follows;
pub mod forms;
pub mod middleware;
pub mod paginator;
pub mod posts;
pub mod state;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};

use crate::middleware::{identify, require_login};
use crate::state::AppState;

/// Every route of the site. Transport layers (CORS, tracing) are left to
/// the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(posts::index))
        .route("/group/{slug}/", get(posts::group_posts))
        .route("/profile/{username}/", get(posts::profile))
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/login/", get(auth::login_page).post(auth::login))
        .route("/about/author/", get(about::author))
        .route("/about/tech/", get(about::tech))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/create/", get(posts::post_create_form).post(posts::post_create))
        .route(
            "/posts/{post_id}/edit/",
            get(posts::post_edit_form).post(posts::post_edit),
        )
        .route("/posts/{post_id}/comment/", post(posts::add_comment))
        .route("/follow/", get(follows::follow_index))
        .route("/profile/{username}/follow/", get(follows::profile_follow))
        .route("/profile/{username}/unfollow/", get(follows::profile_unfollow))
        .route_layer(from_fn(require_login));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(from_fn_with_state(state.clone(), identify))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
