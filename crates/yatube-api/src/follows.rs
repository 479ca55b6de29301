use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, info};

use yatube_db::PostFilter;
use yatube_types::api::{Claims, FeedContext, PageQuery};

use crate::error::ApiError;
use crate::paginator::paginate_posts;
use crate::posts::profile_url;
use crate::state::{AppState, blocking};

/// GET /follow/
///
/// Posts by everyone the requester follows.
pub async fn follow_index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<FeedContext>, ApiError> {
    let per_page = state.page_size;
    let user_id = claims.sub;
    let page_obj = blocking(&state, move |repo| {
        paginate_posts(repo, PostFilter::FollowedBy(user_id), per_page, query.page.as_deref())
    })
    .await?;

    Ok(Json(FeedContext { page_obj }))
}

/// GET /profile/{username}/follow/
///
/// Following yourself is a no-op that sends you back where you came from.
pub async fn profile_follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user_id = claims.sub;
    let lookup = username.clone();
    let author = blocking(&state, move |repo| repo.get_user_by_username(&lookup))
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if author.id == user_id {
        debug!("{} tried to follow themselves", claims.username);
        return Ok(back(&headers, &username));
    }

    let (_, created) = blocking(&state, move |repo| repo.follow(user_id, author.id)).await?;
    if created {
        info!("{} now follows {}", claims.username, username);
    }

    Ok(Redirect::to(&profile_url(&username)).into_response())
}

/// GET /profile/{username}/unfollow/
pub async fn profile_unfollow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user_id = claims.sub;
    let lookup = username.clone();
    let removed = blocking(&state, move |repo| {
        let Some(author) = repo.get_user_by_username(&lookup)? else {
            return Ok(None);
        };
        repo.unfollow(user_id, author.id).map(Some)
    })
    .await?
    .ok_or(ApiError::NotFound("user"))?;

    if removed == 0 {
        return Err(ApiError::NotFound("follow"));
    }
    info!("{} unfollowed {}", claims.username, username);

    Ok(back(&headers, &username))
}

/// Redirect to the Referer, or to the profile when there isn't a usable one.
fn back(headers: &HeaderMap, username: &str) -> Response {
    let target = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| profile_url(username));
    Redirect::to(&target).into_response()
}
