use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

use yatube_db::PostFilter;
use yatube_types::api::{
    Claims, CommentFormData, FeedContext, FieldErrors, GroupContext, PageQuery, PostDetailContext,
    PostFormContext, PostFormData, ProfileContext,
};
use yatube_types::models::{Author, Post};

use crate::error::ApiError;
use crate::forms::{clean_comment, clean_post, post_form_initial};
use crate::middleware::{Requester, percent_encode};
use crate::paginator::paginate_posts;
use crate::state::{AppState, blocking};

/// GET /
///
/// Every post, newest first. Served from the page cache while fresh.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let cache_key = query.page.clone().unwrap_or_default();
    let body = match state.index_cache.get(&cache_key) {
        Some(body) => body,
        None => {
            let per_page = state.page_size;
            let page_obj = blocking(&state, move |repo| {
                paginate_posts(repo, PostFilter::All, per_page, query.page.as_deref())
            })
            .await?;
            let body = serde_json::to_string(&FeedContext { page_obj })
                .map_err(anyhow::Error::from)?;
            state.index_cache.put(&cache_key, body.clone());
            body
        }
    };

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// GET /group/{slug}/
pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<GroupContext>, ApiError> {
    let per_page = state.page_size;
    let context = blocking(&state, move |repo| {
        let Some(group) = repo.get_group_by_slug(&slug)? else {
            return Ok(None);
        };
        let page_obj =
            paginate_posts(repo, PostFilter::Group(group.id), per_page, query.page.as_deref())?;
        Ok(Some(GroupContext { group, page_obj }))
    })
    .await?
    .ok_or(ApiError::NotFound("group"))?;

    Ok(Json(context))
}

/// GET /profile/{username}/
pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    Extension(requester): Extension<Requester>,
) -> Result<Json<ProfileContext>, ApiError> {
    let per_page = state.page_size;
    let viewer = requester.user_id();
    let context = blocking(&state, move |repo| {
        let Some(user) = repo.get_user_by_username(&username)? else {
            return Ok(None);
        };
        let filter = PostFilter::Author(user.id);
        let page_obj = paginate_posts(repo, filter, per_page, query.page.as_deref())?;
        let following = match viewer {
            Some(viewer) => repo.is_following(viewer, user.id)?,
            None => false,
        };
        Ok(Some(ProfileContext {
            author: Author::from(&user),
            count: page_obj.count,
            following,
            page_obj,
        }))
    })
    .await?
    .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(context))
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<PostDetailContext>, ApiError> {
    let post_id = parse_id(&post_id)?;
    let context = blocking(&state, move |repo| {
        let Some(post) = repo.get_post(post_id)? else {
            return Ok(None);
        };
        let count = repo.count_posts(PostFilter::Author(post.author.id))?;
        let comments = repo.list_comments(post.id)?;
        Ok(Some(PostDetailContext {
            post,
            count,
            comments,
            form: CommentFormData::default(),
        }))
    })
    .await?
    .ok_or(ApiError::NotFound("post"))?;

    Ok(Json(context))
}

/// GET /create/
pub async fn post_create_form(State(state): State<AppState>) -> Result<Response, ApiError> {
    render_form(&state, PostFormData::default(), FieldErrors::new(), None).await
}

/// POST /create/
pub async fn post_create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Form(data): Form<PostFormData>,
) -> Result<Response, ApiError> {
    let author_id = claims.sub;
    let submitted = data.clone();
    let outcome = blocking(&state, move |repo| match clean_post(&submitted, repo)? {
        Ok(draft) => repo.create_post(author_id, &draft).map(Ok),
        Err(errors) => Ok(Err(errors)),
    })
    .await?;

    match outcome {
        Ok(post) => {
            info!("Post {} created by {}", post.id, claims.username);
            Ok(Redirect::to(&profile_url(&claims.username)).into_response())
        }
        Err(errors) => render_form(&state, data, errors, None).await,
    }
}

/// GET /posts/{post_id}/edit/
pub async fn post_edit_form(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let post = match load_own_post(&state, &post_id, &claims).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };
    let initial = post_form_initial(&post);
    render_form(&state, initial, FieldErrors::new(), Some(post)).await
}

/// POST /posts/{post_id}/edit/
pub async fn post_edit(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Form(data): Form<PostFormData>,
) -> Result<Response, ApiError> {
    let post = match load_own_post(&state, &post_id, &claims).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let id = post.id;
    let submitted = data.clone();
    let outcome = blocking(&state, move |repo| match clean_post(&submitted, repo)? {
        Ok(draft) => repo.update_post(id, &draft).map(Ok),
        Err(errors) => Ok(Err(errors)),
    })
    .await?;

    match outcome {
        Ok(Some(_)) => Ok(Redirect::to(&post_url(id)).into_response()),
        // deleted between the ownership check and the update
        Ok(None) => Err(ApiError::NotFound("post")),
        Err(errors) => render_form(&state, data, errors, Some(post)).await,
    }
}

/// POST /posts/{post_id}/comment/
///
/// Author and post always come from the request context, never the form.
/// Invalid comments are dropped and the client lands back on the post.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Form(data): Form<CommentFormData>,
) -> Result<Response, ApiError> {
    let post_id = parse_id(&post_id)?;
    let author_id = claims.sub;
    let text = clean_comment(&data);

    let found = blocking(&state, move |repo| {
        if repo.get_post(post_id)?.is_none() {
            return Ok(false);
        }
        if let Ok(text) = text {
            repo.create_comment(post_id, author_id, &text)?;
        }
        Ok(true)
    })
    .await?;

    if !found {
        return Err(ApiError::NotFound("post"));
    }
    Ok(Redirect::to(&post_url(post_id)).into_response())
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", percent_encode(username))
}

pub fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

/// Path ids that aren't integers can't name a post.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound("post"))
}

/// Fetch a post for editing. Non-authors get a redirect to the index
/// (the inner `Err`) rather than an error.
async fn load_own_post(
    state: &AppState,
    raw_id: &str,
    claims: &Claims,
) -> Result<Result<Post, Response>, ApiError> {
    let post_id = parse_id(raw_id)?;
    let post = blocking(state, move |repo| repo.get_post(post_id))
        .await?
        .ok_or(ApiError::NotFound("post"))?;

    if post.author.id != claims.sub {
        warn!(
            "User {} tried to edit post {} owned by {}",
            claims.username, post.id, post.author.username
        );
        return Ok(Err(Redirect::to("/").into_response()));
    }
    Ok(Ok(post))
}

async fn render_form(
    state: &AppState,
    form: PostFormData,
    errors: FieldErrors,
    post: Option<Post>,
) -> Result<Response, ApiError> {
    let groups = blocking(state, |repo| repo.list_groups()).await?;
    Ok(Json(PostFormContext {
        form,
        errors,
        is_edit: post.is_some(),
        post,
        groups,
    })
    .into_response())
}
