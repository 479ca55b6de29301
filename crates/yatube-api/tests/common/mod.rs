#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tower::ServiceExt;

use yatube_api::auth::create_token;
use yatube_api::cache::PageCache;
use yatube_api::state::{AppState, AppStateInner};
use yatube_db::{Database, Repository};
use yatube_types::models::{Post, PostDraft, User};

pub const SECRET: &str = "test-secret";

#[derive(Clone)]
pub struct TestApp {
    pub db: Arc<Database>,
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_cache(PageCache::disabled())
    }

    pub fn with_cache(index_cache: PageCache) -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let state: AppState = Arc::new(AppStateInner {
            repo: db.clone(),
            jwt_secret: SECRET.to_string(),
            page_size: 10,
            index_cache,
        });
        let router = yatube_api::router(state.clone());
        Self { db, state, router }
    }

    pub fn cached() -> Self {
        Self::with_cache(PageCache::new(Duration::from_secs(60)))
    }

    /// A user plus a bearer token for them.
    pub fn user(&self, username: &str) -> (User, String) {
        let user = self.db.create_user(username, "not-a-real-hash").unwrap();
        let token = create_token(SECRET, user.id, &user.username).unwrap();
        (user, token)
    }

    pub fn post(&self, author: &User, text: &str, group_id: Option<i64>) -> Post {
        let draft = PostDraft {
            text: text.to_string(),
            group_id,
            image: None,
        };
        self.db.create_post(author.id, &draft).unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let req = with_token(Request::get(uri), token)
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn get_with_referer(&self, uri: &str, token: &str, referer: &str) -> Response<Body> {
        let req = with_token(Request::get(uri), Some(token))
            .header(header::REFERER, referer)
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        token: Option<&str>,
        fields: &[(&str, &str)],
    ) -> Response<Body> {
        let req = with_token(Request::post(uri), token)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(encode_form(fields)))
            .unwrap();
        self.send(req).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }
}

fn with_token(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

/// Good enough for the plain values the tests submit.
fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v.replace('%', "%25").replace('&', "%26").replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("&")
}

pub async fn json<T: DeserializeOwned>(resp: Response<Body>) -> T {
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn text(resp: Response<Body>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Asserts a 303 and returns the `Location`.
pub fn redirect_target(resp: &Response<Body>) -> String {
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    resp.headers()[header::LOCATION].to_str().unwrap().to_string()
}
