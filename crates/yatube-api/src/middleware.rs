use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

use yatube_types::api::Claims;

use crate::auth::decode_token;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/auth/login/";

/// Who is making the request. Anonymous when no valid token was presented.
#[derive(Debug, Clone, Default)]
pub struct Requester(pub Option<Claims>);

impl Requester {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|c| c.sub)
    }
}

/// Resolve the bearer token, if any, into a `Requester` extension.
///
/// A bad or expired token downgrades the request to anonymous instead of
/// failing it.
pub async fn identify(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let claims = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .and_then(|auth| match decode_token(&state.jwt_secret, auth.token()) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!("Ignoring bad token: {}", e);
                None
            }
        });

    req.extensions_mut().insert(Requester(claims));
    next.run(req).await
}

/// Gate for routes that need a logged-in user. Anonymous requests are sent
/// to the login page with the original path as `next`; authenticated ones get
/// their `Claims` as an extension.
pub async fn require_login(mut req: Request, next: Next) -> Response {
    let claims = req
        .extensions()
        .get::<Requester>()
        .and_then(|r| r.0.clone());

    match claims {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None => Redirect::to(&login_redirect(req.uri())).into_response(),
    }
}

/// `/auth/login/?next=<path and query>`
pub fn login_redirect(uri: &Uri) -> String {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}?next={}", LOGIN_PATH, percent_encode(target))
}

/// Percent-encode a path or query value, leaving `/` readable.
pub(crate) fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
