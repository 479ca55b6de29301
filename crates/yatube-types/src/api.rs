use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Author, Comment, Group, Post};

// -- Token claims --

/// Bearer token claims. `sub` is the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: i64,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginPage {
    pub fields: Vec<String>,
    /// Where the client should go back to after logging in.
    pub next: Option<String>,
}

// -- Forms --

/// Raw post form as submitted. Every field is optional here; validation
/// decides what is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFormData {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<String>,
}

/// Raw comment form. `post` is accepted but always overridden by the path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentFormData {
    pub text: Option<String>,
    pub post: Option<String>,
}

/// Field name -> messages. Empty when the form is valid.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct PostFormContext {
    pub form: PostFormData,
    pub errors: FieldErrors,
    pub is_edit: bool,
    pub post: Option<Post>,
    /// Choices for the `group` field.
    pub groups: Vec<Group>,
}

// -- Listings --

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Kept as a string so garbage falls back to page 1 instead of a 400.
    pub page: Option<String>,
}

/// One page of an ordered collection. `number` is 1-indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedContext {
    pub page_obj: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupContext {
    pub group: Group,
    pub page_obj: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileContext {
    pub author: Author,
    /// Total posts by this author, not just the ones on this page.
    pub count: usize,
    /// Whether the requester follows `author`.
    pub following: bool,
    pub page_obj: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostDetailContext {
    pub post: Post,
    pub count: usize,
    pub comments: Vec<Comment>,
    pub form: CommentFormData,
}

// -- Static pages --

#[derive(Debug, Serialize, Deserialize)]
pub struct AboutPage {
    pub title: String,
    pub text: String,
}
