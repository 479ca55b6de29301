use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// The public face of a user embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub username: String,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// A named category posts may optionally belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    /// Globally unique, used in `/group/{slug}/`
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    /// Set once on insert, never touched by edits.
    pub pub_date: DateTime<Utc>,
    pub author: Author,
    pub group: Option<Group>,
    /// Opaque reference to an image stored elsewhere.
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    /// `None` once the post it was attached to has been deleted.
    pub post_id: Option<i64>,
    pub author: Author,
}

/// Directed "user follows author" edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
}

/// Client-editable fields of a post, already validated.
///
/// The author is never part of this: callers inject it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}
