//! Database row types. These map directly to SQLite rows.
//! Conversion into `yatube-types` models happens here so the API layer never
//! sees raw timestamp strings.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use tracing::warn;

use yatube_types::models::{Author, Comment, Group, Post, User};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string
    pub password: String,
    pub created_at: String,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            created_at: parse_timestamp(&self.created_at, "users", self.id),
            id: self.id,
            username: self.username,
        }
    }
}

pub struct GroupRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Group {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
        }
    }
}

/// A post joined with its author and (optional) group.
pub struct PostRow {
    pub id: i64,
    pub text: String,
    pub pub_date: String,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub group: Option<GroupRow>,
}

impl PostRow {
    pub fn into_post(self) -> Post {
        Post {
            pub_date: parse_timestamp(&self.pub_date, "posts", self.id),
            id: self.id,
            text: self.text,
            author: Author {
                id: self.author_id,
                username: self.author_username,
            },
            group: self.group.map(Group::from),
            image: self.image,
        }
    }
}

pub struct CommentRow {
    pub id: i64,
    pub post_id: Option<i64>,
    pub author_id: i64,
    pub author_username: String,
    pub text: String,
    pub created: String,
}

impl CommentRow {
    pub fn into_comment(self) -> Comment {
        Comment {
            created: parse_timestamp(&self.created, "comments", self.id),
            id: self.id,
            text: self.text,
            post_id: self.post_id,
            author: Author {
                id: self.author_id,
                username: self.author_username,
            },
        }
    }
}

/// Timestamps are written as fixed-width RFC 3339 with microseconds so that
/// lexical order in SQL matches chronological order.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str, table: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through the sqlite shell use datetime('now')
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {} row {}: {}", raw, table, id, e);
            DateTime::default()
        })
}
