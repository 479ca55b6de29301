use crate::models::{CommentRow, GroupRow, PostRow, UserRow, now_timestamp};
use crate::repo::{PostFilter, Repository, UsernameTaken};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, ErrorCode, Row, params, params_from_iter};
use tracing::debug;

use yatube_types::models::{Comment, Follow, Group, Post, PostDraft, User};

const POST_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.image, u.id, u.username,
            g.id, g.title, g.slug, g.description
     FROM posts p
     JOIN users u ON u.id = p.author_id
     LEFT JOIN post_groups g ON g.id = p.group_id";

const POST_ORDER: &str = " ORDER BY p.pub_date DESC, p.id DESC";

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.author_id, u.username, c.text, c.created
     FROM comments c
     JOIN users u ON u.id = c.author_id";

impl PostFilter {
    /// WHERE fragment over the `posts p` alias, binding its key as `?1`.
    fn where_clause(self) -> (&'static str, Option<i64>) {
        match self {
            PostFilter::All => ("", None),
            PostFilter::Group(id) => (" WHERE p.group_id = ?1", Some(id)),
            PostFilter::Author(id) => (" WHERE p.author_id = ?1", Some(id)),
            // IN rather than JOIN so duplicate follow rows don't duplicate posts
            PostFilter::FollowedBy(id) => (
                " WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ?1)",
                Some(id),
            ),
        }
    }
}

impl Repository for Database {
    // -- Users --

    fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password, created_at) VALUES (?1, ?2, ?3)",
                params![username, password_hash, now_timestamp()],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation => {
                    anyhow::Error::from(UsernameTaken(username.to_string()))
                }
                e => e.into(),
            })?;
            let id = conn.last_insert_rowid();
            debug!("Created user {} ({})", username, id);
            query_user(conn, "id", &id)?
                .map(UserRow::into_user)
                .ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", id))
        })
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| Ok(query_user(conn, "id", &id)?.map(UserRow::into_user)))
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| Ok(query_user(conn, "username", &username)?.map(UserRow::into_user)))
    }

    fn get_credentials(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", &username))
    }

    fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])? > 0))
    }

    // -- Groups --

    fn create_group(&self, title: &str, slug: &str, description: &str) -> Result<Group> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
                params![title, slug, description],
            )?;
            Ok(Group {
                id: conn.last_insert_rowid(),
                title: title.to_string(),
                slug: slug.to_string(),
                description: description.to_string(),
            })
        })
    }

    fn get_group(&self, id: i64) -> Result<Option<Group>> {
        self.with_conn(|conn| query_group(conn, "id", &id))
    }

    fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        self.with_conn(|conn| query_group(conn, "slug", &slug))
    }

    fn list_groups(&self) -> Result<Vec<Group>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, title, slug, description FROM post_groups ORDER BY title")?;
            let groups = stmt
                .query_map([], group_from_row)?
                .map(|r| r.map(Group::from))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(groups)
        })
    }

    fn delete_group(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM post_groups WHERE id = ?1", [id])? > 0))
    }

    // -- Posts --

    fn create_post(&self, author_id: i64, draft: &PostDraft) -> Result<Post> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (text, pub_date, author_id, group_id, image)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![draft.text, now_timestamp(), author_id, draft.group_id, draft.image],
            )?;
            let id = conn.last_insert_rowid();
            query_post(conn, id)?.ok_or_else(|| anyhow::anyhow!("Post {} vanished after insert", id))
        })
    }

    fn update_post(&self, id: i64, draft: &PostDraft) -> Result<Option<Post>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET text = ?1, group_id = ?2, image = ?3 WHERE id = ?4",
                params![draft.text, draft.group_id, draft.image, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_post(conn, id)
        })
    }

    fn get_post(&self, id: i64) -> Result<Option<Post>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    fn delete_post(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [id])? > 0))
    }

    fn count_posts(&self, filter: PostFilter) -> Result<usize> {
        let (clause, key) = filter.where_clause();
        self.with_conn(|conn| {
            let sql = format!("SELECT COUNT(*) FROM posts p{}", clause);
            let count: i64 = conn.query_row(&sql, params_from_iter(key.iter()), |r| r.get(0))?;
            Ok(count as usize)
        })
    }

    fn list_posts(&self, filter: PostFilter, limit: usize, offset: usize) -> Result<Vec<Post>> {
        let (clause, key) = filter.where_clause();
        self.with_conn(|conn| {
            let mut values: Vec<i64> = key.into_iter().collect();
            let limit_idx = values.len() + 1;
            values.push(limit as i64);
            values.push(offset as i64);

            let sql = format!(
                "{}{}{} LIMIT ?{} OFFSET ?{}",
                POST_SELECT,
                clause,
                POST_ORDER,
                limit_idx,
                limit_idx + 1
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(PostRow::into_post).collect())
        })
    }

    // -- Comments --

    fn create_comment(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (post_id, author_id, text, created) VALUES (?1, ?2, ?3, ?4)",
                params![post_id, author_id, text, now_timestamp()],
            )?;
            let id = conn.last_insert_rowid();
            let sql = format!("{} WHERE c.id = ?1", COMMENT_SELECT);
            let row = conn.query_row(&sql, [id], comment_from_row)?;
            Ok(row.into_comment())
        })
    }

    fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE c.post_id = ?1 ORDER BY c.created DESC, c.id DESC",
                COMMENT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([post_id], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(CommentRow::into_comment).collect())
        })
    }

    // -- Follows --

    fn follow(&self, user_id: i64, author_id: i64) -> Result<(Follow, bool)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM follows WHERE user_id = ?1 AND author_id = ?2 ORDER BY id LIMIT 1",
                    [user_id, author_id],
                    |row| row.get(0),
                )
                .optional()?;

            let (id, created) = match existing {
                Some(id) => (id, false),
                None => {
                    tx.execute(
                        "INSERT INTO follows (user_id, author_id) VALUES (?1, ?2)",
                        [user_id, author_id],
                    )?;
                    (tx.last_insert_rowid(), true)
                }
            };
            tx.commit()?;

            Ok((Follow { id, user_id, author_id }, created))
        })
    }

    fn unfollow(&self, user_id: i64, author_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
                [user_id, author_id],
            )?;
            Ok(removed)
        })
    }

    fn count_follows(&self, user_id: i64, author_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM follows WHERE user_id = ?1 AND author_id = ?2",
                [user_id, author_id],
                |r| r.get(0),
            )?;
            Ok(count as usize)
        })
    }
}

/// `column` is always a literal from this file, never user input.
fn query_user(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::types::ToSql,
) -> Result<Option<UserRow>> {
    let sql = format!("SELECT id, username, password, created_at FROM users WHERE {} = ?1", column);
    let row = conn
        .query_row(&sql, params![value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_group(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::types::ToSql,
) -> Result<Option<Group>> {
    let sql = format!("SELECT id, title, slug, description FROM post_groups WHERE {} = ?1", column);
    let row = conn.query_row(&sql, params![value], group_from_row).optional()?;
    Ok(row.map(Group::from))
}

fn query_post(conn: &Connection, id: i64) -> Result<Option<Post>> {
    let sql = format!("{} WHERE p.id = ?1", POST_SELECT);
    let row = conn.query_row(&sql, [id], post_from_row).optional()?;
    Ok(row.map(PostRow::into_post))
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    let group = match row.get::<_, Option<i64>>(6)? {
        Some(id) => Some(GroupRow {
            id,
            title: row.get(7)?,
            slug: row.get(8)?,
            description: row.get(9)?,
        }),
        None => None,
    };

    Ok(PostRow {
        id: row.get(0)?,
        text: row.get(1)?,
        pub_date: row.get(2)?,
        image: row.get(3)?,
        author_id: row.get(4)?,
        author_username: row.get(5)?,
        group,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        author_username: row.get(3)?,
        text: row.get(4)?,
        created: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
