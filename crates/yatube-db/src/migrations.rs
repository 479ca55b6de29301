use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE post_groups (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                slug        TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL
            );

            CREATE TABLE posts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                text        TEXT NOT NULL,
                pub_date    TEXT NOT NULL,
                author_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                group_id    INTEGER REFERENCES post_groups(id) ON DELETE SET NULL,
                image       TEXT
            );

            CREATE INDEX idx_posts_pub_date ON posts(pub_date);
            CREATE INDEX idx_posts_author ON posts(author_id, pub_date);
            CREATE INDEX idx_posts_group ON posts(group_id, pub_date);

            CREATE TABLE comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id     INTEGER REFERENCES posts(id) ON DELETE SET NULL,
                author_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text        TEXT NOT NULL,
                created     TEXT NOT NULL
            );

            CREATE INDEX idx_comments_post ON comments(post_id, created);

            -- No UNIQUE(user_id, author_id): handlers get-or-create instead
            CREATE TABLE follows (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                author_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_follows_pair ON follows(user_id, author_id);
            CREATE INDEX idx_follows_author ON follows(author_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
