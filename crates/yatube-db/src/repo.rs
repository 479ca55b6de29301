use anyhow::Result;

use yatube_types::models::{Comment, Follow, Group, Post, PostDraft, User};

use crate::models::UserRow;

/// `create_user` lost to an existing row with the same username.
#[derive(Debug, thiserror::Error)]
#[error("username {0} is taken")]
pub struct UsernameTaken(pub String);

/// Which posts a listing covers. Every listing is ordered newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by anyone the given user follows.
    FollowedBy(i64),
}

/// Data-access contract the HTTP handlers are written against.
///
/// Calls are blocking; async callers must run them on the blocking pool.
pub trait Repository: Send + Sync {
    // -- Users --
    /// Fails with [`UsernameTaken`] when the name is already registered.
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Includes the password hash, for login only.
    fn get_credentials(&self, username: &str) -> Result<Option<UserRow>>;
    /// Removes the user with their posts, comments and follows.
    fn delete_user(&self, id: i64) -> Result<bool>;

    // -- Groups --
    fn create_group(&self, title: &str, slug: &str, description: &str) -> Result<Group>;
    fn get_group(&self, id: i64) -> Result<Option<Group>>;
    fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;
    fn list_groups(&self) -> Result<Vec<Group>>;
    /// Posts in the group survive with no group.
    fn delete_group(&self, id: i64) -> Result<bool>;

    // -- Posts --
    fn create_post(&self, author_id: i64, draft: &PostDraft) -> Result<Post>;
    /// Replaces text, group and image. `None` if the post does not exist.
    fn update_post(&self, id: i64, draft: &PostDraft) -> Result<Option<Post>>;
    fn get_post(&self, id: i64) -> Result<Option<Post>>;
    /// Comments on the post survive, detached.
    fn delete_post(&self, id: i64) -> Result<bool>;
    fn count_posts(&self, filter: PostFilter) -> Result<usize>;
    fn list_posts(&self, filter: PostFilter, limit: usize, offset: usize) -> Result<Vec<Post>>;

    // -- Comments --
    fn create_comment(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment>;
    fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>>;

    // -- Follows --
    /// Get-or-create. The flag is true when a new row was inserted.
    fn follow(&self, user_id: i64, author_id: i64) -> Result<(Follow, bool)>;
    /// Deletes every row for the pair and returns how many there were.
    fn unfollow(&self, user_id: i64, author_id: i64) -> Result<usize>;
    fn count_follows(&self, user_id: i64, author_id: i64) -> Result<usize>;

    fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        Ok(self.count_follows(user_id, author_id)? > 0)
    }
}
