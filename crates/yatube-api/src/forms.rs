//! Validation for the post and comment forms.
//!
//! Forms only ever yield client-editable fields. Authors, and the post a
//! comment belongs to, are injected by the handlers.

use yatube_db::Repository;
use yatube_types::api::{CommentFormData, FieldErrors, PostFormData};
use yatube_types::models::{Post, PostDraft};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Validate a post submission. Group references are checked against `repo`.
///
/// The outer `Result` is infrastructure failure, the inner one is the form
/// verdict.
pub fn clean_post(
    data: &PostFormData,
    repo: &dyn Repository,
) -> anyhow::Result<Result<PostDraft, FieldErrors>> {
    let mut errors = FieldErrors::new();

    let text = clean_text(data.text.as_deref(), &mut errors);

    let group_id = match optional(data.group.as_deref()) {
        None => None,
        Some(raw) => {
            let found = match raw.parse::<i64>() {
                Ok(id) => repo.get_group(id)?.map(|g| g.id),
                Err(_) => None,
            };
            if found.is_none() {
                add_error(&mut errors, "group", INVALID_CHOICE);
            }
            found
        }
    };

    let image = optional(data.image.as_deref()).map(str::to_string);

    if !errors.is_empty() {
        return Ok(Err(errors));
    }
    Ok(Ok(PostDraft {
        text,
        group_id,
        image,
    }))
}

/// Validate a comment submission, yielding the comment text.
///
/// A client-supplied `post` is ignored here.
pub fn clean_comment(data: &CommentFormData) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    let text = clean_text(data.text.as_deref(), &mut errors);
    if errors.is_empty() { Ok(text) } else { Err(errors) }
}

/// Prefill for the edit form.
pub fn post_form_initial(post: &Post) -> PostFormData {
    PostFormData {
        text: Some(post.text.clone()),
        group: post.group.as_ref().map(|g| g.id.to_string()),
        image: post.image.clone(),
    }
}

fn clean_text(raw: Option<&str>, errors: &mut FieldErrors) -> String {
    match optional(raw) {
        Some(text) => text.to_string(),
        None => {
            add_error(errors, "text", REQUIRED);
            String::new()
        }
    }
}

/// Trimmed value, with blank treated as absent.
fn optional(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn add_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors.entry(field.to_string()).or_default().push(message.to_string());
}
