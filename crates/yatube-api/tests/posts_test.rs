/// Integration tests for the feed, detail and post/comment mutation routes,
/// driven through the full router.
mod common;

use axum::http::StatusCode;

use common::{TestApp, json, redirect_target, text};
use yatube_api::forms::{INVALID_CHOICE, REQUIRED};
use yatube_db::{PostFilter, Repository};
use yatube_types::api::{
    AboutPage, FeedContext, GroupContext, PostDetailContext, PostFormContext, ProfileContext,
};

#[tokio::test]
async fn anonymous_users_are_sent_to_login() {
    let app = TestApp::new();
    let (leo, _) = app.user("leo");
    let post = app.post(&leo, "hello", None);

    let resp = app.get("/create/", None).await;
    assert_eq!(redirect_target(&resp), "/auth/login/?next=/create/");

    let edit = format!("/posts/{}/edit/", post.id);
    let resp = app.get(&edit, None).await;
    assert_eq!(redirect_target(&resp), format!("/auth/login/?next={}", edit));

    let comment = format!("/posts/{}/comment/", post.id);
    let resp = app.post_form(&comment, None, &[("text", "hi")]).await;
    assert_eq!(redirect_target(&resp), format!("/auth/login/?next={}", comment));
    assert!(app.db.list_comments(post.id).unwrap().is_empty());

    let resp = app.get("/follow/", None).await;
    assert_eq!(redirect_target(&resp), "/auth/login/?next=/follow/");
}

#[tokio::test]
async fn create_post_persists_and_redirects_to_profile() {
    let app = TestApp::new();
    let (_, token) = app.user("leo");
    let group = app.db.create_group("Cats", "cats", "meow").unwrap();

    let group_id = group.id.to_string();
    let resp = app
        .post_form(
            "/create/",
            Some(&token),
            &[("text", "Text from the form"), ("group", &group_id)],
        )
        .await;
    assert_eq!(redirect_target(&resp), "/profile/leo/");

    let posts = app.db.list_posts(PostFilter::All, 10, 0).unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "Text from the form");
    assert_eq!(posts[0].author.username, "leo");
    assert_eq!(posts[0].group.as_ref().map(|g| g.id), Some(group.id));
}

#[tokio::test]
async fn create_redirect_encodes_unicode_username() {
    let app = TestApp::new();
    let (_, token) = app.user("Лев");

    let resp = app.post_form("/create/", Some(&token), &[("text", "hello")]).await;
    let target = redirect_target(&resp);
    assert_eq!(target, "/profile/%D0%9B%D0%B5%D0%B2/");

    let profile: ProfileContext = json(app.get(&target, None).await).await;
    assert_eq!(profile.author.username, "Лев");
    assert_eq!(profile.count, 1);
}

#[tokio::test]
async fn invalid_create_rerenders_form() {
    let app = TestApp::new();
    let (_, token) = app.user("leo");
    app.db.create_group("Cats", "cats", "meow").unwrap();

    let resp = app
        .post_form("/create/", Some(&token), &[("text", "   "), ("group", "999")])
        .await;
    let ctx: PostFormContext = json(resp).await;
    assert_eq!(ctx.errors["text"], vec![REQUIRED.to_string()]);
    assert_eq!(ctx.errors["group"], vec![INVALID_CHOICE.to_string()]);
    assert!(!ctx.is_edit);
    assert_eq!(ctx.groups.len(), 1);
    assert_eq!(app.db.count_posts(PostFilter::All).unwrap(), 0);
}

#[tokio::test]
async fn create_form_lists_groups() {
    let app = TestApp::new();
    let (_, token) = app.user("leo");
    app.db.create_group("Cats", "cats", "meow").unwrap();
    app.db.create_group("Dogs", "dogs", "woof").unwrap();

    let ctx: PostFormContext = json(app.get("/create/", Some(&token)).await).await;
    assert!(ctx.errors.is_empty());
    assert_eq!(ctx.groups.len(), 2);
    assert!(ctx.post.is_none());
}

#[tokio::test]
async fn author_can_edit_post() {
    let app = TestApp::new();
    let (leo, token) = app.user("leo");
    let group = app.db.create_group("Cats", "cats", "meow").unwrap();
    let post = app.post(&leo, "draft", Some(group.id));

    let edit = format!("/posts/{}/edit/", post.id);
    let ctx: PostFormContext = json(app.get(&edit, Some(&token)).await).await;
    assert!(ctx.is_edit);
    assert_eq!(ctx.form.text.as_deref(), Some("draft"));
    assert_eq!(ctx.form.group, Some(group.id.to_string()));

    let resp = app
        .post_form(&edit, Some(&token), &[("text", "final"), ("group", "")])
        .await;
    assert_eq!(redirect_target(&resp), format!("/posts/{}/", post.id));

    let updated = app.db.get_post(post.id).unwrap().unwrap();
    assert_eq!(updated.text, "final");
    assert_eq!(updated.group, None);
    assert_eq!(updated.author.id, leo.id);
    assert_eq!(updated.pub_date, post.pub_date);
}

#[tokio::test]
async fn non_author_edit_leaves_post_unchanged() {
    let app = TestApp::new();
    let (leo, _) = app.user("leo");
    let (_, intruder) = app.user("intruder");
    let post = app.post(&leo, "original", None);

    let edit = format!("/posts/{}/edit/", post.id);
    let resp = app.get(&edit, Some(&intruder)).await;
    assert_eq!(redirect_target(&resp), "/");

    let resp = app
        .post_form(&edit, Some(&intruder), &[("text", "vandalised")])
        .await;
    assert_eq!(redirect_target(&resp), "/");
    assert_eq!(app.db.get_post(post.id).unwrap().unwrap().text, "original");
}

#[tokio::test]
async fn invalid_edit_keeps_post() {
    let app = TestApp::new();
    let (leo, token) = app.user("leo");
    let post = app.post(&leo, "original", None);

    let edit = format!("/posts/{}/edit/", post.id);
    let ctx: PostFormContext = json(app.post_form(&edit, Some(&token), &[("text", "")]).await).await;
    assert!(ctx.is_edit);
    assert!(ctx.errors.contains_key("text"));
    assert_eq!(ctx.post.map(|p| p.id), Some(post.id));
    assert_eq!(app.db.get_post(post.id).unwrap().unwrap().text, "original");
}

#[tokio::test]
async fn editing_missing_post_is_not_found() {
    let app = TestApp::new();
    let (_, token) = app.user("leo");

    let resp = app.get("/posts/999/edit/", Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = app
        .post_form("/posts/999/edit/", Some(&token), &[("text", "x")])
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_attaches_to_path_post_and_requester() {
    let app = TestApp::new();
    let (leo, _) = app.user("leo");
    let (reader, token) = app.user("reader");
    let post = app.post(&leo, "hello", None);
    let other = app.post(&leo, "other", None);

    let other_id = other.id.to_string();
    let uri = format!("/posts/{}/comment/", post.id);
    let resp = app
        .post_form(&uri, Some(&token), &[("text", "Nice post"), ("post", &other_id)])
        .await;
    assert_eq!(redirect_target(&resp), format!("/posts/{}/", post.id));

    let comments = app.db.list_comments(post.id).unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Nice post");
    assert_eq!(comments[0].author.id, reader.id);
    assert_eq!(comments[0].post_id, Some(post.id));
    assert!(app.db.list_comments(other.id).unwrap().is_empty());

    let ctx: PostDetailContext = json(app.get(&format!("/posts/{}/", post.id), None).await).await;
    assert_eq!(ctx.comments.len(), 1);
}

#[tokio::test]
async fn empty_comment_is_dropped() {
    let app = TestApp::new();
    let (leo, token) = app.user("leo");
    let post = app.post(&leo, "hello", None);

    let uri = format!("/posts/{}/comment/", post.id);
    let resp = app.post_form(&uri, Some(&token), &[("text", "  ")]).await;
    assert_eq!(redirect_target(&resp), format!("/posts/{}/", post.id));
    assert!(app.db.list_comments(post.id).unwrap().is_empty());

    let resp = app
        .post_form("/posts/999/comment/", Some(&token), &[("text", "hi")])
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listings_paginate_by_ten() {
    let app = TestApp::new();
    let (leo, _) = app.user("leo");
    let group = app.db.create_group("Cats", "cats", "meow").unwrap();
    for i in 0..13 {
        app.post(&leo, &format!("post {}", i), Some(group.id));
    }

    for base in ["/", "/group/cats/", "/profile/leo/"] {
        let first: serde_json::Value = json(app.get(base, None).await).await;
        assert_eq!(first["page_obj"]["items"].as_array().unwrap().len(), 10, "{}", base);
        assert_eq!(first["page_obj"]["num_pages"], 2);
        assert_eq!(first["page_obj"]["has_next"], true);

        let second: serde_json::Value =
            json(app.get(&format!("{}?page=2", base), None).await).await;
        assert_eq!(second["page_obj"]["items"].as_array().unwrap().len(), 3, "{}", base);
        assert_eq!(second["page_obj"]["has_previous"], true);
    }

    let ctx: FeedContext = json(app.get("/", None).await).await;
    assert_eq!(ctx.page_obj.items[0].text, "post 12");

    let ctx: FeedContext = json(app.get("/?page=abc", None).await).await;
    assert_eq!(ctx.page_obj.number, 1);
    let ctx: FeedContext = json(app.get("/?page=%2B2", None).await).await;
    assert_eq!(ctx.page_obj.number, 2);
    let ctx: FeedContext = json(app.get("/?page=99", None).await).await;
    assert_eq!(ctx.page_obj.number, 2);
}

#[tokio::test]
async fn group_post_shows_up_where_it_should() {
    let app = TestApp::new();
    let (leo, _) = app.user("leo");
    let cats = app.db.create_group("Cats", "cats", "meow").unwrap();
    app.db.create_group("Dogs", "dogs", "woof").unwrap();
    let post = app.post(&leo, "cat post", Some(cats.id));

    let index: FeedContext = json(app.get("/", None).await).await;
    assert_eq!(index.page_obj.items[0].id, post.id);

    let group: GroupContext = json(app.get("/group/cats/", None).await).await;
    assert_eq!(group.group.slug, "cats");
    assert_eq!(group.page_obj.items[0].id, post.id);

    let profile: ProfileContext = json(app.get("/profile/leo/", None).await).await;
    assert_eq!(profile.page_obj.items[0].id, post.id);
    assert_eq!(profile.count, 1);

    let dogs: GroupContext = json(app.get("/group/dogs/", None).await).await;
    assert!(dogs.page_obj.items.is_empty());
    assert_eq!(dogs.page_obj.num_pages, 1);
}

#[tokio::test]
async fn unknown_resources_are_not_found() {
    let app = TestApp::new();
    for uri in [
        "/group/nope/",
        "/profile/nobody/",
        "/posts/999/",
        "/posts/abc/",
        "/unexisting_page/",
    ] {
        let resp = app.get(uri, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn post_detail_counts_author_posts() {
    let app = TestApp::new();
    let (leo, _) = app.user("leo");
    let post = app.post(&leo, "one", None);
    app.post(&leo, "two", None);

    let ctx: PostDetailContext = json(app.get(&format!("/posts/{}/", post.id), None).await).await;
    assert_eq!(ctx.post.text, "one");
    assert_eq!(ctx.count, 2);
    assert!(ctx.comments.is_empty());
}

#[tokio::test]
async fn cached_index_survives_new_post_until_cleared() {
    let app = TestApp::cached();
    let (leo, _) = app.user("leo");
    app.post(&leo, "first", None);

    let before = text(app.get("/", None).await).await;
    app.post(&leo, "second", None);

    let cached = text(app.get("/", None).await).await;
    assert_eq!(cached, before);

    app.state.index_cache.clear();
    let fresh: FeedContext = json(app.get("/", None).await).await;
    assert_eq!(fresh.page_obj.count, 2);
    assert_eq!(fresh.page_obj.items[0].text, "second");
}

#[tokio::test]
async fn static_pages() {
    let app = TestApp::new();
    for uri in ["/about/author/", "/about/tech/"] {
        let page: AboutPage = json(app.get(uri, None).await).await;
        assert!(!page.title.is_empty());
        assert!(!page.text.is_empty());
    }
    assert_eq!(text(app.get("/health", None).await).await, "ok");
}
