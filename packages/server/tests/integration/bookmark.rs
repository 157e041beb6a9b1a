use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn bookmark_lifecycle() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin").await;
    let alice = app.create_authenticated_user("alice").await;
    let movie_id = app.create_movie(&admin, "Inception").await;

    let res = app
        .post_with_token(routes::BOOKMARKS, &json!({"movie_id": movie_id}), &alice)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["movie"]["title"], "Inception");
    let bookmark_id = res.id();

    let res = app
        .post_with_token(routes::BOOKMARKS, &json!({"movie_id": movie_id}), &alice)
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "CONFLICT");

    let res = app.get_with_token(routes::BOOKMARKS, &alice).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let res = app.delete_with_token(&routes::bookmark(bookmark_id), &alice).await;
    assert_eq!(res.status, 204);

    let res = app.get_with_token(routes::BOOKMARKS, &alice).await;
    assert_eq!(res.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn bookmarks_are_private() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin").await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let movie_id = app.create_movie(&admin, "Amadeus").await;

    let res = app
        .post_with_token(routes::BOOKMARKS, &json!({"movie_id": movie_id}), &alice)
        .await;
    let bookmark_id = res.id();

    let res = app.get_with_token(routes::BOOKMARKS, &bob).await;
    assert_eq!(res.body.as_array().unwrap().len(), 0);

    let res = app.delete_with_token(&routes::bookmark(bookmark_id), &bob).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn bookmark_unknown_movie_returns_404() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;

    let res = app
        .post_with_token(routes::BOOKMARKS, &json!({"movie_id": 9999}), &alice)
        .await;
    assert_eq!(res.status, 404);
}
