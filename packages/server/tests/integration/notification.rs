use catalog_server::entity::notification;
use common::FanoutConfig;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use crate::common::{TestApp, routes};

async fn notifications_for_movie(app: &TestApp, movie_id: i32) -> u64 {
    notification::Entity::find()
        .filter(notification::Column::MovieId.eq(movie_id))
        .count(&app.db)
        .await
        .unwrap()
}

mod fanout {
    use super::*;

    #[tokio::test]
    async fn new_movie_notifies_every_user_once() {
        // Small batches so the fan-out spans several concurrent inserts.
        let app = TestApp::spawn_with_fanout(FanoutConfig {
            batch_size: 3,
            max_concurrency: 2,
            ..Default::default()
        })
        .await;
        let admin = app.create_admin("admin").await;
        let mut viewers = Vec::new();
        for i in 0..10 {
            viewers.push(app.create_authenticated_user(&format!("viewer{i}")).await);
        }

        let movie_id = app.create_movie(&admin, "Dune").await;

        // Ten viewers plus the admin.
        assert_eq!(notifications_for_movie(&app, movie_id).await, 11);

        let res = app.get_with_token(routes::NOTIFICATIONS, &viewers[0]).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 1);
        let item = &res.body["data"][0];
        assert_eq!(item["movie_id"], movie_id);
        assert_eq!(item["movie_title"], "Dune");
        assert_eq!(item["message"], "New movie added: Dune");
        assert_eq!(item["is_read"], false);
    }

    #[tokio::test]
    async fn updating_movie_does_not_notify() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let alice = app.create_authenticated_user("alice").await;
        let movie_id = app.create_movie(&admin, "Tenet").await;
        assert_eq!(notifications_for_movie(&app, movie_id).await, 2);

        let res = app
            .patch_with_token(
                &routes::movie(movie_id),
                &json!({"title": "Tenet (Director's Cut)", "description": "Longer."}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert_eq!(notifications_for_movie(&app, movie_id).await, 2);
        let res = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &alice).await;
        assert_eq!(res.body["unread"], 1);
    }

    #[tokio::test]
    async fn rerun_only_fills_missing_users() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        app.create_authenticated_user("alice").await;
        let movie_id = app.create_movie(&admin, "Oldboy").await;

        let res = app
            .post_with_token(&routes::fanout(movie_id), &json!({}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total_users"], 2);
        assert_eq!(res.body["already_notified"], 2);
        assert_eq!(res.body["created"], 0);

        // A user who signed up after the announcement gets it on rerun.
        let late = app.create_authenticated_user("late").await;
        let res = app
            .post_with_token(&routes::fanout(movie_id), &json!({}), &admin)
            .await;
        assert_eq!(res.body["created"], 1);
        assert_eq!(res.body["failed_user_ids"], json!([]));
        assert_eq!(notifications_for_movie(&app, movie_id).await, 3);

        let res = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &late).await;
        assert_eq!(res.body["unread"], 1);
    }

    #[tokio::test]
    async fn rerun_requires_permission_and_existing_movie() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let alice = app.create_authenticated_user("alice").await;
        let movie_id = app.create_movie(&admin, "Coco").await;

        let res = app
            .post_with_token(&routes::fanout(movie_id), &json!({}), &alice)
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .post_with_token(&routes::fanout(9999), &json!({}), &admin)
            .await;
        assert_eq!(res.status, 404);
    }
}

mod partial_failure {
    use super::*;

    async fn reject_notifications_for(app: &TestApp, user_id: i32) {
        app.execute_sql(&format!(
            "CREATE FUNCTION reject_notification() RETURNS trigger AS $$ \
             BEGIN \
               IF NEW.user_id = {user_id} THEN \
                 RAISE EXCEPTION 'notification rejected for user %', NEW.user_id; \
               END IF; \
               RETURN NEW; \
             END $$ LANGUAGE plpgsql"
        ))
        .await;
        app.execute_sql(
            "CREATE TRIGGER reject_notification BEFORE INSERT ON notification \
             FOR EACH ROW EXECUTE FUNCTION reject_notification()",
        )
        .await;
    }

    #[tokio::test]
    async fn failed_batch_is_reported_and_others_still_land() {
        let app = TestApp::spawn_with_fanout(FanoutConfig {
            batch_size: 1,
            max_concurrency: 2,
            max_batch_retries: 1,
            retry_base_ms: 1,
            retry_max_ms: 5,
        })
        .await;
        let admin = app.create_admin("admin").await;
        let alice = app.create_authenticated_user("alice").await;
        app.create_authenticated_user("bob").await;
        let carol = app.create_authenticated_user("carol").await;
        let carol_id = app.find_user("carol").await.id;

        reject_notifications_for(&app, carol_id).await;

        // Movie creation succeeds even though one user's batch fails.
        let movie_id = app.create_movie(&admin, "Stalker").await;
        assert_eq!(notifications_for_movie(&app, movie_id).await, 3);

        let res = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &alice).await;
        assert_eq!(res.body["unread"], 1);
        let res = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &carol).await;
        assert_eq!(res.body["unread"], 0);

        let res = app
            .post_with_token(&routes::fanout(movie_id), &json!({}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total_users"], 4);
        assert_eq!(res.body["already_notified"], 3);
        assert_eq!(res.body["created"], 0);
        assert_eq!(res.body["failed_user_ids"], json!([carol_id]));

        // Once the fault is gone a rerun fills the gap.
        app.execute_sql("DROP TRIGGER reject_notification ON notification")
            .await;
        let res = app
            .post_with_token(&routes::fanout(movie_id), &json!({}), &admin)
            .await;
        assert_eq!(res.body["created"], 1);
        assert_eq!(res.body["failed_user_ids"], json!([]));
        let res = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &carol).await;
        assert_eq!(res.body["unread"], 1);
    }
}

mod reading {
    use super::*;

    async fn app_with_five_notifications() -> (TestApp, String, Vec<i32>) {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let alice = app.create_authenticated_user("alice").await;
        for title in ["One", "Two", "Three", "Four", "Five"] {
            app.create_movie(&admin, title).await;
        }

        let res = app.get_with_token(routes::NOTIFICATIONS, &alice).await;
        let ids = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_i64().unwrap() as i32)
            .collect::<Vec<_>>();
        assert_eq!(ids.len(), 5);
        (app, alice, ids)
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (app, alice, _) = app_with_five_notifications().await;

        let res = app.get_with_token(routes::NOTIFICATIONS, &alice).await;
        assert_eq!(res.body["data"][0]["movie_title"], "Five");
        assert_eq!(res.body["data"][4]["movie_title"], "One");
    }

    #[tokio::test]
    async fn mark_all_read_returns_number_changed() {
        let (app, alice, ids) = app_with_five_notifications().await;

        for id in &ids[..3] {
            let res = app
                .post_with_token(&routes::notification_read(*id), &json!({}), &alice)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.body["is_read"], true);
        }

        let res = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &alice).await;
        assert_eq!(res.body["unread"], 2);

        let res = app
            .post_with_token(routes::NOTIFICATIONS_READ_ALL, &json!({}), &alice)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["updated"], 2);

        let res = app
            .post_with_token(routes::NOTIFICATIONS_READ_ALL, &json!({}), &alice)
            .await;
        assert_eq!(res.body["updated"], 0);

        let res = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &alice).await;
        assert_eq!(res.body["unread"], 0);
    }

    #[tokio::test]
    async fn mark_read_is_idempotent() {
        let (app, alice, ids) = app_with_five_notifications().await;

        for _ in 0..2 {
            let res = app
                .post_with_token(&routes::notification_read(ids[0]), &json!({}), &alice)
                .await;
            assert_eq!(res.status, 200);
            assert_eq!(res.body["is_read"], true);
        }

        let res = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &alice).await;
        assert_eq!(res.body["unread"], 4);
    }

    #[tokio::test]
    async fn unread_only_filter() {
        let (app, alice, ids) = app_with_five_notifications().await;
        app.post_with_token(&routes::notification_read(ids[0]), &json!({}), &alice)
            .await;

        let res = app
            .get_with_token(&format!("{}?unread_only=true", routes::NOTIFICATIONS), &alice)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 4);
        assert!(
            res.body["data"]
                .as_array()
                .unwrap()
                .iter()
                .all(|n| n["is_read"] == false)
        );
    }

    #[tokio::test]
    async fn cannot_read_another_users_notification() {
        let (app, alice, ids) = app_with_five_notifications().await;
        let bob = app.create_authenticated_user("bob").await;

        let res = app
            .post_with_token(&routes::notification_read(ids[0]), &json!({}), &bob)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");

        let res = app
            .post_with_token(routes::NOTIFICATIONS_READ_ALL, &json!({}), &bob)
            .await;
        assert_eq!(res.body["updated"], 0);

        let res = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &alice).await;
        assert_eq!(res.body["unread"], 5);
    }
}
