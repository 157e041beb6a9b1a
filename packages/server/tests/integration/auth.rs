use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn register_with_email_uses_it_as_username() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "first_name": "Alice",
                    "email": "Alice@Example.com",
                    "password": PASSWORD,
                    "confirm_password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["username"], "alice@example.com");
        assert_eq!(res.body["first_name"], "Alice");

        let user = app.find_user("alice@example.com").await;
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(user.role, "viewer");
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice").await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "first_name": "Other",
                    "email": "alice",
                    "password": PASSWORD,
                    "confirm_password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "USERNAME_TAKEN");
    }

    #[tokio::test]
    async fn mismatched_passwords_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "first_name": "Bob",
                    "email": "bob",
                    "password": PASSWORD,
                    "confirm_password": "something-else",
                }),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_by_email_or_username() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("carol@example.com").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "CAROL@example.com", "password": PASSWORD}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "viewer");
        assert_eq!(res.body["permissions"], json!([]));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("dave").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "dave", "password": "not-the-password"}),
            )
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn inactive_user_cannot_log_in() {
        use catalog_server::entity::user;
        use sea_orm::{ActiveModelTrait, Set};

        let app = TestApp::spawn().await;
        app.create_authenticated_user("erin").await;

        let mut active: user::ActiveModel = app.find_user("erin").await.into();
        active.is_active = Set(false);
        active.update(&app.db).await.unwrap();

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "erin", "password": PASSWORD}),
            )
            .await;
        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn admin_token_carries_permissions() {
        let app = TestApp::spawn().await;
        app.create_admin("root").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "root", "password": PASSWORD}),
            )
            .await;
        let permissions = res.body["permissions"].as_array().unwrap();
        assert!(permissions.contains(&json!("movie:create")));
        assert!(permissions.contains(&json!("notification:fanout")));
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn me_requires_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn me_returns_profile() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("frank").await;

        let res = app.get_with_token(routes::ME, &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], "frank");
        assert_eq!(res.body["first_name"], "Test");
        assert_eq!(res.body["is_premium"], false);
        assert_eq!(res.body["progress"]["watched_episodes_count"], 0);
    }

    #[tokio::test]
    async fn update_me_renames_and_detects_taken_username() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gina").await;
        app.create_authenticated_user("harry").await;

        let res = app
            .patch_with_token(routes::ME, &json!({"first_name": "Georgina"}), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["first_name"], "Georgina");

        let res = app
            .patch_with_token(routes::ME, &json!({"username": "harry"}), &token)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "USERNAME_TAKEN");
    }
}
