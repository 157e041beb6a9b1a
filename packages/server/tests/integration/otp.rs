use common::OtpPurpose;
use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

fn wrong_code(code: &str) -> &'static str {
    if code == "000000" { "111111" } else { "000000" }
}

mod registration {
    use super::*;

    #[tokio::test]
    async fn code_creates_account() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::OTP_SEND, &json!({"email": "Neo@Example.com"}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["email"], "neo@example.com");
        assert_eq!(res.body["expires_in"], 300);

        let code = app
            .otp
            .last_code("neo@example.com", OtpPurpose::Registration)
            .expect("code should have been sent");

        let res = app
            .post_without_token(
                routes::OTP_VERIFY,
                &json!({
                    "email": "neo@example.com",
                    "code": code,
                    "first_name": "Neo",
                    "password": PASSWORD,
                    "confirm_password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["username"], "neo@example.com");

        app.login("neo@example.com").await;
    }

    #[tokio::test]
    async fn code_cannot_be_reused() {
        let app = TestApp::spawn().await;
        app.post_without_token(routes::OTP_SEND, &json!({"email": "a@example.com"}))
            .await;
        let code = app
            .otp
            .last_code("a@example.com", OtpPurpose::Registration)
            .unwrap();
        let body = json!({
            "email": "a@example.com",
            "code": code,
            "first_name": "A",
            "password": PASSWORD,
            "confirm_password": PASSWORD,
        });

        let res = app.post_without_token(routes::OTP_VERIFY, &body).await;
        assert_eq!(res.status, 201);

        let res = app.post_without_token(routes::OTP_VERIFY, &body).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn too_many_wrong_codes_discard_the_code() {
        let app = TestApp::spawn().await;
        app.post_without_token(routes::OTP_SEND, &json!({"email": "b@example.com"}))
            .await;
        let code = app
            .otp
            .last_code("b@example.com", OtpPurpose::Registration)
            .unwrap();
        let attempt = |code: &str| {
            json!({
                "email": "b@example.com",
                "code": code,
                "first_name": "B",
                "password": PASSWORD,
                "confirm_password": PASSWORD,
            })
        };

        // The test server allows three attempts.
        for _ in 0..3 {
            let res = app
                .post_without_token(routes::OTP_VERIFY, &attempt(wrong_code(&code)))
                .await;
            assert_eq!(res.status, 400);
            assert_eq!(res.body["code"], "OTP_INVALID");
        }

        let res = app.post_without_token(routes::OTP_VERIFY, &attempt(&code)).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "OTP_INVALID");
    }

    #[tokio::test]
    async fn resend_replaces_previous_code() {
        let app = TestApp::spawn().await;
        app.post_without_token(routes::OTP_SEND, &json!({"email": "c@example.com"}))
            .await;
        let first = app
            .otp
            .last_code("c@example.com", OtpPurpose::Registration)
            .unwrap();
        app.post_without_token(routes::OTP_SEND, &json!({"email": "c@example.com"}))
            .await;
        let second = app
            .otp
            .last_code("c@example.com", OtpPurpose::Registration)
            .unwrap();

        if first != second {
            let res = app
                .post_without_token(
                    routes::OTP_VERIFY,
                    &json!({
                        "email": "c@example.com",
                        "code": first,
                        "first_name": "C",
                        "password": PASSWORD,
                        "confirm_password": PASSWORD,
                    }),
                )
                .await;
            assert_eq!(res.status, 400);
        }

        let res = app
            .post_without_token(
                routes::OTP_VERIFY,
                &json!({
                    "email": "c@example.com",
                    "code": second,
                    "first_name": "C",
                    "password": PASSWORD,
                    "confirm_password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn send_to_registered_email_conflicts() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("taken@example.com").await;

        let res = app
            .post_without_token(routes::OTP_SEND, &json!({"email": "taken@example.com"}))
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
        assert_eq!(app.otp.count(), 0);
    }
}

mod password_reset {
    use super::*;

    #[tokio::test]
    async fn reset_changes_password() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("reset@example.com").await;

        let res = app
            .post_without_token(routes::RESET_REQUEST, &json!({"email": "reset@example.com"}))
            .await;
        assert_eq!(res.status, 202);
        let code = app
            .otp
            .last_code("reset@example.com", OtpPurpose::PasswordReset)
            .unwrap();

        let res = app
            .post_without_token(
                routes::RESET_CONFIRM,
                &json!({
                    "email": "reset@example.com",
                    "code": code,
                    "password": "brand-new-pass",
                    "confirm_password": "brand-new-pass",
                }),
            )
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "reset@example.com", "password": PASSWORD}),
            )
            .await;
        assert_eq!(res.status, 401);

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "reset@example.com", "password": "brand-new-pass"}),
            )
            .await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn unknown_email_is_accepted_silently() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::RESET_REQUEST, &json!({"email": "ghost@example.com"}))
            .await;
        assert_eq!(res.status, 202);
        assert_eq!(app.otp.count(), 0);
    }

    #[tokio::test]
    async fn registration_code_cannot_reset_password() {
        let app = TestApp::spawn().await;
        app.post_without_token(routes::OTP_SEND, &json!({"email": "d@example.com"}))
            .await;
        let code = app
            .otp
            .last_code("d@example.com", OtpPurpose::Registration)
            .unwrap();

        let res = app
            .post_without_token(
                routes::RESET_CONFIRM,
                &json!({
                    "email": "d@example.com",
                    "code": code,
                    "password": "brand-new-pass",
                    "confirm_password": "brand-new-pass",
                }),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "OTP_INVALID");
    }
}
