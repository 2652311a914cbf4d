use image::ImageFormat;
use reqwest::Method;
use serde_json::json;

use crate::common::{TestApp, admin_token, image_bytes, routes, token_for};

/// Create a user and return a token whose `uid` is that user.
async fn signed_in_user(app: &TestApp, email: &str, password: &str) -> (i32, String) {
    let id = app.create_user(&admin_token(), email, password).await;
    (id, token_for(id, &[]))
}

#[tokio::test]
async fn profile_returns_the_callers_record_without_password() {
    let app = TestApp::spawn().await;
    let (id, token) = signed_in_user(&app, "me@example.com", "initial-pass").await;

    let res = app.get_with_token(routes::PROFILE, &token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.id(), id);
    assert_eq!(res.data()["fields"]["email"], "me@example.com");
    assert!(res.data()["fields"].get("password").is_none());
}

#[tokio::test]
async fn profile_requires_a_token() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::PROFILE).await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn trashed_account_has_no_profile() {
    let app = TestApp::spawn().await;
    let (id, token) = signed_in_user(&app, "gone@example.com", "initial-pass").await;
    app.delete_with_token(&routes::record("users", id), &admin_token())
        .await;

    let res = app.get_with_token(routes::PROFILE, &token).await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn update_ignores_fields_outside_the_profile() {
    let app = TestApp::spawn().await;
    let (_, token) = signed_in_user(&app, "me@example.com", "initial-pass").await;

    let res = app
        .put_with_token(
            routes::PROFILE,
            &json!({ "name": "Renamed", "role": "admin" }),
            &token,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["fields"]["name"], "Renamed");
    assert_eq!(res.data()["fields"]["role"], "editor");
}

#[tokio::test]
async fn email_must_stay_unique() {
    let app = TestApp::spawn().await;
    app.create_user(&admin_token(), "taken@example.com", "pass-one")
        .await;
    let (_, token) = signed_in_user(&app, "me@example.com", "pass-two").await;

    let res = app
        .put_with_token(
            routes::PROFILE,
            &json!({ "email": "TAKEN@example.com" }),
            &token,
        )
        .await;

    assert_eq!(res.status, 422);
    assert!(res.body["data"]["email"].is_array());
}

#[tokio::test]
async fn avatar_upload_replaces_previous_files() {
    let app = TestApp::spawn().await;
    let (_, token) = signed_in_user(&app, "me@example.com", "initial-pass").await;

    let first = app
        .multipart_with_token(
            Method::PUT,
            routes::PROFILE,
            &[],
            &[("avatar", "me.png", image_bytes(200, 200, ImageFormat::Png))],
            &token,
        )
        .await;
    assert_eq!(first.status, 200, "{}", first.text);
    let old_path = first.data()["media"]["avatar"]["path"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(old_path.starts_with("users/avatar/"), "{old_path}");

    let second = app
        .multipart_with_token(
            Method::PUT,
            routes::PROFILE,
            &[("name", "Still Me")],
            &[("avatar", "me.jpg", image_bytes(200, 200, ImageFormat::Jpeg))],
            &token,
        )
        .await;
    assert_eq!(second.status, 200, "{}", second.text);
    let new_path = second.data()["media"]["avatar"]["path"].as_str().unwrap();

    assert!(app.blob_exists(new_path).await);
    assert!(!app.blob_exists(&old_path).await);
}

mod password {
    use super::*;

    #[tokio::test]
    async fn change_with_correct_current_password() {
        let app = TestApp::spawn().await;
        let (_, token) = signed_in_user(&app, "me@example.com", "initial-pass").await;

        let res = app
            .put_with_token(
                routes::PROFILE_PASSWORD,
                &json!({
                    "current_password": "initial-pass",
                    "password": "next-pass",
                    "password_confirmation": "next-pass",
                }),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        // The old password no longer verifies.
        let retry = app
            .put_with_token(
                routes::PROFILE_PASSWORD,
                &json!({
                    "current_password": "initial-pass",
                    "password": "third-pass",
                    "password_confirmation": "third-pass",
                }),
                &token,
            )
            .await;
        assert_eq!(retry.status, 422);

        let again = app
            .put_with_token(
                routes::PROFILE_PASSWORD,
                &json!({
                    "current_password": "next-pass",
                    "password": "third-pass",
                    "password_confirmation": "third-pass",
                }),
                &token,
            )
            .await;
        assert_eq!(again.status, 200, "{}", again.text);
    }

    #[tokio::test]
    async fn wrong_current_password_is_a_field_error() {
        let app = TestApp::spawn().await;
        let (_, token) = signed_in_user(&app, "me@example.com", "initial-pass").await;

        let res = app
            .put_with_token(
                routes::PROFILE_PASSWORD,
                &json!({
                    "current_password": "guess",
                    "password": "next-pass",
                    "password_confirmation": "next-pass",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 422);
        assert!(res.body["data"]["current_password"].is_array());
    }

    #[tokio::test]
    async fn blank_new_password_is_rejected() {
        let app = TestApp::spawn().await;
        let (_, token) = signed_in_user(&app, "me@example.com", "initial-pass").await;

        let res = app
            .put_with_token(
                routes::PROFILE_PASSWORD,
                &json!({
                    "current_password": "initial-pass",
                    "password": "",
                    "password_confirmation": "",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 422);
        assert!(res.body["data"]["password"].is_array());
    }

    #[tokio::test]
    async fn confirmation_must_match() {
        let app = TestApp::spawn().await;
        let (_, token) = signed_in_user(&app, "me@example.com", "initial-pass").await;

        let res = app
            .put_with_token(
                routes::PROFILE_PASSWORD,
                &json!({
                    "current_password": "initial-pass",
                    "password": "next-pass",
                    "password_confirmation": "next-pasS",
                }),
                &token,
            )
            .await;
        assert_eq!(res.status, 422);
        assert_eq!(
            res.body["data"]["password"][0],
            "The password field confirmation does not match."
        );

        // The old password still applies.
        let retry = app
            .put_with_token(
                routes::PROFILE_PASSWORD,
                &json!({
                    "current_password": "initial-pass",
                    "password": "next-pass",
                    "password_confirmation": "next-pass",
                }),
                &token,
            )
            .await;
        assert_eq!(retry.status, 200, "{}", retry.text);
    }

    #[tokio::test]
    async fn missing_fields_are_a_bad_request() {
        let app = TestApp::spawn().await;
        let (_, token) = signed_in_user(&app, "me@example.com", "initial-pass").await;

        let res = app
            .put_with_token(
                routes::PROFILE_PASSWORD,
                &json!({ "password": "x", "password_confirmation": "x" }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
    }
}
