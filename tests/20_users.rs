mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;

use restaurant_api::database::schema;
use restaurant_api::testing;

fn token_request(credentials: Option<(&str, &str)>) -> Request<Body> {
    let mut builder = Request::builder().uri("/v1/users/token");
    if let Some((email, password)) = credentials {
        let encoded = STANDARD.encode(format!("{email}:{password}"));
        builder = builder.header(header::AUTHORIZATION, format!("Basic {encoded}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn token_is_issued_for_valid_credentials() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, body) = app
        .send_request(token_request(Some((schema::ADMIN_EMAIL, schema::SEED_PASSWORD))))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let token = body["token"].as_str().unwrap_or_default();
    let claims = testing::authenticator().parse_claims(token)?;
    assert_eq!(claims.sub, schema::ADMIN_ID.to_string());
    assert!(claims.is_admin());

    // The issued token works against a protected route.
    let (status, _) = app.get("/v1/users", Some(token)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn token_requires_credentials() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, body) = app.send_request(token_request(None)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "must provide email and password in Basic auth" }));

    let (wrong_status, wrong) = app
        .send_request(token_request(Some((schema::ADMIN_EMAIL, "not-gophers"))))
        .await?;
    let (unknown_status, unknown) = app
        .send_request(token_request(Some(("nobody@example.com", schema::SEED_PASSWORD))))
        .await?;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
    assert_eq!(wrong, json!({ "error": "Authentication failed" }));
    Ok(())
}

#[tokio::test]
async fn listing_users_is_admin_only() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, body) = app.get("/v1/users", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let (status, _) = app.get("/v1/users", Some(&app.user_token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get("/v1/users", Some(&app.admin_token)).await?;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().map(Vec::len).unwrap_or_default();
    assert_eq!(users, 2);
    assert!(body[0].get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn token_signed_by_another_key_is_rejected() -> Result<()> {
    let app = common::spawn_app().await?;
    let claims = testing::authenticator().parse_claims(&app.admin_token)?;
    let forged = testing::other_authenticator().generate_token(&claims)?;

    let (status, body) = app.get("/v1/users", Some(&forged)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));
    Ok(())
}

#[tokio::test]
async fn create_user_validates_fields() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, body) = app.post("/v1/users", Some(&app.admin_token), json!({})).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "field validation error");
    assert_eq!(common::field_names(&body), vec!["email", "name", "password", "roles"]);
    Ok(())
}

#[tokio::test]
async fn created_user_can_sign_in() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, created) = app
        .post(
            "/v1/users",
            Some(&app.admin_token),
            json!({
                "name": "Ada",
                "email": "ada@example.com",
                "roles": ["USER"],
                "password": "lovelace",
                "password_confirm": "lovelace",
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["email"], "ada@example.com");
    assert!(created.get("password_hash").is_none());

    let (status, body) = app.send_request(token_request(Some(("ada@example.com", "lovelace")))).await?;
    assert_eq!(status, StatusCode::OK);

    let claims = testing::authenticator().parse_claims(body["token"].as_str().unwrap_or_default())?;
    assert_eq!(claims.roles, vec!["USER".to_string()]);
    assert_eq!(Some(claims.sub.as_str()), created["id"].as_str());
    Ok(())
}

#[tokio::test]
async fn create_user_requires_matching_confirmation() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, body) = app
        .post(
            "/v1/users",
            Some(&app.admin_token),
            json!({
                "name": "Ada",
                "email": "ada@example.com",
                "roles": ["USER"],
                "password": "lovelace",
                "password_confirm": "babbage",
            }),
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(common::field_names(&body), vec!["password_confirm"]);
    Ok(())
}
