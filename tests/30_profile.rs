mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestServer;

#[tokio::test]
async fn profile_defaults_after_register() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (user_id, token) = server.sign_up("ann").await?;

    let (status, body) = server.get("/api/keeper/profile", &token).await?;
    assert_eq!(status, StatusCode::OK);
    let user = &body["user"];
    assert_eq!(user["user_id"], user_id);
    assert_eq!(user["username"], "ann");
    assert_eq!(user["email"], "ann@example.com");
    assert_eq!(user["phone"], "-");
    assert!(user["birth_date"].is_null());
    assert_eq!(user["is_blocked"], false);
    Ok(())
}

#[tokio::test]
async fn update_profile_replaces_fields() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, token) = server.sign_up("ann").await?;

    let update = json!({
        "username": "ann.smith",
        "phone": "+44 20 7946 0000",
        "birth_date": "07-03-1990",
        "profile_image_url": "https://img.example.com/ann.png",
    });
    let (status, body) = server.put("/api/keeper/user", &token, update).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "ann.smith");
    assert_eq!(body["user"]["birth_date"], "07-03-1990");

    let (_, body) = server.get("/api/keeper/profile", &token).await?;
    let user = &body["user"];
    assert_eq!(user["email"], "ann@example.com");
    assert_eq!(user["phone"], "+44 20 7946 0000");
    assert_eq!(user["birth_date"], "07-03-1990");
    assert_eq!(user["profile_image_url"], "https://img.example.com/ann.png");

    // Omitted optional fields fall back to their defaults
    let update = json!({ "username": "ann.smith" });
    let (status, body) = server.put("/api/keeper/user", &token, update).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["phone"], "-");
    assert!(body["user"]["birth_date"].is_null());
    Ok(())
}

#[tokio::test]
async fn update_profile_validates_birth_date() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, token) = server.sign_up("ann").await?;

    let update = json!({ "username": "ann", "birth_date": "1990-03-07" });
    let (status, body) = server.put("/api/keeper/user", &token, update).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["birth_date"].is_string());
    Ok(())
}

#[tokio::test]
async fn profile_email_stays_the_login_email() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, ann) = server.sign_up("ann").await?;

    let update = json!({ "username": "ann", "email": "carol@example.com" });
    let (status, body) = server.put("/api/keeper/user", &ann, update).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ann@example.com");

    // carol can still register, log in and see her own profile
    let (carol_id, carol) = server.sign_up("carol").await?;
    let (status, body) = server.get("/api/keeper/profile", &carol).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["user_id"], carol_id);
    assert_eq!(body["user"]["email"], "carol@example.com");
    Ok(())
}

#[tokio::test]
async fn users_list_is_ordered_by_id() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (ann, _) = server.sign_up("ann").await?;
    let (bob, _) = server.sign_up("bob").await?;

    let (status, body) = server
        .send(reqwest::Method::GET, "/api/keeper/users", None, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["users"]
        .as_array()
        .expect("users")
        .iter()
        .filter_map(|u| u["user_id"].as_i64())
        .collect();
    assert_eq!(ids, vec![ann, bob]);
    Ok(())
}
