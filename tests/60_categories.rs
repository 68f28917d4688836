mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::TestServer;

#[tokio::test]
async fn non_admin_cannot_create_category() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, token) = server.sign_up("ann").await?;

    let (status, body) = server
        .post("/api/keeper/category", &token, json!({ "name": "Coins" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (_, body) = server.send(Method::GET, "/api/keeper/categories", None, None).await?;
    assert_eq!(body["categories"], json!([]));
    Ok(())
}

#[tokio::test]
async fn admin_creates_category() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (user_id, token) = server.sign_up("ann").await?;
    server.credentials.set_admin(user_id, true).await?;

    let category = json!({ "name": "Coins", "description": "Numismatics" });
    let (status, body) = server.post("/api/keeper/category", &token, category).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Coins");
    let id = body["id"].as_i64().expect("id");

    let (status, body) = server.send(Method::GET, "/api/keeper/categories", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["categories"],
        json!([{ "id": id, "name": "Coins", "description": "Numismatics" }])
    );

    let (status, _) = server
        .post("/api/keeper/category", &token, json!({ "name": "Coins" }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn collections_and_items_reference_categories() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (user_id, token) = server.sign_up("ann").await?;
    server.credentials.set_admin(user_id, true).await?;

    let (_, body) = server
        .post("/api/keeper/category", &token, json!({ "name": "Coins" }))
        .await?;
    let category_id = body["id"].as_i64().expect("id");

    let (status, created) = server
        .post(
            "/api/keeper/collection",
            &token,
            json!({ "name": "Roman coins", "category_id": category_id }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let collection_id = created["id"].as_i64().expect("collection id");

    let item = json!({ "collection_id": collection_id, "title": "As", "category_id": category_id });
    let (status, created) = server.post("/api/keeper/item", &token, item).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = server
        .get(&format!("/api/keeper/item/{}", created["id"]), &token)
        .await?;
    assert_eq!(body["item"]["category_id"], category_id);

    let item = json!({ "collection_id": collection_id, "title": "Dupondius", "category_id": category_id + 1 });
    let (status, _) = server.post("/api/keeper/item", &token, item).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn category_requires_name() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (user_id, token) = server.sign_up("ann").await?;
    server.credentials.set_admin(user_id, true).await?;

    let (status, _) = server
        .post("/api/keeper/category", &token, json!({ "name": "" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}
