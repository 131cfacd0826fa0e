mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{data, pluck, TestServer};

const TAGS: &str = "/api/recipe/tags";

#[tokio::test]
async fn login_required_for_tags() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url(TAGS)).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn tags_are_listed_by_name_descending() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_new_user("test@example.com").await?;
    server.create_tag(&token, "Vegan").await?;
    server.create_tag(&token, "Dessert").await?;
    server.create_tag(&token, "Breakfast").await?;

    let tags = data(server.get(&token, TAGS).send().await?).await?;
    assert_eq!(pluck(&tags, "name"), vec!["Vegan", "Dessert", "Breakfast"]);
    Ok(())
}

#[tokio::test]
async fn tags_are_limited_to_the_user() -> Result<()> {
    let server = TestServer::spawn().await?;
    let other = server.login_new_user("other@example.com").await?;
    server.create_tag(&other, "Fruity").await?;

    let token = server.login_new_user("test@example.com").await?;
    let id = server.create_tag(&token, "Comfort Food").await?;

    let tags = data(server.get(&token, TAGS).send().await?).await?;
    assert_eq!(tags, json!([{ "id": id, "name": "Comfort Food" }]));
    Ok(())
}

#[tokio::test]
async fn create_tag_successful() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_new_user("test@example.com").await?;

    let res = server.post(&token, TAGS, json!({ "name": "Test tag" })).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let tag = data(res).await?;
    assert_eq!(tag["name"], "Test tag");
    assert!(tag["id"].is_i64());
    Ok(())
}

#[tokio::test]
async fn create_tag_invalid() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_new_user("test@example.com").await?;

    let res = server.post(&token, TAGS, json!({ "name": "" })).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["field_errors"]["name"], "This field may not be blank.");

    let tags = data(server.get(&token, TAGS).send().await?).await?;
    assert_eq!(tags, json!([]));
    Ok(())
}

#[tokio::test]
async fn assigned_only_returns_tags_used_by_recipes() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_new_user("test@example.com").await?;
    let breakfast = server.create_tag(&token, "Breakfast").await?;
    server.create_tag(&token, "Lunch").await?;
    server
        .create_recipe(&token, json!({ "title": "Coriander eggs on toast", "tags": [breakfast] }))
        .await?;

    let tags = data(server.get(&token, &format!("{}?assigned_only=1", TAGS)).send().await?).await?;
    assert_eq!(pluck(&tags, "name"), vec!["Breakfast"]);
    Ok(())
}

#[tokio::test]
async fn assigned_only_returns_unique_tags() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_new_user("test@example.com").await?;
    let breakfast = server.create_tag(&token, "Breakfast").await?;
    server.create_tag(&token, "Lunch").await?;
    server
        .create_recipe(&token, json!({ "title": "Pancakes", "tags": [breakfast] }))
        .await?;
    server
        .create_recipe(&token, json!({ "title": "Porridge", "tags": [breakfast] }))
        .await?;

    let tags = data(server.get(&token, &format!("{}?assigned_only=1", TAGS)).send().await?).await?;
    assert_eq!(tags.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn invalid_assigned_only_flag_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_new_user("test@example.com").await?;

    let res = server.get(&token, &format!("{}?assigned_only=maybe", TAGS)).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
