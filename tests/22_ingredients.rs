mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{data, pluck, TestServer};

const INGREDIENTS: &str = "/api/recipe/ingredients";

#[tokio::test]
async fn login_required_for_ingredients() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url(INGREDIENTS)).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn ingredients_are_listed_by_name_descending() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_new_user("test@example.com").await?;
    server.create_ingredient(&token, "Kale").await?;
    server.create_ingredient(&token, "Salt").await?;

    let ingredients = data(server.get(&token, INGREDIENTS).send().await?).await?;
    assert_eq!(pluck(&ingredients, "name"), vec!["Salt", "Kale"]);
    Ok(())
}

#[tokio::test]
async fn ingredients_are_limited_to_the_user() -> Result<()> {
    let server = TestServer::spawn().await?;
    let other = server.login_new_user("other@example.com").await?;
    server.create_ingredient(&other, "Vinegar").await?;

    let token = server.login_new_user("test@example.com").await?;
    let id = server.create_ingredient(&token, "Tumeric").await?;

    let ingredients = data(server.get(&token, INGREDIENTS).send().await?).await?;
    assert_eq!(ingredients, json!([{ "id": id, "name": "Tumeric" }]));
    Ok(())
}

#[tokio::test]
async fn create_ingredient_successful() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_new_user("test@example.com").await?;

    let res = server.post(&token, INGREDIENTS, json!({ "name": "Cabbage" })).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(data(res).await?["name"], "Cabbage");

    let ingredients = data(server.get(&token, INGREDIENTS).send().await?).await?;
    assert_eq!(pluck(&ingredients, "name"), vec!["Cabbage"]);
    Ok(())
}

#[tokio::test]
async fn create_ingredient_invalid() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_new_user("test@example.com").await?;

    let res = server.post(&token, INGREDIENTS, json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["field_errors"]["name"], "This field is required.");
    Ok(())
}

#[tokio::test]
async fn assigned_only_filters_and_deduplicates_ingredients() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login_new_user("test@example.com").await?;
    let eggs = server.create_ingredient(&token, "Eggs").await?;
    server.create_ingredient(&token, "Cheese").await?;
    server
        .create_recipe(&token, json!({ "title": "Eggs benedict", "ingredients": [eggs] }))
        .await?;
    server
        .create_recipe(&token, json!({ "title": "Omelette", "ingredients": [eggs] }))
        .await?;

    let path = format!("{}?assigned_only=true", INGREDIENTS);
    let ingredients = data(server.get(&token, &path).send().await?).await?;
    assert_eq!(ingredients, json!([{ "id": eggs, "name": "Eggs" }]));
    Ok(())
}
