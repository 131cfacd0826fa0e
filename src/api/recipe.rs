use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::attribute::AttributeView;
use super::validation::{self, FieldErrors, MAX_NAME_LENGTH};
use crate::config::MediaConfig;
use crate::database::models::{AllergyCode, Attribute, AttributeKind, Recipe, RecipeDraft};
use crate::database::Store;
use crate::error::ApiError;
use crate::services::images;

/// Body of recipe create, `PUT` and `PATCH`.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "validation::present")]
    pub link: Option<Option<String>>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
    pub allergy_codes: Option<Vec<String>>,
}

/// Validated recipe fields. `None` means "not supplied".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<Option<String>>,
    pub allergy_codes: Option<Vec<AllergyCode>>,
    pub tag_ids: Option<Vec<i64>>,
    pub ingredient_ids: Option<Vec<i64>>,
}

impl RecipeRequest {
    /// Field checks that need no store access. `require_all` enforces the
    /// fields a full replacement needs.
    pub fn check(self, require_all: bool) -> (RecipeChanges, FieldErrors) {
        let mut errors = FieldErrors::new();

        if require_all {
            for (field, missing) in [
                ("title", self.title.is_none()),
                ("time_minutes", self.time_minutes.is_none()),
                ("price", self.price.is_none()),
            ] {
                if missing {
                    errors.add(field, validation::REQUIRED);
                }
            }
        }

        let title = self
            .title
            .as_deref()
            .and_then(|title| errors.check("title", validation::text(title, MAX_NAME_LENGTH)));
        let time_minutes = self
            .time_minutes
            .and_then(|minutes| errors.check("time_minutes", validation::non_negative(minutes)));
        let price = self
            .price
            .and_then(|price| errors.check("price", validation::price(price)));
        // Outer `None` leaves the stored link untouched
        let link = self.link.and_then(|link| errors.check("link", validation::link(link)));
        let allergy_codes = self.allergy_codes.and_then(|codes| {
            let parsed: Result<Vec<AllergyCode>, String> = codes.iter().map(|code| code.parse()).collect();
            errors.check("allergy_codes", parsed).map(|mut codes| {
                codes.sort();
                codes.dedup();
                codes
            })
        });

        let changes = RecipeChanges {
            title,
            time_minutes,
            price,
            link,
            allergy_codes,
            tag_ids: self.tags.map(validation::id_set),
            ingredient_ids: self.ingredients.map(validation::id_set),
        };
        (changes, errors)
    }

    /// Full validation including existence of referenced tags and ingredients
    pub async fn validate(self, store: &dyn Store, require_all: bool) -> Result<RecipeChanges, ApiError> {
        let (changes, mut errors) = self.check(require_all);

        for (kind, ids) in [
            (AttributeKind::Tag, &changes.tag_ids),
            (AttributeKind::Ingredient, &changes.ingredient_ids),
        ] {
            if let Some(ids) = ids {
                if let Some(missing) = missing_reference(store, kind, ids).await? {
                    errors.add(kind.field(), format!("Invalid pk \"{}\" - object does not exist.", missing));
                }
            }
        }

        errors.into_result()?;
        Ok(changes)
    }
}

/// First referenced id that does not exist
async fn missing_reference(store: &dyn Store, kind: AttributeKind, ids: &[i64]) -> Result<Option<i64>, ApiError> {
    if ids.is_empty() {
        return Ok(None);
    }
    let found = store.find_attributes(kind, ids).await?;
    Ok(ids.iter().copied().find(|id| !found.iter().any(|a| a.id == *id)))
}

impl RecipeChanges {
    /// Build a new recipe; relations and allergy codes default to empty
    pub fn into_draft(self) -> Result<RecipeDraft, ApiError> {
        let (Some(title), Some(time_minutes), Some(price)) = (self.title, self.time_minutes, self.price) else {
            return Err(ApiError::validation_error("Invalid input", None));
        };

        Ok(RecipeDraft {
            title,
            time_minutes,
            price,
            link: self.link.flatten(),
            allergy_codes: self.allergy_codes.unwrap_or_default(),
            tag_ids: self.tag_ids.unwrap_or_default(),
            ingredient_ids: self.ingredient_ids.unwrap_or_default(),
        })
    }

    /// Overwrite the supplied fields on an existing recipe
    pub fn apply(self, recipe: &mut Recipe) {
        if let Some(title) = self.title {
            recipe.title = title;
        }
        if let Some(time_minutes) = self.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(price) = self.price {
            recipe.price = price;
        }
        if let Some(link) = self.link {
            recipe.link = link;
        }
        if let Some(codes) = self.allergy_codes {
            recipe.allergy_codes = codes;
        }
        if let Some(tag_ids) = self.tag_ids {
            recipe.tag_ids = tag_ids;
        }
        if let Some(ingredient_ids) = self.ingredient_ids {
            recipe.ingredient_ids = ingredient_ids;
        }
    }
}

fn format_price(price: Decimal) -> String {
    format!("{:.2}", price)
}

/// List, create and update representation: relations as id lists.
#[derive(Debug, Serialize)]
pub struct RecipeView {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<i64>,
    pub tags: Vec<i64>,
    pub time_minutes: i32,
    pub price: String,
    pub link: String,
    pub allergy_codes: Vec<AllergyCode>,
}

impl From<Recipe> for RecipeView {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            ingredients: recipe.ingredient_ids,
            tags: recipe.tag_ids,
            time_minutes: recipe.time_minutes,
            price: format_price(recipe.price),
            link: recipe.link.unwrap_or_default(),
            allergy_codes: recipe.allergy_codes,
        }
    }
}

/// Detail representation: relations expanded to `{id, name}`.
#[derive(Debug, Serialize)]
pub struct RecipeDetailView {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<AttributeView>,
    pub tags: Vec<AttributeView>,
    pub time_minutes: i32,
    pub price: String,
    pub link: String,
    pub allergy_codes: Vec<AllergyCode>,
    pub image: Option<String>,
}

impl RecipeDetailView {
    pub fn new(recipe: Recipe, tags: Vec<Attribute>, ingredients: Vec<Attribute>, media: &MediaConfig) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            ingredients: ingredients.into_iter().map(AttributeView::from).collect(),
            tags: tags.into_iter().map(AttributeView::from).collect(),
            time_minutes: recipe.time_minutes,
            price: format_price(recipe.price),
            link: recipe.link.unwrap_or_default(),
            allergy_codes: recipe.allergy_codes,
            image: recipe.image.as_deref().map(|path| images::media_url(media, path)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeImageView {
    pub id: i64,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::OwnerScope;
    use crate::database::models::NewUser;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn request(value: serde_json::Value) -> RecipeRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn create_requires_title_time_and_price() {
        let (_, errors) = request(json!({})).check(true);
        let body = errors.into_result().unwrap_err().to_json();
        assert_eq!(body["field_errors"]["title"], validation::REQUIRED);
        assert_eq!(body["field_errors"]["time_minutes"], validation::REQUIRED);
        assert_eq!(body["field_errors"]["price"], validation::REQUIRED);
    }

    #[test]
    fn partial_update_accepts_a_single_field() {
        let (changes, errors) = request(json!({"title": "Chicken tikka"})).check(false);
        assert!(errors.is_empty());
        assert_eq!(changes.title.as_deref(), Some("Chicken tikka"));
        assert!(changes.price.is_none());
        assert!(changes.tag_ids.is_none());
    }

    #[test]
    fn price_accepts_numbers_and_strings() {
        let (changes, errors) = request(json!({"price": 5.5})).check(false);
        assert!(errors.is_empty());
        assert_eq!(changes.price.map(format_price).as_deref(), Some("5.50"));

        let (changes, _) = request(json!({"price": "10.00"})).check(false);
        assert_eq!(changes.price.map(format_price).as_deref(), Some("10.00"));
    }

    #[test]
    fn link_null_and_absent_differ() {
        let (changes, _) = request(json!({"link": null})).check(false);
        assert_eq!(changes.link, Some(None));
        let (changes, _) = request(json!({})).check(false);
        assert_eq!(changes.link, None);
    }

    #[test]
    fn supplied_link_is_trimmed_and_kept() {
        let (changes, errors) = request(json!({"link": " https://example.com/pie "})).check(false);
        assert!(errors.is_empty());
        assert_eq!(changes.link, Some(Some("https://example.com/pie".to_string())));

        let (changes, _) = request(json!({"link": "  "})).check(false);
        assert_eq!(changes.link, Some(None));
    }

    #[test]
    fn overlong_link_is_a_field_error() {
        let (changes, errors) = request(json!({"link": "x".repeat(256)})).check(false);
        assert_eq!(changes.link, None);
        let body = errors.into_result().unwrap_err().to_json();
        assert!(body["field_errors"]["link"].is_string());
    }

    #[test]
    fn unknown_allergy_code_is_a_field_error() {
        let (_, errors) = request(json!({"allergy_codes": ["Gluten", "Peanuts"]})).check(false);
        let body = errors.into_result().unwrap_err().to_json();
        assert_eq!(body["field_errors"]["allergy_codes"], "\"Peanuts\" is not a valid choice.");
    }

    #[test]
    fn draft_defaults_relations_to_empty() {
        let (changes, _) = request(json!({"title": "Toast", "time_minutes": 3, "price": "1.50"})).check(true);
        let draft = changes.into_draft().unwrap();
        assert!(draft.tag_ids.is_empty());
        assert!(draft.ingredient_ids.is_empty());
        assert!(draft.allergy_codes.is_empty());
        assert_eq!(draft.link, None);
    }

    #[test]
    fn apply_only_touches_supplied_fields() {
        let mut recipe = RecipeDraft {
            title: "Spaghetti".into(),
            time_minutes: 25,
            price: Decimal::new(500, 2),
            link: Some("https://example.com".into()),
            allergy_codes: vec![AllergyCode::Gluten],
            tag_ids: vec![1],
            ingredient_ids: vec![2],
        }
        .into_recipe(1, 1);

        let (changes, _) = request(json!({"title": "Carbonara", "tags": []})).check(false);
        changes.apply(&mut recipe);

        assert_eq!(recipe.title, "Carbonara");
        assert!(recipe.tag_ids.is_empty());
        assert_eq!(recipe.ingredient_ids, vec![2]);
        assert_eq!(recipe.time_minutes, 25);
        assert_eq!(recipe.link.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn unknown_tag_ids_are_reported() {
        let store = MemoryStore::new();
        let user = store
            .insert_user(NewUser {
                email: "a@x.com".into(),
                name: String::new(),
                password_hash: "!".into(),
                is_active: true,
                is_staff: false,
                is_superuser: false,
            })
            .await
            .unwrap();
        let tag = store
            .insert_attribute(AttributeKind::Tag, &OwnerScope::for_user(&user), "Vegan")
            .await
            .unwrap();

        let ok = request(json!({"tags": [tag.id, tag.id]})).validate(&store, false).await.unwrap();
        assert_eq!(ok.tag_ids, Some(vec![tag.id]));

        let err = request(json!({"tags": [tag.id, 999]}))
            .validate(&store, false)
            .await
            .unwrap_err();
        assert_eq!(err.to_json()["field_errors"]["tags"], "Invalid pk \"999\" - object does not exist.");
    }

    #[test]
    fn views_render_price_with_two_places() {
        let recipe = RecipeDraft {
            title: "Soup".into(),
            time_minutes: 10,
            price: Decimal::new(5, 0),
            link: None,
            allergy_codes: vec![AllergyCode::Eggs],
            tag_ids: vec![],
            ingredient_ids: vec![],
        }
        .into_recipe(7, 1);

        let json = serde_json::to_value(RecipeView::from(recipe)).unwrap();
        assert_eq!(json["price"], "5.00");
        assert_eq!(json["link"], "");
        assert_eq!(json["allergy_codes"], json!(["Eggs"]));
    }
}
