use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::access::Owned;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AllergyCode {
    Gluten,
    Lactose,
    Eggs,
}

impl AllergyCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllergyCode::Gluten => "Gluten",
            AllergyCode::Lactose => "Lactose",
            AllergyCode::Eggs => "Eggs",
        }
    }
}

impl FromStr for AllergyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Gluten" => Ok(AllergyCode::Gluten),
            "Lactose" => Ok(AllergyCode::Lactose),
            "Eggs" => Ok(AllergyCode::Eggs),
            other => Err(format!("\"{}\" is not a valid choice.", other)),
        }
    }
}

/// A recipe with its tag and ingredient relations resolved to id sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    /// Storage path relative to the media root
    pub image: Option<String>,
    pub allergy_codes: Vec<AllergyCode>,
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

impl Owned for Recipe {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Validated fields for a new recipe; the owner comes from the scope it is inserted under.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub allergy_codes: Vec<AllergyCode>,
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

impl RecipeDraft {
    pub fn into_recipe(self, id: i64, user_id: i64) -> Recipe {
        Recipe {
            id,
            user_id,
            title: self.title,
            time_minutes: self.time_minutes,
            price: self.price,
            link: self.link,
            image: None,
            allergy_codes: self.allergy_codes,
            tag_ids: self.tag_ids,
            ingredient_ids: self.ingredient_ids,
        }
    }
}

/// Raw `recipes` row before relations are attached.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub allergy_codes: Vec<String>,
}

impl RecipeRow {
    pub fn into_recipe(self, tag_ids: Vec<i64>, ingredient_ids: Vec<i64>) -> Recipe {
        let allergy_codes = self
            .allergy_codes
            .iter()
            .filter_map(|code| match code.parse() {
                Ok(code) => Some(code),
                Err(_) => {
                    tracing::warn!("Ignoring unknown allergy code '{}' on recipe {}", code, self.id);
                    None
                }
            })
            .collect();

        Recipe {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            time_minutes: self.time_minutes,
            price: self.price,
            link: self.link,
            image: self.image,
            allergy_codes,
            tag_ids,
            ingredient_ids,
        }
    }
}
