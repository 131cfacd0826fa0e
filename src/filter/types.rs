use serde::Deserialize;

use super::error::FilterError;
use super::params::{parse_flag, parse_id_list};
use crate::database::models::Recipe;

/// Raw query string of the recipe list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

/// Raw query string of the tag and ingredient list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttributeQuery {
    pub assigned_only: Option<String>,
}

/// Restricts recipes to those touching any of the given tag ids and any of the
/// given ingredient ids. An absent list places no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

impl RecipeFilter {
    pub fn from_query(query: &RecipeQuery) -> Result<Self, FilterError> {
        Ok(Self {
            tags: parse_id_list("tags", query.tags.as_deref())?,
            ingredients: parse_id_list("ingredients", query.ingredients.as_deref())?,
        })
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        intersects(self.tags.as_deref(), &recipe.tag_ids)
            && intersects(self.ingredients.as_deref(), &recipe.ingredient_ids)
    }
}

fn intersects(wanted: Option<&[i64]>, present: &[i64]) -> bool {
    match wanted {
        None => true,
        Some(ids) => present.iter().any(|id| ids.contains(id)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeFilter {
    /// Only entities attached to at least one of the caller's recipes
    pub assigned_only: bool,
}

impl AttributeFilter {
    pub fn from_query(query: &AttributeQuery) -> Result<Self, FilterError> {
        Ok(Self {
            assigned_only: parse_flag("assigned_only", query.assigned_only.as_deref())?,
        })
    }
}
