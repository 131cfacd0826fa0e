use serde::{Deserialize, Serialize};

use super::validation::{self, FieldErrors, MAX_NAME_LENGTH};
use crate::database::models::Attribute;
use crate::error::ApiError;

/// Body of `POST /api/recipe/tags` and `POST /api/recipe/ingredients`.
#[derive(Debug, Deserialize)]
pub struct AttributeRequest {
    pub name: Option<String>,
}

impl AttributeRequest {
    pub fn validate(self) -> Result<String, ApiError> {
        let mut errors = FieldErrors::new();
        let name = errors.check("name", validation::required_text(self.name.as_deref(), MAX_NAME_LENGTH));
        errors.into_result()?;
        name.ok_or_else(|| ApiError::field("name", validation::REQUIRED))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeView {
    pub id: i64,
    pub name: String,
}

impl From<Attribute> for AttributeView {
    fn from(attribute: Attribute) -> Self {
        Self {
            id: attribute.id,
            name: attribute.name,
        }
    }
}
