use async_trait::async_trait;

use super::manager::DatabaseError;
use super::models::{Attribute, AttributeKind, NewUser, Recipe, RecipeDraft, User};
use crate::access::OwnerScope;
use crate::filter::{AttributeFilter, RecipeFilter};

/// Persistence port for every operation the API needs.
///
/// Operations on tags, ingredients and recipes take an [`OwnerScope`] and must
/// never return or touch rows outside it.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    /// Insert a user; a taken email is `DatabaseError::Conflict`
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    /// Exact match on the stored (already normalized) email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Persist email, name, password hash and flags of an existing user
    async fn update_user(&self, user: &User) -> Result<User, DatabaseError>;

    /// Scoped tags or ingredients ordered by name descending, each at most once
    async fn list_attributes(
        &self,
        kind: AttributeKind,
        scope: &OwnerScope,
        filter: AttributeFilter,
    ) -> Result<Vec<Attribute>, DatabaseError>;

    async fn insert_attribute(
        &self,
        kind: AttributeKind,
        scope: &OwnerScope,
        name: &str,
    ) -> Result<Attribute, DatabaseError>;

    /// Look up tags or ingredients by id regardless of owner, ordered by id
    async fn find_attributes(&self, kind: AttributeKind, ids: &[i64]) -> Result<Vec<Attribute>, DatabaseError>;

    /// Scoped recipes matching the filter, newest first, each at most once
    async fn list_recipes(&self, scope: &OwnerScope, filter: &RecipeFilter) -> Result<Vec<Recipe>, DatabaseError>;

    async fn find_recipe(&self, scope: &OwnerScope, id: i64) -> Result<Option<Recipe>, DatabaseError>;

    async fn insert_recipe(&self, scope: &OwnerScope, draft: RecipeDraft) -> Result<Recipe, DatabaseError>;

    /// Overwrite every mutable field and both relation sets; the owner is never changed
    async fn update_recipe(&self, scope: &OwnerScope, recipe: &Recipe) -> Result<Recipe, DatabaseError>;

    /// Returns false when no recipe with that id exists in scope
    async fn delete_recipe(&self, scope: &OwnerScope, id: i64) -> Result<bool, DatabaseError>;
}
