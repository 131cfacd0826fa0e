use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::{Attribute, AttributeKind, NewUser, Recipe, RecipeDraft, User};
use super::store::Store;
use crate::access::OwnerScope;
use crate::filter::{AttributeFilter, RecipeFilter};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    tags: BTreeMap<i64, Attribute>,
    ingredients: BTreeMap<i64, Attribute>,
    recipes: BTreeMap<i64, Recipe>,
    user_seq: i64,
    tag_seq: i64,
    ingredient_seq: i64,
    recipe_seq: i64,
}

impl Tables {
    fn attributes(&self, kind: AttributeKind) -> &BTreeMap<i64, Attribute> {
        match kind {
            AttributeKind::Tag => &self.tags,
            AttributeKind::Ingredient => &self.ingredients,
        }
    }

    fn attributes_mut(&mut self, kind: AttributeKind) -> (&mut BTreeMap<i64, Attribute>, &mut i64) {
        match kind {
            AttributeKind::Tag => (&mut self.tags, &mut self.tag_seq),
            AttributeKind::Ingredient => (&mut self.ingredients, &mut self.ingredient_seq),
        }
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    /// Mirrors the foreign keys on the join tables
    fn check_references(&self, kind: AttributeKind, ids: &[i64]) -> Result<(), DatabaseError> {
        let table = self.attributes(kind);
        match ids.iter().find(|id| !table.contains_key(id)) {
            Some(missing) => Err(DatabaseError::QueryError(format!(
                "{} {} does not exist",
                kind.label(),
                missing
            ))),
            None => Ok(()),
        }
    }
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

fn unique_sorted(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// In-process `Store` used for local development and tests.
///
/// Enforces the same constraints as the Postgres schema: unique emails,
/// existing relation targets and one row per recipe relation.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(DatabaseError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }

        let now = Utc::now();
        let id = next_id(&mut tables.user_seq);
        let row = User {
            id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(id, row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, Some(user.id)) {
            return Err(DatabaseError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }

        let row = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;
        row.email = user.email.clone();
        row.name = user.name.clone();
        row.password_hash = user.password_hash.clone();
        row.is_active = user.is_active;
        row.is_staff = user.is_staff;
        row.is_superuser = user.is_superuser;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn list_attributes(
        &self,
        kind: AttributeKind,
        scope: &OwnerScope,
        filter: AttributeFilter,
    ) -> Result<Vec<Attribute>, DatabaseError> {
        let tables = self.tables.read().await;

        let mut rows = scope.restrict(tables.attributes(kind).values().cloned());
        if filter.assigned_only {
            let own_recipes = scope.restrict(tables.recipes.values());
            rows.retain(|attribute| {
                own_recipes.iter().any(|recipe| match kind {
                    AttributeKind::Tag => recipe.tag_ids.contains(&attribute.id),
                    AttributeKind::Ingredient => recipe.ingredient_ids.contains(&attribute.id),
                })
            });
        }
        rows.sort_by(|a, b| b.name.cmp(&a.name).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn insert_attribute(
        &self,
        kind: AttributeKind,
        scope: &OwnerScope,
        name: &str,
    ) -> Result<Attribute, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&scope.user_id()) {
            return Err(DatabaseError::QueryError(format!("user {} does not exist", scope.user_id())));
        }

        let (table, seq) = tables.attributes_mut(kind);
        let id = next_id(seq);
        let row = Attribute {
            id,
            user_id: scope.user_id(),
            name: name.to_string(),
        };
        table.insert(id, row.clone());
        Ok(row)
    }

    async fn find_attributes(&self, kind: AttributeKind, ids: &[i64]) -> Result<Vec<Attribute>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .attributes(kind)
            .values()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn list_recipes(&self, scope: &OwnerScope, filter: &RecipeFilter) -> Result<Vec<Recipe>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Recipe> = scope
            .restrict(tables.recipes.values().cloned())
            .into_iter()
            .filter(|recipe| filter.matches(recipe))
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn find_recipe(&self, scope: &OwnerScope, id: i64) -> Result<Option<Recipe>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .recipes
            .get(&id)
            .filter(|recipe| scope.permits(*recipe))
            .cloned())
    }

    async fn insert_recipe(&self, scope: &OwnerScope, draft: RecipeDraft) -> Result<Recipe, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_references(AttributeKind::Tag, &draft.tag_ids)?;
        tables.check_references(AttributeKind::Ingredient, &draft.ingredient_ids)?;

        let id = next_id(&mut tables.recipe_seq);
        let mut recipe = draft.into_recipe(id, scope.user_id());
        recipe.tag_ids = unique_sorted(recipe.tag_ids);
        recipe.ingredient_ids = unique_sorted(recipe.ingredient_ids);
        tables.recipes.insert(id, recipe.clone());
        Ok(recipe)
    }

    async fn update_recipe(&self, scope: &OwnerScope, recipe: &Recipe) -> Result<Recipe, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_references(AttributeKind::Tag, &recipe.tag_ids)?;
        tables.check_references(AttributeKind::Ingredient, &recipe.ingredient_ids)?;

        let row = tables
            .recipes
            .get_mut(&recipe.id)
            .filter(|existing| scope.permits(&**existing))
            .ok_or_else(|| DatabaseError::NotFound("Recipe not found".to_string()))?;

        // Owner stays whatever it was at creation
        row.title = recipe.title.clone();
        row.time_minutes = recipe.time_minutes;
        row.price = recipe.price;
        row.link = recipe.link.clone();
        row.image = recipe.image.clone();
        row.allergy_codes = recipe.allergy_codes.clone();
        row.tag_ids = unique_sorted(recipe.tag_ids.clone());
        row.ingredient_ids = unique_sorted(recipe.ingredient_ids.clone());
        Ok(row.clone())
    }

    async fn delete_recipe(&self, scope: &OwnerScope, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let owned = tables.recipes.get(&id).is_some_and(|r| scope.permits(r));
        if owned {
            tables.recipes.remove(&id);
        }
        Ok(owned)
    }
}
