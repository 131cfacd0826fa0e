use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;

use super::manager::DatabaseError;
use super::models::recipe::RecipeRow;
use super::models::{Attribute, AttributeKind, NewUser, Recipe, RecipeDraft, User};
use super::store::Store;
use crate::access::OwnerScope;
use crate::filter::{AttributeFilter, RecipeFilter};

const USER_COLUMNS: &str =
    "id, email, name, password_hash, is_active, is_staff, is_superuser, created_at, updated_at";

const RECIPE_COLUMNS: &str = "id, user_id, title, time_minutes, price, link, image, allergy_codes";

/// `Store` backed by Postgres through sqlx
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach tag and ingredient id sets to a batch of recipe rows
    async fn attach_relations(&self, rows: Vec<RecipeRow>) -> Result<Vec<Recipe>, DatabaseError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut tags = self.relation_map(AttributeKind::Tag, &ids).await?;
        let mut ingredients = self.relation_map(AttributeKind::Ingredient, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let tag_ids = tags.remove(&row.id).unwrap_or_default();
                let ingredient_ids = ingredients.remove(&row.id).unwrap_or_default();
                row.into_recipe(tag_ids, ingredient_ids)
            })
            .collect())
    }

    async fn relation_map(
        &self,
        kind: AttributeKind,
        recipe_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<i64>>, DatabaseError> {
        let sql = format!(
            "SELECT recipe_id, {col} FROM {join} WHERE recipe_id = ANY($1) ORDER BY recipe_id, {col}",
            col = kind.join_column(),
            join = kind.join_table(),
        );
        let pairs: Vec<(i64, i64)> = sqlx::query_as(&sql)
            .bind(recipe_ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
        for (recipe_id, attribute_id) in pairs {
            map.entry(recipe_id).or_default().push(attribute_id);
        }
        Ok(map)
    }

    async fn replace_relations(
        tx: &mut Transaction<'_, Postgres>,
        kind: AttributeKind,
        recipe_id: i64,
        ids: &[i64],
    ) -> Result<(), DatabaseError> {
        let delete = format!("DELETE FROM {} WHERE recipe_id = $1", kind.join_table());
        sqlx::query(&delete).bind(recipe_id).execute(&mut **tx).await?;

        if ids.is_empty() {
            return Ok(());
        }
        let insert = format!(
            "INSERT INTO {join} (recipe_id, {col}) SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
            join = kind.join_table(),
            col = kind.join_column(),
        );
        sqlx::query(&insert)
            .bind(recipe_id)
            .bind(ids.to_vec())
            .execute(&mut **tx)
            .await
            .map_err(|e| DatabaseError::from_write(e, "Duplicate recipe relation"))?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (email, name, password_hash, is_active, is_staff, is_superuser)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.is_active)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_write(e, format!("Email '{}' is already registered", user.email)))
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<User, DatabaseError> {
        let sql = format!(
            "UPDATE users
             SET email = $2, name = $3, password_hash = $4, is_active = $5, is_staff = $6,
                 is_superuser = $7, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.is_active)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_write(e, format!("Email '{}' is already registered", user.email)))?
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }

    async fn list_attributes(
        &self,
        kind: AttributeKind,
        scope: &OwnerScope,
        filter: AttributeFilter,
    ) -> Result<Vec<Attribute>, DatabaseError> {
        // EXISTS keeps each row once no matter how many recipes reference it
        let assigned = if filter.assigned_only {
            format!(
                "AND EXISTS (SELECT 1 FROM {join} j JOIN recipes r ON r.id = j.recipe_id
                             WHERE j.{col} = a.id AND r.user_id = $1)",
                join = kind.join_table(),
                col = kind.join_column(),
            )
        } else {
            String::new()
        };
        let sql = format!(
            "SELECT a.id, a.user_id, a.name FROM {table} a
             WHERE a.user_id = $1 {assigned}
             ORDER BY a.name COLLATE \"C\" DESC, a.id DESC",
            table = kind.table(),
        );

        let rows = sqlx::query_as::<_, Attribute>(&sql)
            .bind(scope.user_id())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_attribute(
        &self,
        kind: AttributeKind,
        scope: &OwnerScope,
        name: &str,
    ) -> Result<Attribute, DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name",
            kind.table()
        );
        let row = sqlx::query_as::<_, Attribute>(&sql)
            .bind(scope.user_id())
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_attributes(&self, kind: AttributeKind, ids: &[i64]) -> Result<Vec<Attribute>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT id, user_id, name FROM {} WHERE id = ANY($1) ORDER BY id",
            kind.table()
        );
        let rows = sqlx::query_as::<_, Attribute>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_recipes(&self, scope: &OwnerScope, filter: &RecipeFilter) -> Result<Vec<Recipe>, DatabaseError> {
        let sql = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r
             WHERE r.user_id = $1
               AND ($2::BIGINT[] IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_tags rt WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2)))
               AND ($3::BIGINT[] IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_ingredients ri WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3)))
             ORDER BY r.id DESC"
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(scope.user_id())
            .bind(filter.tags.clone())
            .bind(filter.ingredients.clone())
            .fetch_all(&self.pool)
            .await?;
        self.attach_relations(rows).await
    }

    async fn find_recipe(&self, scope: &OwnerScope, id: i64) -> Result<Option<Recipe>, DatabaseError> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id)
            .bind(scope.user_id())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_relations(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn insert_recipe(&self, scope: &OwnerScope, draft: RecipeDraft) -> Result<Recipe, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO recipes (user_id, title, time_minutes, price, link, allergy_codes)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {RECIPE_COLUMNS}"
        );
        let codes: Vec<String> = draft.allergy_codes.iter().map(|c| c.as_str().to_string()).collect();
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(scope.user_id())
            .bind(&draft.title)
            .bind(draft.time_minutes)
            .bind(draft.price)
            .bind(&draft.link)
            .bind(codes)
            .fetch_one(&mut *tx)
            .await?;

        Self::replace_relations(&mut tx, AttributeKind::Tag, row.id, &draft.tag_ids).await?;
        Self::replace_relations(&mut tx, AttributeKind::Ingredient, row.id, &draft.ingredient_ids).await?;
        tx.commit().await?;

        Ok(row.into_recipe(draft.tag_ids, draft.ingredient_ids))
    }

    async fn update_recipe(&self, scope: &OwnerScope, recipe: &Recipe) -> Result<Recipe, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE recipes
             SET title = $3, time_minutes = $4, price = $5, link = $6, image = $7, allergy_codes = $8
             WHERE id = $1 AND user_id = $2
             RETURNING {RECIPE_COLUMNS}"
        );
        let codes: Vec<String> = recipe.allergy_codes.iter().map(|c| c.as_str().to_string()).collect();
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(recipe.id)
            .bind(scope.user_id())
            .bind(&recipe.title)
            .bind(recipe.time_minutes)
            .bind(recipe.price)
            .bind(&recipe.link)
            .bind(&recipe.image)
            .bind(codes)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Recipe not found".to_string()))?;

        Self::replace_relations(&mut tx, AttributeKind::Tag, row.id, &recipe.tag_ids).await?;
        Self::replace_relations(&mut tx, AttributeKind::Ingredient, row.id, &recipe.ingredient_ids).await?;
        tx.commit().await?;

        Ok(row.into_recipe(recipe.tag_ids.clone(), recipe.ingredient_ids.clone()))
    }

    async fn delete_recipe(&self, scope: &OwnerScope, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(scope.user_id())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
