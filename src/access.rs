//! Owner scoping shared by tags, ingredients and recipes.
//!
//! Every list or detail operation on a user-owned entity goes through an
//! [`OwnerScope`]. Records outside the scope are never an error: lists simply
//! omit them and detail lookups report not found.

use crate::database::models::User;

/// An entity that belongs to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl<T: Owned> Owned for &T {
    fn owner_id(&self) -> i64 {
        (**self).owner_id()
    }
}

/// Visibility window of the authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerScope {
    user_id: i64,
}

impl OwnerScope {
    pub fn for_user(user: &User) -> Self {
        Self { user_id: user.id }
    }

    pub fn for_user_id(user_id: i64) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn permits<T: Owned>(&self, entity: &T) -> bool {
        entity.owner_id() == self.user_id
    }

    /// Drop everything the scope does not permit
    pub fn restrict<T: Owned>(&self, entities: impl IntoIterator<Item = T>) -> Vec<T> {
        entities.into_iter().filter(|e| self.permits(e)).collect()
    }
}
