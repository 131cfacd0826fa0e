//! Wire representations: request payloads with their validation, and response views.

pub mod attribute;
pub mod recipe;
pub mod user;
pub mod validation;

pub use attribute::{AttributeRequest, AttributeView};
pub use recipe::{RecipeChanges, RecipeDetailView, RecipeImageView, RecipeRequest, RecipeView};
pub use user::{CreateUserRequest, TokenRequest, TokenView, UpdateUserRequest, UserView};
