pub mod attribute;
pub mod recipe;
pub mod user;

pub use attribute::{Attribute, AttributeKind};
pub use recipe::{AllergyCode, Recipe, RecipeDraft};
pub use user::{NewUser, User};
