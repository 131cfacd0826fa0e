pub mod identity;
pub mod images;

pub use identity::{normalize_email, IdentityError, IdentityService, ProfileChanges, UserFields};
pub use images::{decode_format, generate_recipe_image_path, save_recipe_image, ImageError};
