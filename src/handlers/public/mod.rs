// handlers/public/mod.rs - Account creation and token acquisition
//
// Security Level: None
// Route Prefix: /api/user
pub mod user;

pub use user::{create_token, create_user};
