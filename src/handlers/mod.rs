// handlers/mod.rs - Two security tiers
//
// Public (no token) -> Protected (token resolved to an active user by
// middleware::require_token)
pub mod protected;
pub mod public;

pub mod system;
