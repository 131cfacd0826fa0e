// handlers/protected/mod.rs - Token-authenticated handlers
//
// Security Level: token required, user resolved by middleware::require_token
// Route Prefix: /api/user/me, /api/recipe/*
// Every tag, ingredient and recipe operation runs inside the caller's OwnerScope.
pub mod attributes;
pub mod recipes;
pub mod user;
