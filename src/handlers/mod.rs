// handlers/mod.rs - keeper-api request handlers, split by security tier
//
// Public (no auth) → Protected (JWT auth via middleware::auth)
pub mod protected; // Tier 2: Bearer token required (/api/keeper/*)
pub mod public; // Tier 1: No authentication required (/api/auth/*, public listings)
pub mod validate;
