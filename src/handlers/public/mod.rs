// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition plus the read-only listings the frontend shows to
// anonymous visitors.
pub mod auth;
pub mod categories;
pub mod health;
pub mod users;

pub use auth::{login, register};
pub use categories::categories_get;
pub use health::health;
pub use users::users_get;
