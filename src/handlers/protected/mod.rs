// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind `jwt_auth_middleware`, which places an
// `AuthUser` in the request extensions. All reads and writes are scoped
// to that user.
pub mod categories;
pub mod collections;
pub mod items;
pub mod profile;

pub use categories::category_post;
pub use collections::{collection_delete, collection_get, collection_items_get, collection_post, collection_put, collections_get};
pub use items::{item_delete, item_get, item_post, item_put};
pub use profile::{profile_get, user_put};
