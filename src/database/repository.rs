//! Storage capabilities the keeper service depends on.
//!
//! Each entity family gets its own trait so callers can be handed only
//! what they use. [`PgStore`](super::PgStore) and
//! [`MemoryStore`](super::MemoryStore) implement all four.
//!
//! Every mutation of a collection or item takes the acting user's id and
//! confirms ownership before writing. A failed ownership check is
//! indistinguishable from a missing row: both yield
//! [`DatabaseError::NotFound`].

use async_trait::async_trait;

use super::manager::DatabaseError;
use super::models::{
    Category, Collection, CollectionUpdate, Item, ItemUpdate, NewCategory, NewCollection, NewItem,
    ProfileUpdate, UserProfile,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Mirror a freshly registered identity into the domain store
    async fn register(&self, user_id: i64, email: &str, username: &str) -> Result<(), DatabaseError>;

    async fn user(&self, user_id: i64) -> Result<UserProfile, DatabaseError>;

    /// All profiles ordered by user id
    async fn users(&self) -> Result<Vec<UserProfile>, DatabaseError>;

    async fn update_user(&self, user_id: i64, update: &ProfileUpdate) -> Result<UserProfile, DatabaseError>;

    /// Stamp `last_login`; unknown emails are ignored
    async fn record_login(&self, email: &str) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait CollectionRepository: Send + Sync {
    async fn create_collection(&self, user_id: i64, collection: &NewCollection) -> Result<i64, DatabaseError>;

    /// Visible when owned by `user_id` or public
    async fn collection(&self, user_id: i64, collection_id: i64) -> Result<Collection, DatabaseError>;

    /// Collections owned by `user_id`, ordered by id
    async fn collections(&self, user_id: i64) -> Result<Vec<Collection>, DatabaseError>;

    async fn update_collection(
        &self,
        user_id: i64,
        collection_id: i64,
        update: &CollectionUpdate,
    ) -> Result<Collection, DatabaseError>;

    /// Removes the collection and all of its items
    async fn delete_collection(&self, user_id: i64, collection_id: i64) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn create_item(&self, user_id: i64, item: &NewItem) -> Result<i64, DatabaseError>;

    /// Visible when the parent collection is owned by `user_id` or public
    async fn item(&self, user_id: i64, item_id: i64) -> Result<Item, DatabaseError>;

    /// Items of a visible collection, ordered by id
    async fn items(&self, user_id: i64, collection_id: i64) -> Result<Vec<Item>, DatabaseError>;

    async fn update_item(&self, user_id: i64, item_id: i64, update: &ItemUpdate) -> Result<Item, DatabaseError>;

    async fn delete_item(&self, user_id: i64, item_id: i64) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories ordered by id
    async fn categories(&self) -> Result<Vec<Category>, DatabaseError>;

    async fn create_category(&self, category: &NewCategory) -> Result<i64, DatabaseError>;
}

/// Everything the keeper service needs from one backing store
pub trait KeeperStore: UserRepository + CollectionRepository + ItemRepository + CategoryRepository {}

impl<T> KeeperStore for T where T: UserRepository + CollectionRepository + ItemRepository + CategoryRepository {}
