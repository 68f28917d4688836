use std::sync::Arc;
use tracing::debug;

use crate::database::models::{
    Category, Collection, CollectionUpdate, Item, ItemUpdate, NewCategory, NewCollection, NewItem,
    ProfileUpdate, UserProfile,
};
use crate::database::{
    CategoryRepository, CollectionRepository, DatabaseError, ItemRepository, KeeperStore, UserRepository,
};

/// Domain operations behind the keeper HTTP handlers
#[derive(Clone)]
pub struct KeeperService {
    users: Arc<dyn UserRepository>,
    collections: Arc<dyn CollectionRepository>,
    items: Arc<dyn ItemRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl KeeperService {
    /// Wire every capability to the same backing store
    pub fn new<S: KeeperStore + 'static>(store: Arc<S>) -> Self {
        Self {
            users: store.clone(),
            collections: store.clone(),
            items: store.clone(),
            categories: store,
        }
    }

    // Users

    pub async fn register_profile(&self, user_id: i64, email: &str, username: &str) -> Result<(), DatabaseError> {
        debug!(user_id, "registering profile");
        self.users.register(user_id, email, username).await
    }

    pub async fn profile(&self, user_id: i64) -> Result<UserProfile, DatabaseError> {
        debug!(user_id, "fetching profile");
        self.users.user(user_id).await
    }

    pub async fn users(&self) -> Result<Vec<UserProfile>, DatabaseError> {
        debug!("listing users");
        self.users.users().await
    }

    pub async fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<UserProfile, DatabaseError> {
        debug!(user_id, "updating profile");
        self.users.update_user(user_id, update).await
    }

    pub async fn record_login(&self, email: &str) -> Result<(), DatabaseError> {
        debug!("recording login");
        self.users.record_login(email).await
    }

    // Collections

    pub async fn create_collection(&self, user_id: i64, collection: &NewCollection) -> Result<i64, DatabaseError> {
        debug!(user_id, name = %collection.name, "creating collection");
        self.collections.create_collection(user_id, collection).await
    }

    pub async fn collection(&self, user_id: i64, collection_id: i64) -> Result<Collection, DatabaseError> {
        debug!(user_id, collection_id, "fetching collection");
        self.collections.collection(user_id, collection_id).await
    }

    pub async fn collections(&self, user_id: i64) -> Result<Vec<Collection>, DatabaseError> {
        debug!(user_id, "listing collections");
        self.collections.collections(user_id).await
    }

    pub async fn update_collection(
        &self,
        user_id: i64,
        collection_id: i64,
        update: &CollectionUpdate,
    ) -> Result<Collection, DatabaseError> {
        debug!(user_id, collection_id, "updating collection");
        self.collections.update_collection(user_id, collection_id, update).await
    }

    pub async fn delete_collection(&self, user_id: i64, collection_id: i64) -> Result<(), DatabaseError> {
        debug!(user_id, collection_id, "deleting collection");
        self.collections.delete_collection(user_id, collection_id).await
    }

    // Items

    pub async fn create_item(&self, user_id: i64, item: &NewItem) -> Result<i64, DatabaseError> {
        debug!(user_id, collection_id = item.collection_id, "creating item");
        self.items.create_item(user_id, item).await
    }

    pub async fn item(&self, user_id: i64, item_id: i64) -> Result<Item, DatabaseError> {
        debug!(user_id, item_id, "fetching item");
        self.items.item(user_id, item_id).await
    }

    pub async fn items(&self, user_id: i64, collection_id: i64) -> Result<Vec<Item>, DatabaseError> {
        debug!(user_id, collection_id, "listing items");
        self.items.items(user_id, collection_id).await
    }

    pub async fn update_item(&self, user_id: i64, item_id: i64, update: &ItemUpdate) -> Result<Item, DatabaseError> {
        debug!(user_id, item_id, "updating item");
        self.items.update_item(user_id, item_id, update).await
    }

    pub async fn delete_item(&self, user_id: i64, item_id: i64) -> Result<(), DatabaseError> {
        debug!(user_id, item_id, "deleting item");
        self.items.delete_item(user_id, item_id).await
    }

    // Categories

    pub async fn categories(&self) -> Result<Vec<Category>, DatabaseError> {
        debug!("listing categories");
        self.categories.categories().await
    }

    pub async fn create_category(&self, category: &NewCategory) -> Result<i64, DatabaseError> {
        debug!(name = %category.name, "creating category");
        self.categories.create_category(category).await
    }
}
