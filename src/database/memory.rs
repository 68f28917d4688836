use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::{
    Category, Collection, CollectionUpdate, Item, ItemUpdate, NewCategory, NewCollection, NewItem,
    ProfileUpdate, UserProfile,
};
use super::repository::{CategoryRepository, CollectionRepository, ItemRepository, UserRepository};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, UserProfile>,
    collections: BTreeMap<i64, Collection>,
    items: BTreeMap<i64, Item>,
    categories: BTreeMap<i64, Category>,
    next_collection_id: i64,
    next_item_id: i64,
    next_category_id: i64,
}

impl Tables {
    fn owned_collection(&self, user_id: i64, collection_id: i64) -> Result<&Collection, DatabaseError> {
        self.collections
            .get(&collection_id)
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| DatabaseError::not_found("collection"))
    }

    fn visible_collection(&self, user_id: i64, collection_id: i64) -> Result<&Collection, DatabaseError> {
        self.collections
            .get(&collection_id)
            .filter(|c| c.user_id == user_id || c.is_public)
            .ok_or_else(|| DatabaseError::not_found("collection"))
    }

    fn owned_item(&self, user_id: i64, item_id: i64) -> Result<&Item, DatabaseError> {
        let item = self
            .items
            .get(&item_id)
            .ok_or_else(|| DatabaseError::not_found("item"))?;
        self.owned_collection(user_id, item.collection_id)
            .map_err(|_| DatabaseError::not_found("item"))?;
        Ok(item)
    }

    fn check_category(&self, category_id: Option<i64>) -> Result<(), DatabaseError> {
        match category_id {
            Some(id) if !self.categories.contains_key(&id) => Err(DatabaseError::not_found("category")),
            _ => Ok(()),
        }
    }

    fn collection_name_taken(&self, user_id: i64, name: &str, except: Option<i64>) -> bool {
        self.collections
            .values()
            .any(|c| c.user_id == user_id && c.name == name && Some(c.id) != except)
    }

    fn item_title_taken(&self, collection_id: i64, title: &str, except: Option<i64>) -> bool {
        self.items
            .values()
            .any(|i| i.collection_id == collection_id && i.title == title && Some(i.id) != except)
    }
}

/// Keeper store held in process memory. Used by tests and local runs without Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn register(&self, user_id: i64, email: &str, username: &str) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user_id) || tables.users.values().any(|u| u.email == email) {
            return Err(DatabaseError::already_exists("user"));
        }
        tables.users.insert(
            user_id,
            UserProfile {
                user_id,
                username: username.to_string(),
                email: email.to_string(),
                phone: UserProfile::DEFAULT_PHONE.to_string(),
                birth_date: None,
                profile_image_url: None,
                is_active: true,
                is_blocked: false,
                created_at: Utc::now(),
                last_login: None,
            },
        );
        Ok(())
    }

    async fn user(&self, user_id: i64) -> Result<UserProfile, DatabaseError> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| DatabaseError::not_found("user"))
    }

    async fn users(&self) -> Result<Vec<UserProfile>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().cloned().collect())
    }

    async fn update_user(&self, user_id: i64, update: &ProfileUpdate) -> Result<UserProfile, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| DatabaseError::not_found("user"))?;
        user.username = update.username.clone();
        user.phone = update.phone.clone();
        user.birth_date = update.birth_date;
        user.profile_image_url = update.profile_image_url.clone();
        Ok(user.clone())
    }

    async fn record_login(&self, email: &str) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.values_mut().find(|u| u.email == email) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionRepository for MemoryStore {
    async fn create_collection(&self, user_id: i64, collection: &NewCollection) -> Result<i64, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(DatabaseError::not_found("user"));
        }
        tables.check_category(collection.category_id)?;
        if tables.collection_name_taken(user_id, &collection.name, None) {
            return Err(DatabaseError::already_exists("collection"));
        }

        tables.next_collection_id += 1;
        let id = tables.next_collection_id;
        let now = Utc::now();
        tables.collections.insert(
            id,
            Collection {
                id,
                user_id,
                name: collection.name.clone(),
                description: collection.description.clone(),
                cover_image_url: collection.cover_image_url.clone(),
                category_id: collection.category_id,
                is_public: collection.is_public,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn collection(&self, user_id: i64, collection_id: i64) -> Result<Collection, DatabaseError> {
        let tables = self.tables.read().await;
        tables.visible_collection(user_id, collection_id).cloned()
    }

    async fn collections(&self, user_id: i64) -> Result<Vec<Collection>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .collections
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_collection(
        &self,
        user_id: i64,
        collection_id: i64,
        update: &CollectionUpdate,
    ) -> Result<Collection, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.owned_collection(user_id, collection_id)?;
        tables.check_category(update.category_id)?;
        if tables.collection_name_taken(user_id, &update.name, Some(collection_id)) {
            return Err(DatabaseError::already_exists("collection"));
        }

        let collection = tables
            .collections
            .get_mut(&collection_id)
            .ok_or_else(|| DatabaseError::not_found("collection"))?;
        collection.name = update.name.clone();
        collection.description = update.description.clone();
        collection.cover_image_url = update.cover_image_url.clone();
        collection.category_id = update.category_id;
        collection.is_public = update.is_public;
        collection.updated_at = Utc::now();
        Ok(collection.clone())
    }

    async fn delete_collection(&self, user_id: i64, collection_id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.owned_collection(user_id, collection_id)?;
        tables.items.retain(|_, item| item.collection_id != collection_id);
        tables.collections.remove(&collection_id);
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for MemoryStore {
    async fn create_item(&self, user_id: i64, item: &NewItem) -> Result<i64, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.owned_collection(user_id, item.collection_id)?;
        tables.check_category(item.fields.category_id)?;
        if tables.item_title_taken(item.collection_id, &item.fields.title, None) {
            return Err(DatabaseError::already_exists("item"));
        }

        tables.next_item_id += 1;
        let id = tables.next_item_id;
        let now = Utc::now();
        let mut row = Item {
            id,
            collection_id: item.collection_id,
            title: String::new(),
            description: String::new(),
            category_id: None,
            country: String::new(),
            year: String::new(),
            attributes: Vec::new(),
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        row.apply(&item.fields);
        tables.items.insert(id, row);
        Ok(id)
    }

    async fn item(&self, user_id: i64, item_id: i64) -> Result<Item, DatabaseError> {
        let tables = self.tables.read().await;
        let item = tables
            .items
            .get(&item_id)
            .ok_or_else(|| DatabaseError::not_found("item"))?;
        tables
            .visible_collection(user_id, item.collection_id)
            .map_err(|_| DatabaseError::not_found("item"))?;
        Ok(item.clone())
    }

    async fn items(&self, user_id: i64, collection_id: i64) -> Result<Vec<Item>, DatabaseError> {
        let tables = self.tables.read().await;
        tables.visible_collection(user_id, collection_id)?;
        Ok(tables
            .items
            .values()
            .filter(|i| i.collection_id == collection_id)
            .cloned()
            .collect())
    }

    async fn update_item(&self, user_id: i64, item_id: i64, update: &ItemUpdate) -> Result<Item, DatabaseError> {
        let mut tables = self.tables.write().await;
        let collection_id = tables.owned_item(user_id, item_id)?.collection_id;
        tables.check_category(update.category_id)?;
        if tables.item_title_taken(collection_id, &update.title, Some(item_id)) {
            return Err(DatabaseError::already_exists("item"));
        }

        let item = tables
            .items
            .get_mut(&item_id)
            .ok_or_else(|| DatabaseError::not_found("item"))?;
        item.apply(update);
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete_item(&self, user_id: i64, item_id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.owned_item(user_id, item_id)?;
        tables.items.remove(&item_id);
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn categories(&self) -> Result<Vec<Category>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().cloned().collect())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<i64, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.name == category.name) {
            return Err(DatabaseError::already_exists("category"));
        }
        tables.next_category_id += 1;
        let id = tables.next_category_id;
        tables.categories.insert(
            id,
            Category {
                id,
                name: category.name.clone(),
                description: category.description.clone(),
            },
        );
        Ok(id)
    }
}
