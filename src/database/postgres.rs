use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::manager::{is_foreign_key_violation, is_unique_violation, DatabaseError};
use super::models::{
    Category, Collection, CollectionUpdate, Item, ItemUpdate, NewCategory, NewCollection, NewItem,
    ProfileUpdate, UserProfile,
};
use super::repository::{CategoryRepository, CollectionRepository, ItemRepository, UserRepository};

const USER_COLUMNS: &str = "user_id, username, email, phone, birth_date, profile_image_url, \
     is_active, is_blocked, created_at, last_login";

const COLLECTION_COLUMNS: &str = "id, user_id, name, description, cover_image_url, category_id, \
     is_public, created_at, updated_at";

const ITEM_COLUMNS: &str = "i.id, i.collection_id, i.title, i.description, i.category_id, i.country, \
     i.year, i.attributes, i.item_images_url, i.created_at, i.updated_at";

/// Keeper store over the `keeper` schema, see `schema/keeper.sql`.
///
/// Ownership prechecks lock the parent row (`FOR UPDATE`) and run in the
/// same transaction as the write they guard.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn write_error(err: sqlx::Error, what: &str) -> DatabaseError {
    if is_unique_violation(&err) {
        DatabaseError::already_exists(what)
    } else if is_foreign_key_violation(&err) {
        DatabaseError::not_found(format!("{} reference", what))
    } else {
        DatabaseError::Sqlx(err)
    }
}

async fn check_category(conn: &mut PgConnection, category_id: Option<i64>) -> Result<(), DatabaseError> {
    let Some(id) = category_id else {
        return Ok(());
    };
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM keeper.categories WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(DatabaseError::not_found("category"))
    }
}

async fn lock_owned_collection(
    conn: &mut PgConnection,
    user_id: i64,
    collection_id: i64,
) -> Result<(), DatabaseError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM keeper.collections WHERE id = $1 AND user_id = $2 FOR UPDATE")
        .bind(collection_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(|_| ())
        .ok_or_else(|| DatabaseError::not_found("collection"))
}

/// Lock an item whose parent collection belongs to `user_id`; returns the parent id
async fn lock_owned_item(conn: &mut PgConnection, user_id: i64, item_id: i64) -> Result<i64, DatabaseError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT i.collection_id FROM keeper.items i \
         JOIN keeper.collections c ON c.id = i.collection_id \
         WHERE i.id = $1 AND c.user_id = $2 FOR UPDATE OF i",
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DatabaseError::not_found("item"))
}

#[async_trait]
impl UserRepository for PgStore {
    async fn register(&self, user_id: i64, email: &str, username: &str) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO keeper.users_info (user_id, email, username, phone) VALUES ($1, $2, $3, $4)")
            .bind(user_id)
            .bind(email)
            .bind(username)
            .bind(UserProfile::DEFAULT_PHONE)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, "user"))?;
        Ok(())
    }

    async fn user(&self, user_id: i64) -> Result<UserProfile, DatabaseError> {
        let sql = format!("SELECT {} FROM keeper.users_info WHERE user_id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("user"))
    }

    async fn users(&self) -> Result<Vec<UserProfile>, DatabaseError> {
        let sql = format!("SELECT {} FROM keeper.users_info ORDER BY user_id", USER_COLUMNS);
        Ok(sqlx::query_as::<_, UserProfile>(&sql).fetch_all(&self.pool).await?)
    }

    async fn update_user(&self, user_id: i64, update: &ProfileUpdate) -> Result<UserProfile, DatabaseError> {
        let sql = format!(
            "UPDATE keeper.users_info \
             SET username = $1, phone = $2, birth_date = $3, profile_image_url = $4 \
             WHERE user_id = $5 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(&update.username)
            .bind(&update.phone)
            .bind(update.birth_date)
            .bind(&update.profile_image_url)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("user"))
    }

    async fn record_login(&self, email: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE keeper.users_info SET last_login = now() WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionRepository for PgStore {
    async fn create_collection(&self, user_id: i64, collection: &NewCollection) -> Result<i64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let owner_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM keeper.users_info WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
        if !owner_exists {
            return Err(DatabaseError::not_found("user"));
        }
        check_category(&mut tx, collection.category_id).await?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO keeper.collections (user_id, name, description, cover_image_url, category_id, is_public) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(user_id)
        .bind(&collection.name)
        .bind(&collection.description)
        .bind(&collection.cover_image_url)
        .bind(collection.category_id)
        .bind(collection.is_public)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "collection"))?;

        tx.commit().await?;
        Ok(id)
    }

    async fn collection(&self, user_id: i64, collection_id: i64) -> Result<Collection, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM keeper.collections WHERE id = $1 AND (user_id = $2 OR is_public)",
            COLLECTION_COLUMNS
        );
        sqlx::query_as::<_, Collection>(&sql)
            .bind(collection_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("collection"))
    }

    async fn collections(&self, user_id: i64) -> Result<Vec<Collection>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM keeper.collections WHERE user_id = $1 ORDER BY id",
            COLLECTION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Collection>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_collection(
        &self,
        user_id: i64,
        collection_id: i64,
        update: &CollectionUpdate,
    ) -> Result<Collection, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        lock_owned_collection(&mut tx, user_id, collection_id).await?;
        check_category(&mut tx, update.category_id).await?;

        let sql = format!(
            "UPDATE keeper.collections \
             SET name = $1, description = $2, cover_image_url = $3, category_id = $4, is_public = $5, \
                 updated_at = now() \
             WHERE id = $6 AND user_id = $7 RETURNING {}",
            COLLECTION_COLUMNS
        );
        let collection = sqlx::query_as::<_, Collection>(&sql)
            .bind(&update.name)
            .bind(&update.description)
            .bind(&update.cover_image_url)
            .bind(update.category_id)
            .bind(update.is_public)
            .bind(collection_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| write_error(e, "collection"))?;

        tx.commit().await?;
        Ok(collection)
    }

    async fn delete_collection(&self, user_id: i64, collection_id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        lock_owned_collection(&mut tx, user_id, collection_id).await?;

        sqlx::query("DELETE FROM keeper.items WHERE collection_id = $1")
            .bind(collection_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM keeper.collections WHERE id = $1 AND user_id = $2")
            .bind(collection_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for PgStore {
    async fn create_item(&self, user_id: i64, item: &NewItem) -> Result<i64, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        lock_owned_collection(&mut tx, user_id, item.collection_id).await?;
        check_category(&mut tx, item.fields.category_id).await?;

        let fields = &item.fields;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO keeper.items \
             (collection_id, title, description, category_id, country, year, attributes, item_images_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(item.collection_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.category_id)
        .bind(&fields.country)
        .bind(&fields.year)
        .bind(&fields.attributes)
        .bind(&fields.images)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "item"))?;

        tx.commit().await?;
        Ok(id)
    }

    async fn item(&self, user_id: i64, item_id: i64) -> Result<Item, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM keeper.items i JOIN keeper.collections c ON c.id = i.collection_id \
             WHERE i.id = $1 AND (c.user_id = $2 OR c.is_public)",
            ITEM_COLUMNS
        );
        sqlx::query_as::<_, Item>(&sql)
            .bind(item_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("item"))
    }

    async fn items(&self, user_id: i64, collection_id: i64) -> Result<Vec<Item>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let visible: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM keeper.collections WHERE id = $1 AND (user_id = $2 OR is_public))",
        )
        .bind(collection_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if !visible {
            return Err(DatabaseError::not_found("collection"));
        }

        let sql = format!(
            "SELECT {} FROM keeper.items i WHERE i.collection_id = $1 ORDER BY i.id",
            ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(collection_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(items)
    }

    async fn update_item(&self, user_id: i64, item_id: i64, update: &ItemUpdate) -> Result<Item, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        lock_owned_item(&mut tx, user_id, item_id).await?;
        check_category(&mut tx, update.category_id).await?;

        let sql = format!(
            "UPDATE keeper.items i \
             SET title = $1, description = $2, category_id = $3, country = $4, year = $5, \
                 attributes = $6, item_images_url = $7, updated_at = now() \
             WHERE i.id = $8 RETURNING {}",
            ITEM_COLUMNS
        );
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(&update.title)
            .bind(&update.description)
            .bind(update.category_id)
            .bind(&update.country)
            .bind(&update.year)
            .bind(&update.attributes)
            .bind(&update.images)
            .bind(item_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| write_error(e, "item"))?;

        tx.commit().await?;
        Ok(item)
    }

    async fn delete_item(&self, user_id: i64, item_id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        lock_owned_item(&mut tx, user_id, item_id).await?;

        sqlx::query("DELETE FROM keeper.items WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for PgStore {
    async fn categories(&self) -> Result<Vec<Category>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, Category>("SELECT id, name, description FROM keeper.categories ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn create_category(&self, category: &NewCategory) -> Result<i64, DatabaseError> {
        sqlx::query_scalar::<_, i64>("INSERT INTO keeper.categories (name, description) VALUES ($1, $2) RETURNING id")
            .bind(&category.name)
            .bind(&category.description)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, "category"))
    }
}

/// Runs against a live database: `DATABASE_URL=postgres://... cargo test -- --ignored`
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;
    use sqlx::Executor;
    use std::sync::atomic::{AtomicI64, Ordering};

    async fn store() -> Option<PgStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new().max_connections(2).connect(&url).await.unwrap();
        // One multi-statement query runs as one transaction; the lock serialises parallel tests
        let schema = format!("SELECT pg_advisory_xact_lock(7031);\n{}", include_str!("../../schema/keeper.sql"));
        pool.execute(schema.as_str()).await.unwrap();
        Some(PgStore::new(pool))
    }

    /// Fresh user id per call so runs never collide on the shared tables
    fn unique_id() -> i64 {
        static SEQ: AtomicI64 = AtomicI64::new(0);
        Utc::now().timestamp_micros() * 100 + SEQ.fetch_add(1, Ordering::Relaxed) % 100
    }

    async fn user(store: &PgStore) -> i64 {
        let id = unique_id();
        store
            .register(id, &format!("user{}@example.com", id), &format!("user{}", id))
            .await
            .unwrap();
        id
    }

    fn coins() -> NewCollection {
        NewCollection {
            name: "Coins".to_string(),
            description: " Old coins ".to_string(),
            cover_image_url: String::new(),
            category_id: None,
            is_public: false,
        }
    }

    fn denarius(collection_id: i64) -> NewItem {
        NewItem {
            collection_id,
            fields: ItemUpdate {
                title: " Denarius ".to_string(),
                description: String::new(),
                category_id: None,
                country: "Rome".to_string(),
                year: "44 BC".to_string(),
                attributes: vec!["silver".to_string(), String::new()],
                images: vec![String::new(), "https://img.example.com/d.png".to_string()],
            },
        }
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn register_twice_already_exists() {
        let Some(store) = store().await else { return };
        let id = user(&store).await;
        let err = store.register(id, "other@example.com", "other").await.unwrap_err();
        assert!(matches!(err, DatabaseError::AlreadyExists(_)));
        assert_eq!(store.user(id).await.unwrap().phone, UserProfile::DEFAULT_PHONE);
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn update_user_keeps_login_email() {
        let Some(store) = store().await else { return };
        let id = user(&store).await;
        let update = ProfileUpdate {
            username: "renamed".to_string(),
            ..ProfileUpdate::default()
        };
        let updated = store.update_user(id, &update).await.unwrap();
        assert_eq!(updated.username, "renamed");
        assert_eq!(updated.email, format!("user{}@example.com", id));

        let err = store.update_user(-1, &update).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn collection_reads_back_supplied_fields() {
        let Some(store) = store().await else { return };
        let owner = user(&store).await;
        let id = store.create_collection(owner, &coins()).await.unwrap();

        let stored = store.collection(owner, id).await.unwrap();
        let expected = coins();
        assert_eq!(stored.user_id, owner);
        assert_eq!(stored.name, expected.name);
        assert_eq!(stored.description, expected.description);
        assert_eq!(stored.cover_image_url, expected.cover_image_url);
        assert_eq!(stored.category_id, None);
        assert!(!stored.is_public);

        let err = store.create_collection(owner, &coins()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::AlreadyExists(_)));
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn foreign_owner_cannot_see_or_mutate_collection() {
        let Some(store) = store().await else { return };
        let ann = user(&store).await;
        let bob = user(&store).await;
        let id = store.create_collection(ann, &coins()).await.unwrap();

        assert!(matches!(store.collection(bob, id).await, Err(DatabaseError::NotFound(_))));
        assert!(matches!(store.update_collection(bob, id, &coins()).await, Err(DatabaseError::NotFound(_))));
        assert!(matches!(store.delete_collection(bob, id).await, Err(DatabaseError::NotFound(_))));

        let mut public = coins();
        public.is_public = true;
        store.update_collection(ann, id, &public).await.unwrap();
        assert_eq!(store.collection(bob, id).await.unwrap().id, id);
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn unknown_category_is_not_found() {
        let Some(store) = store().await else { return };
        let owner = user(&store).await;
        let mut collection = coins();
        collection.category_id = Some(-1);
        let err = store.create_collection(owner, &collection).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
        assert!(store.collections(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn item_under_missing_collection_writes_nothing() {
        let Some(store) = store().await else { return };
        let owner = user(&store).await;
        let err = store.create_item(owner, &denarius(-1)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM keeper.items WHERE collection_id = -1")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn item_reads_back_exactly() {
        let Some(store) = store().await else { return };
        let owner = user(&store).await;
        let collection_id = store.create_collection(owner, &coins()).await.unwrap();
        let item_id = store.create_item(owner, &denarius(collection_id)).await.unwrap();

        let stored = store.item(owner, item_id).await.unwrap();
        let expected = denarius(collection_id).fields;
        assert_eq!(stored.collection_id, collection_id);
        assert_eq!(stored.title, expected.title);
        assert_eq!(stored.description, expected.description);
        assert_eq!(stored.attributes, expected.attributes);
        assert_eq!(stored.images, expected.images);

        let err = store.create_item(owner, &denarius(collection_id)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::AlreadyExists(_)));
        assert_eq!(store.items(owner, collection_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn deleting_collection_removes_items() {
        let Some(store) = store().await else { return };
        let owner = user(&store).await;
        let collection_id = store.create_collection(owner, &coins()).await.unwrap();
        let item_id = store.create_item(owner, &denarius(collection_id)).await.unwrap();

        store.delete_collection(owner, collection_id).await.unwrap();
        assert!(matches!(store.item(owner, item_id).await, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn category_names_are_unique() {
        let Some(store) = store().await else { return };
        let new = NewCategory {
            name: format!("Numismatics {}", unique_id()),
            description: String::new(),
        };
        let id = store.create_category(&new).await.unwrap();
        assert!(matches!(store.create_category(&new).await, Err(DatabaseError::AlreadyExists(_))));
        assert!(store.categories().await.unwrap().iter().any(|c| c.id == id && c.name == new.name));
    }
}
