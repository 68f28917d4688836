use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub cover_image_url: String,
    pub category_id: Option<i64>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied collection fields. Owner and timestamps are set by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCollection {
    pub name: String,
    pub description: String,
    pub cover_image_url: String,
    pub category_id: Option<i64>,
    pub is_public: bool,
}

/// Updates replace every editable field
pub type CollectionUpdate = NewCollection;
