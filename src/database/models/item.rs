use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub collection_id: i64,
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub country: String,
    pub year: String,
    pub attributes: Vec<String>,
    #[serde(rename = "item_images_url")]
    #[sqlx(rename = "item_images_url")]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewItem {
    pub collection_id: i64,
    #[serde(flatten)]
    pub fields: ItemUpdate,
}

/// Editable item fields; an update cannot move an item to another collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemUpdate {
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub country: String,
    pub year: String,
    pub attributes: Vec<String>,
    #[serde(rename = "item_images_url")]
    pub images: Vec<String>,
}

impl Item {
    pub(crate) fn apply(&mut self, update: &ItemUpdate) {
        self.title = update.title.clone();
        self.description = update.description.clone();
        self.category_id = update.category_id;
        self.country = update.country.clone();
        self.year = update.year.clone();
        self.attributes = update.attributes.clone();
        self.images = update.images.clone();
    }
}
