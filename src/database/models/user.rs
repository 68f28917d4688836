use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Wire format for birth dates
pub const BIRTH_DATE_FORMAT: &str = "%d-%m-%Y";

/// Domain-side user profile, keyed by the identity service's user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub phone: String,
    #[serde(default, with = "birth_date")]
    pub birth_date: Option<NaiveDate>,
    pub profile_image_url: Option<String>,
    pub is_active: bool,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub const DEFAULT_PHONE: &'static str = "-";
}

/// Profile fields a user may change. `email` mirrors the keeper-sso login
/// and is fixed at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub profile_image_url: Option<String>,
}

/// `Option<NaiveDate>` as `DD-MM-YYYY`, null when unset
pub mod birth_date {
    use super::BIRTH_DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format(BIRTH_DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, BIRTH_DATE_FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
