//! Entity row models for the Muse schema
//!
//! One struct per table. Generated fields (ids, timestamps) are
//! `Option` and skipped during serialization when absent, so the same
//! struct serves as both an insert payload and a fetched row.
//!
//! Primary-key column names are declared explicitly on each entity
//! rather than inferred from table-name patterns.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};

/// All tables the deployed schema must expose
pub const REQUIRED_TABLES: [&str; 7] = [
    "user_profiles",
    "creator_profiles",
    "creator_content",
    "user_posts",
    "user_media",
    "user_follows",
    "post_inspirations",
];

/// A typed row bound to a table with a declared primary-key column
pub trait Entity: Serialize + DeserializeOwned {
    /// Table name in the deployed schema
    const TABLE: &'static str;
    /// Primary-key column name
    const PRIMARY_KEY: &'static str;

    /// Value of this row's primary key, if populated
    fn primary_key(&self) -> Option<Value>;
}

/// Subscription tier enumerated set enforced by the user_profiles CHECK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Pro,
}

impl SubscriptionTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub subscription_tier: SubscriptionTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for UserProfile {
    const TABLE: &'static str = "user_profiles";
    const PRIMARY_KEY: &'static str = "user_id";

    fn primary_key(&self) -> Option<Value> {
        Some(Value::String(self.user_id.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<Uuid>,
    pub profile_url: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for CreatorProfile {
    const TABLE: &'static str = "creator_profiles";
    const PRIMARY_KEY: &'static str = "creator_id";

    fn primary_key(&self) -> Option<Value> {
        self.creator_id.map(|id| Value::String(id.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub post_url: String,
    pub post_raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for CreatorContent {
    const TABLE: &'static str = "creator_content";
    const PRIMARY_KEY: &'static str = "content_id";

    fn primary_key(&self) -> Option<Value> {
        self.content_id.map(|id| Value::String(id.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<Uuid>,
    pub user_id: Uuid,
    pub raw_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for UserPost {
    const TABLE: &'static str = "user_posts";
    const PRIMARY_KEY: &'static str = "post_id";

    fn primary_key(&self) -> Option<Value> {
        self.post_id.map(|id| Value::String(id.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMedia {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_media_id: Option<Uuid>,
    pub post_id: Uuid,
    pub media_url: String,
    pub media_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for UserMedia {
    const TABLE: &'static str = "user_media";
    const PRIMARY_KEY: &'static str = "user_media_id";

    fn primary_key(&self) -> Option<Value> {
        self.user_media_id.map(|id| Value::String(id.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFollow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub creator_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for UserFollow {
    const TABLE: &'static str = "user_follows";
    const PRIMARY_KEY: &'static str = "id";

    fn primary_key(&self) -> Option<Value> {
        self.id.map(|id| Value::String(id.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostInspiration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub post_id: Uuid,
    pub content_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for PostInspiration {
    const TABLE: &'static str = "post_inspirations";
    const PRIMARY_KEY: &'static str = "id";

    fn primary_key(&self) -> Option<Value> {
        self.id.map(|id| Value::String(id.to_string()))
    }
}

/// Pull a named timestamp column out of a raw row
pub fn row_timestamp(row: &Value, column: &str) -> Result<DateTime<Utc>> {
    let raw = row
        .get(column)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Assertion(format!("row has no {column} timestamp")))?;
    parse_timestamp(raw)
}

/// Parse an ISO-8601 timestamp as returned by the store
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Assertion(format!("cannot interpret {raw:?} as timestamp: {e}")))
}
