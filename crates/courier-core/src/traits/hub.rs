//! Hub repository trait: the external content repository/catalog exposing
//! create/update/delete/list of shared content items with owner and
//! reference metadata.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::result::AppResult;

/// Metadata tag attached to published content.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContentTag {
    /// Tag name.
    pub name: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last modification timestamp.
    pub modified: DateTime<Utc>,
}

/// A downloadable reference of a published content item.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContentReference {
    /// Repository-internal path, contains the uploaded filename.
    pub logical_path: String,
    /// Externally reachable download path.
    pub external_path: String,
}

/// A shared content item as known to the hub.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HubContent {
    /// Content identifier.
    pub id: Uuid,
    /// Content name.
    pub name: String,
    /// Owning principal, if assigned.
    pub owner: Option<String>,
    /// Tags attached to the content.
    pub tags: Vec<ContentTag>,
    /// Download references.
    pub references: Vec<ContentReference>,
}

/// Payload for creating or updating a content item.
#[derive(Debug, Clone)]
pub struct ContentUpload {
    /// Content name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Shared content type label.
    pub shared_content_type: String,
    /// MIME-ish content type of the binary payload.
    pub content_type: String,
    /// Filename exposed as the external path.
    pub external_path: String,
    /// Raw file bytes.
    pub data: Bytes,
    /// Tags to attach.
    pub tags: Vec<ContentTag>,
}

/// Capability set of the external hub.
#[async_trait]
pub trait HubRepository: Send + Sync + std::fmt::Debug {
    /// Find content by exact name, optionally restricted to one owner.
    async fn find(&self, name: &str, owner: Option<&str>) -> AppResult<Vec<HubContent>>;

    /// List every content item visible to the session.
    async fn list_all(&self) -> AppResult<Vec<HubContent>>;

    /// Create a new content item.
    async fn create(&self, upload: ContentUpload) -> AppResult<HubContent>;

    /// Replace the binary payload and tags of an existing item.
    async fn update(&self, id: Uuid, upload: ContentUpload) -> AppResult<HubContent>;

    /// Reassign ownership of an existing item.
    async fn change_owner(&self, id: Uuid, owner: &str) -> AppResult<HubContent>;

    /// Delete a content item.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Resolve a principal name to its directory user id.
    /// Must resolve to exactly one match; zero or several matches is an
    /// error.
    async fn lookup_user_id(&self, principal: &str) -> AppResult<Uuid>;

    /// Base URL of the hub endpoint, used to build absolute links.
    fn base_url(&self) -> String;
}
