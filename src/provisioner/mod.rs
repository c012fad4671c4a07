pub(crate) mod http;

#[cfg(test)]
pub(crate) mod fake;

use crate::error::Result;
use serde_derive::{Deserialize, Serialize};

/// State labels reported by the provisioner. They are compared as opaque strings.
pub mod state {
    pub const CREATION_REQUESTED: &str = "creation-requested";
    pub const CREATION_IN_PROGRESS: &str = "creation-in-progress";
    pub const STABLE: &str = "stable";
    pub const FAILED_MARKER: &str = "failed";
    pub const DELETION_REQUESTED: &str = "deletion-requested";
    pub const DELETION_IN_PROGRESS: &str = "deletion-in-progress";
    pub const DELETION_FINAL_CLEANUP: &str = "deletion-final-cleanup";
    pub const DELETED: &str = "deleted";

    pub fn is_failed(state: &str) -> bool {
        state.contains(FAILED_MARKER)
    }

    /// Deletion already underway, so another delete call would be redundant.
    pub fn is_deleting(state: &str) -> bool {
        matches!(
            state,
            DELETION_REQUESTED | DELETION_IN_PROGRESS | DELETION_FINAL_CLEANUP
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub create_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Installation {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "OwnerID", default)]
    pub owner_id: String,
    #[serde(rename = "GroupID", default)]
    pub group_id: Option<String>,
    #[serde(rename = "DNS", default)]
    pub dns: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub filestore: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub affinity: String,
    pub state: String,
    pub create_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateInstallationRequest {
    #[serde(rename = "OwnerID")]
    pub owner_id: String,
    #[serde(rename = "GroupID")]
    pub group_id: String,
    pub database: String,
    pub filestore: String,
    pub size: String,
    pub affinity: String,
    #[serde(rename = "DNS")]
    pub dns: String,
}

/// Lifecycle API of the remote provisioner. Lookups return `Ok(None)` when the
/// resource does not exist.
#[async_trait::async_trait]
pub trait Provisioner: Send + Sync {
    async fn create_group(&self, request: &CreateGroupRequest) -> Result<Group>;
    async fn get_group(&self, id: &str) -> Result<Option<Group>>;
    async fn delete_group(&self, id: &str) -> Result<()>;
    async fn create_installation(&self, request: &CreateInstallationRequest)
        -> Result<Installation>;
    async fn get_installation(&self, id: &str) -> Result<Option<Installation>>;
    async fn delete_installation(&self, id: &str) -> Result<()>;
}
