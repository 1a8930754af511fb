pub mod package;
pub mod release;
pub mod status;

pub use package::Package;
pub use release::Release;
pub use status::PackageStatus;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named deployment target. Platforms are created lazily: looking one up by
/// a name that does not exist yet creates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: Uuid,
    pub name: String,
}

impl Platform {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }
}

/// Free-text result blob attached to a package. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageResult {
    pub id: Uuid,
    pub package_id: Uuid,
    pub content: String,
}

impl PackageResult {
    pub fn new(package_id: Uuid, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            package_id,
            content: content.to_string(),
        }
    }
}

/// Free-text note attached to a release. Append-only, ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseNote {
    pub id: Uuid,
    pub release_id: Uuid,
    pub content: String,
}

impl ReleaseNote {
    pub fn new(release_id: Uuid, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            release_id,
            content: content.to_string(),
        }
    }
}

/// One key/value metadata entry for a release. Entries are append-only; when
/// materialized into a map, a later entry for the same key shadows earlier
/// ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    pub id: Uuid,
    pub release_id: Uuid,
    pub key: String,
    pub value: String,
}

impl ReleaseMetadata {
    pub fn new(release_id: Uuid, key: &str, value: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            release_id,
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}
