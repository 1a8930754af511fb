use crate::core::{Config, Error, Result};
use crate::model::{Package, Platform, ReleaseMetadata, ReleaseNote};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

/// A deployment event grouping one or more package deployments across one or
/// more platforms.
///
/// `stime` is set at construction: a release is considered started the moment
/// it is created. `ftime` and `duration` stay unset until [`Release::stop`].
/// Aggregate status and rollback are *derived* from the child packages at
/// query time and are never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub id: Uuid,
    pub platforms: Vec<Platform>,
    pub references: Vec<String>,
    pub user: String,
    pub team: Option<String>,
    pub stime: DateTime<Utc>,
    pub ftime: Option<DateTime<Utc>>,
    /// Whole seconds between `stime` and `ftime`, set on stop.
    pub duration: Option<i64>,
}

impl Release {
    /// Create a release. Fails if `platforms` is empty; every release targets
    /// at least one platform.
    pub fn new(
        platforms: Vec<Platform>,
        user: &str,
        team: Option<&str>,
        references: Vec<String>,
    ) -> Result<Self> {
        if platforms.is_empty() {
            return Err(Error::InvalidUsage(
                "A release requires at least one platform".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            platforms,
            references,
            user: user.to_string(),
            team: team.map(str::to_string),
            stime: Utc::now(),
            ftime: None,
            duration: None,
        })
    }

    /// Mark the release as finished.
    ///
    /// Callers are expected to stop all packages first, but this is not
    /// enforced: a release may be stopped while a package is still
    /// IN_PROGRESS, and existing integrations rely on that.
    pub fn stop(&mut self) {
        let ftime = Utc::now();
        self.duration = Some((ftime - self.stime).num_seconds());
        self.ftime = Some(ftime);
    }

    /// JSON projection of this release with its children embedded, timestamps
    /// rendered in the configured format. Packages are expected to arrive
    /// ordered by `stime`; metadata entries fold into a single map with later
    /// keys shadowing earlier ones.
    pub fn to_doc(
        &self,
        packages: &[Package],
        notes: &[ReleaseNote],
        metadata: &[ReleaseMetadata],
        config: &Config,
    ) -> JsonValue {
        let mut meta = serde_json::Map::new();
        for entry in metadata {
            meta.insert(entry.key.clone(), JsonValue::String(entry.value.clone()));
        }
        json!({
            "id": self.id.to_string(),
            "packages": packages.iter().map(|p| p.to_doc(config)).collect::<Vec<_>>(),
            "platforms": self.platforms.iter().map(|p| p.name.clone()).collect::<Vec<_>>(),
            "references": self.references,
            "notes": notes.iter().map(|n| n.content.clone()).collect::<Vec<_>>(),
            "metadata": meta,
            "stime": format_time(Some(self.stime), config),
            "ftime": format_time(self.ftime, config),
            "duration": self.duration,
            "user": self.user,
            "team": self.team,
        })
    }
}

pub(crate) fn format_time(t: Option<DateTime<Utc>>, config: &Config) -> JsonValue {
    match t {
        Some(t) => JsonValue::String(t.format(&config.time_format).to_string()),
        None => JsonValue::Null,
    }
}
