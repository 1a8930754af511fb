use crate::core::{Config, Error, Result};
use crate::model::release::format_time;
use crate::model::PackageStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

/// A single named software unit's deployment within a release.
///
/// Lifecycle: NOT_STARTED → IN_PROGRESS → {SUCCESSFUL, FAILED}. Timing is
/// tracked independently of the owning release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub release_id: Uuid,
    pub name: String,
    pub version: String,
    pub status: PackageStatus,
    pub rollback: bool,
    pub diff_url: Option<String>,
    pub stime: Option<DateTime<Utc>>,
    pub ftime: Option<DateTime<Utc>>,
    /// Whole seconds between `stime` and `ftime`, set on stop.
    pub duration: Option<i64>,
}

impl Package {
    pub fn new(
        release_id: Uuid,
        name: &str,
        version: &str,
        diff_url: Option<&str>,
        rollback: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            release_id,
            name: name.to_string(),
            version: version.to_string(),
            status: PackageStatus::NotStarted,
            rollback,
            diff_url: diff_url.map(str::to_string),
            stime: None,
            ftime: None,
            duration: None,
        }
    }

    /// Mark the deployment as started: sets `stime` and moves to IN_PROGRESS.
    pub fn start(&mut self) -> Result<()> {
        if self.stime.is_some() {
            return Err(Error::Workflow(format!(
                "Package {} has already been started",
                self.id
            )));
        }
        self.stime = Some(Utc::now());
        self.status = PackageStatus::InProgress;
        Ok(())
    }

    /// Mark the deployment as finished, SUCCESSFUL or FAILED.
    ///
    /// Requires a prior [`Package::start`]; a package with no `stime` has no
    /// defined duration. Terminal states are final.
    pub fn stop(&mut self, success: bool) -> Result<()> {
        let stime = self.stime.ok_or_else(|| {
            Error::Workflow(format!(
                "Cannot stop package {}, it has not been started",
                self.id
            ))
        })?;
        if self.status.is_terminal() {
            return Err(Error::Workflow(format!(
                "Package {} has already finished with status {}",
                self.id, self.status
            )));
        }
        let ftime = Utc::now();
        self.duration = Some((ftime - stime).num_seconds());
        self.ftime = Some(ftime);
        self.status = if success {
            PackageStatus::Successful
        } else {
            PackageStatus::Failed
        };
        Ok(())
    }

    /// JSON projection with timestamps rendered in the configured format.
    pub fn to_doc(&self, config: &Config) -> JsonValue {
        json!({
            "id": self.id.to_string(),
            "name": self.name,
            "version": self.version,
            "stime": format_time(self.stime, config),
            "ftime": format_time(self.ftime, config),
            "duration": self.duration,
            "status": self.status.as_str(),
            "rollback": self.rollback,
            "diff_url": self.diff_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package() -> Package {
        Package::new(Uuid::new_v4(), "frontend", "1.2.3", None, false)
    }

    #[test]
    fn test_start_sets_stime_and_status() {
        let mut p = package();
        p.start().unwrap();
        assert!(p.stime.is_some());
        assert_eq!(p.status, PackageStatus::InProgress);
    }

    #[test]
    fn test_double_start_is_workflow_error() {
        let mut p = package();
        p.start().unwrap();
        let err = p.start().unwrap_err();
        assert!(matches!(err, Error::Workflow(_)));
    }

    #[test]
    fn test_stop_before_start_fails_without_mutation() {
        let mut p = package();
        let err = p.stop(true).unwrap_err();
        assert!(matches!(err, Error::Workflow(_)));
        assert_eq!(p.status, PackageStatus::NotStarted);
        assert!(p.ftime.is_none());
        assert!(p.duration.is_none());
    }

    #[test]
    fn test_stop_success_and_failure() {
        let mut ok = package();
        ok.start().unwrap();
        ok.stop(true).unwrap();
        assert_eq!(ok.status, PackageStatus::Successful);
        assert!(ok.ftime.is_some());
        assert!(ok.duration.is_some());

        let mut bad = package();
        bad.start().unwrap();
        bad.stop(false).unwrap();
        assert_eq!(bad.status, PackageStatus::Failed);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut p = package();
        p.start().unwrap();
        p.stop(true).unwrap();
        assert!(matches!(p.stop(false).unwrap_err(), Error::Workflow(_)));
        assert_eq!(p.status, PackageStatus::Successful);
    }

    #[test]
    fn test_duration_is_ftime_minus_stime() {
        let mut p = package();
        p.start().unwrap();
        // Backdate the start so the duration is visibly positive.
        p.stime = Some(Utc::now() - chrono::Duration::seconds(90));
        p.stop(true).unwrap();
        let expected = (p.ftime.unwrap() - p.stime.unwrap()).num_seconds();
        assert_eq!(p.duration, Some(expected));
        assert!(p.duration.unwrap() >= 90);
    }
}
