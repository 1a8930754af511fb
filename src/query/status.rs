//! Release-level status and rollback aggregation.
//!
//! `status` and `rollback` are package attributes; a release's aggregate
//! values are derived from its package set at query time, never stored.
//!
//! A "SUCCESSFUL" or "NOT_STARTED" release is one where *all* packages match
//! the status. A "FAILED" or "IN_PROGRESS" release is one where *any* package
//! matches. A consequence, intended: a release with one failed and one
//! running package matches both `status=FAILED` and `status=IN_PROGRESS`.

use crate::model::{Package, PackageStatus};

/// Whether a release with the given packages matches a requested status.
pub fn release_matches_status(packages: &[Package], status: PackageStatus) -> bool {
    match status {
        // ALL packages must match: no package may have a different status.
        PackageStatus::Successful | PackageStatus::NotStarted => {
            !packages.iter().any(|p| p.status != status)
        }
        // ANY package matching applies the status to the whole release.
        PackageStatus::Failed | PackageStatus::InProgress => {
            packages.iter().any(|p| p.status == status)
        }
    }
}

/// A release contains a rollback iff any of its packages is one.
pub fn release_has_rollback(packages: &[Package]) -> bool {
    packages.iter().any(|p| p.rollback)
}

/// `rollback=true` matches releases with at least one rollback package;
/// `rollback=false` matches releases with none.
pub fn release_matches_rollback(packages: &[Package], rollback: bool) -> bool {
    release_has_rollback(packages) == rollback
}

/// Deploy mode of a record for statistics: rolling forward or back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    Normal,
    Rollback,
}

impl DeployMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Rollback => "rollback",
        }
    }
}

/// Final outcome of a record for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    Successful,
    Failed,
}

impl DeployOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Failed => "failed",
        }
    }
}

/// Classify a single package for statistics. Packages that have not reached a
/// terminal state fall into neither outcome and are excluded.
pub fn classify_package(package: &Package) -> Option<(DeployMode, DeployOutcome)> {
    let mode = if package.rollback {
        DeployMode::Rollback
    } else {
        DeployMode::Normal
    };
    let outcome = match package.status {
        PackageStatus::Successful => DeployOutcome::Successful,
        PackageStatus::Failed => DeployOutcome::Failed,
        PackageStatus::NotStarted | PackageStatus::InProgress => return None,
    };
    Some((mode, outcome))
}

/// Classify a release by the aggregation rules above. Releases that are
/// neither all-successful nor any-failed (e.g. still in progress) are
/// excluded.
pub fn classify_release(packages: &[Package]) -> Option<(DeployMode, DeployOutcome)> {
    let mode = if release_has_rollback(packages) {
        DeployMode::Rollback
    } else {
        DeployMode::Normal
    };
    // ANY failed package fails the release; otherwise it is successful only
    // if ALL packages are. An empty or unfinished set has no outcome.
    let outcome = if release_matches_status(packages, PackageStatus::Failed) {
        DeployOutcome::Failed
    } else if !packages.is_empty()
        && release_matches_status(packages, PackageStatus::Successful)
    {
        DeployOutcome::Successful
    } else {
        return None;
    };
    Some((mode, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn package(status: PackageStatus, rollback: bool) -> Package {
        let mut p = Package::new(Uuid::new_v4(), "pkg", "1.0.0", None, rollback);
        p.status = status;
        p
    }

    #[test]
    fn test_successful_requires_all() {
        let all_ok = vec![
            package(PackageStatus::Successful, false),
            package(PackageStatus::Successful, false),
        ];
        assert!(release_matches_status(&all_ok, PackageStatus::Successful));

        let mixed = vec![
            package(PackageStatus::Successful, false),
            package(PackageStatus::Failed, false),
        ];
        assert!(!release_matches_status(&mixed, PackageStatus::Successful));
    }

    #[test]
    fn test_failed_requires_any() {
        let mixed = vec![
            package(PackageStatus::Successful, false),
            package(PackageStatus::Failed, false),
        ];
        assert!(release_matches_status(&mixed, PackageStatus::Failed));
    }

    #[test]
    fn test_failed_and_in_progress_can_overlap() {
        let set = vec![
            package(PackageStatus::Failed, false),
            package(PackageStatus::InProgress, false),
        ];
        assert!(release_matches_status(&set, PackageStatus::Failed));
        assert!(release_matches_status(&set, PackageStatus::InProgress));
    }

    #[test]
    fn test_rollback_any_and_none() {
        let with = vec![
            package(PackageStatus::Successful, true),
            package(PackageStatus::Successful, false),
        ];
        assert!(release_matches_rollback(&with, true));
        assert!(!release_matches_rollback(&with, false));

        let without = vec![package(PackageStatus::Successful, false)];
        assert!(release_matches_rollback(&without, false));
    }

    #[test]
    fn test_classify_release_outcomes() {
        let ok = vec![package(PackageStatus::Successful, false)];
        assert_eq!(
            classify_release(&ok),
            Some((DeployMode::Normal, DeployOutcome::Successful))
        );

        let failed_rollback = vec![
            package(PackageStatus::Failed, true),
            package(PackageStatus::Successful, false),
        ];
        assert_eq!(
            classify_release(&failed_rollback),
            Some((DeployMode::Rollback, DeployOutcome::Failed))
        );

        let running = vec![package(PackageStatus::InProgress, false)];
        assert_eq!(classify_release(&running), None);
        assert_eq!(classify_release(&[]), None);
    }

    #[test]
    fn test_classify_package_excludes_non_terminal() {
        assert!(classify_package(&package(PackageStatus::NotStarted, false)).is_none());
        assert!(classify_package(&package(PackageStatus::InProgress, false)).is_none());
        assert_eq!(
            classify_package(&package(PackageStatus::Failed, true)),
            Some((DeployMode::Rollback, DeployOutcome::Failed))
        );
    }
}
