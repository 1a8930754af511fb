//! Shared fixtures for the integration suites.

use chrono::{DateTime, Duration, TimeZone, Utc};
use shiplog::{ImportedPackage, ImportedRelease, PackageStatus, Store};
use uuid::Uuid;

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

/// One package spec: (name, version, status, rollback, duration seconds).
pub type PackageSpec<'a> = (&'a str, &'a str, PackageStatus, bool, i64);

/// Import a finished release starting at `stime`, its packages starting at
/// the same time and running for the given number of seconds each.
pub fn import_release(
    store: &Store,
    user: &str,
    platform: &str,
    stime: DateTime<Utc>,
    packages: &[PackageSpec<'_>],
) -> Uuid {
    let longest = packages.iter().map(|p| p.4).max().unwrap_or(0);
    let packages = packages
        .iter()
        .map(|(name, version, status, rollback, seconds)| {
            let timed = matches!(
                status,
                PackageStatus::Successful | PackageStatus::Failed
            );
            ImportedPackage {
                name: name.to_string(),
                version: version.to_string(),
                status: *status,
                rollback: *rollback,
                diff_url: None,
                stime: if *status == PackageStatus::NotStarted {
                    None
                } else {
                    Some(stime)
                },
                ftime: if timed {
                    Some(stime + Duration::seconds(*seconds))
                } else {
                    None
                },
            }
        })
        .collect();

    store
        .import_release(ImportedRelease {
            platforms: vec![platform.to_string()],
            user: user.to_string(),
            team: None,
            references: vec![],
            stime,
            ftime: Some(stime + Duration::seconds(longest)),
            packages,
        })
        .unwrap()
}
