//! Rollup summaries: release counts per user, team, platform and package,
//! and the current version of each package.

use crate::core::Result;
use crate::model::{PackageStatus, Release};
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

fn on_platform(release: &Release, platform: Option<&str>) -> bool {
    match platform {
        Some(name) => release.platforms.iter().any(|p| p.name == name),
        None => true,
    }
}

/// Release count per user, optionally restricted to one platform.
pub fn user_summary(store: &Store, platform: Option<&str>) -> Result<BTreeMap<String, u64>> {
    let mut counts = BTreeMap::new();
    for release in store.scan_releases()? {
        if on_platform(&release, platform) {
            *counts.entry(release.user).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Users that have performed releases.
pub fn user_list(store: &Store, platform: Option<&str>) -> Result<Vec<String>> {
    Ok(user_summary(store, platform)?.into_keys().collect())
}

/// Release count per team. Releases without a team are skipped.
pub fn team_summary(store: &Store, platform: Option<&str>) -> Result<BTreeMap<String, u64>> {
    let mut counts = BTreeMap::new();
    for release in store.scan_releases()? {
        if on_platform(&release, platform) {
            if let Some(team) = release.team {
                *counts.entry(team).or_insert(0) += 1;
            }
        }
    }
    Ok(counts)
}

pub fn team_list(store: &Store, platform: Option<&str>) -> Result<Vec<String>> {
    Ok(team_summary(store, platform)?.into_keys().collect())
}

/// Release count per platform name.
pub fn platform_summary(store: &Store) -> Result<BTreeMap<String, u64>> {
    let mut counts = BTreeMap::new();
    for release in store.scan_releases()? {
        for platform in release.platforms {
            *counts.entry(platform.name).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Deploy count per package name, optionally bounded by platform and by the
/// owning release's start time.
pub fn package_summary(
    store: &Store,
    platform: Option<&str>,
    stime_after: Option<DateTime<Utc>>,
    stime_before: Option<DateTime<Utc>>,
) -> Result<BTreeMap<String, u64>> {
    let releases: HashMap<Uuid, Release> = store
        .scan_releases()?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    let mut counts = BTreeMap::new();
    for package in store.scan_packages()? {
        let Some(release) = releases.get(&package.release_id) else {
            continue;
        };
        if !on_platform(release, platform) {
            continue;
        }
        if let Some(after) = stime_after {
            if release.stime <= after {
                continue;
            }
        }
        if let Some(before) = stime_before {
            if release.stime >= before {
                continue;
            }
        }
        *counts.entry(package.name).or_insert(0) += 1;
    }
    Ok(counts)
}

pub fn package_list(store: &Store, platform: Option<&str>) -> Result<Vec<String>> {
    Ok(package_summary(store, platform, None, None)?
        .into_keys()
        .collect())
}

/// Current version of every package, by the most recent successful deploy.
///
/// The highest version is not sufficient, as packages can be rolled back;
/// the version is determined by the last successful deploy's start time.
pub fn package_versions(
    store: &Store,
    platform: Option<&str>,
) -> Result<BTreeMap<String, String>> {
    let releases: HashMap<Uuid, Release> = store
        .scan_releases()?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    let mut latest: BTreeMap<String, (DateTime<Utc>, String)> = BTreeMap::new();
    for package in store.scan_packages()? {
        if package.status != PackageStatus::Successful {
            continue;
        }
        let Some(stime) = package.stime else { continue };
        let Some(release) = releases.get(&package.release_id) else {
            continue;
        };
        if !on_platform(release, platform) {
            continue;
        }
        match latest.get(&package.name) {
            Some((best, _)) if *best >= stime => {}
            _ => {
                latest.insert(package.name, (stime, package.version));
            }
        }
    }
    Ok(latest
        .into_iter()
        .map(|(name, (_, version))| (name, version))
        .collect())
}
