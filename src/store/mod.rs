//! In-memory relational store for releases and their child records.
//!
//! This stands in for the persistence collaborator: tables are UUID-keyed
//! maps behind a single `RwLock`, every mutating operation is one short
//! critical section, and scans return owned snapshots so no lock is held
//! while results are filtered or serialized.

use crate::core::{Config, Error, Result};
use crate::model::{
    Package, PackageResult, PackageStatus, Platform, Release, ReleaseMetadata, ReleaseNote,
};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Attributes for creating a release.
#[derive(Debug, Clone, Default)]
pub struct NewRelease {
    pub platforms: Vec<String>,
    pub user: String,
    pub team: Option<String>,
    pub references: Vec<String>,
}

/// Attributes for adding a package to a release.
#[derive(Debug, Clone, Default)]
pub struct NewPackage {
    pub name: String,
    pub version: String,
    pub diff_url: Option<String>,
    pub rollback: bool,
}

/// A complete historical release document for [`Store::import_release`].
#[derive(Debug, Clone)]
pub struct ImportedRelease {
    pub platforms: Vec<String>,
    pub user: String,
    pub team: Option<String>,
    pub references: Vec<String>,
    pub stime: DateTime<Utc>,
    pub ftime: Option<DateTime<Utc>>,
    pub packages: Vec<ImportedPackage>,
}

#[derive(Debug, Clone)]
pub struct ImportedPackage {
    pub name: String,
    pub version: String,
    pub status: PackageStatus,
    pub rollback: bool,
    pub diff_url: Option<String>,
    pub stime: Option<DateTime<Utc>>,
    pub ftime: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Tables {
    releases: HashMap<Uuid, Release>,
    packages: HashMap<Uuid, Package>,
    platforms: HashMap<String, Platform>,
    results: HashMap<Uuid, Vec<PackageResult>>,
    notes: HashMap<Uuid, Vec<ReleaseNote>>,
    metadata: HashMap<Uuid, Vec<ReleaseMetadata>>,
}

pub struct Store {
    tables: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Create a release. Its `stime` is set here: a release starts when it is
    /// created. Platforms are upserted by name.
    pub fn create_release(&self, new: NewRelease) -> Result<Uuid> {
        if new.platforms.is_empty() {
            return Err(Error::InvalidUsage(
                "A release requires at least one platform".to_string(),
            ));
        }
        let mut tables = self.tables.write()?;
        let platforms: Vec<Platform> = new
            .platforms
            .iter()
            .map(|name| {
                tables
                    .platforms
                    .entry(name.clone())
                    .or_insert_with(|| Platform::new(name))
                    .clone()
            })
            .collect();
        let release = Release::new(
            platforms,
            &new.user,
            new.team.as_deref(),
            new.references,
        )?;
        let id = release.id;
        info!(release = %id, user = %new.user, "create release");
        tables.releases.insert(id, release);
        Ok(id)
    }

    /// Add a package to an existing release.
    pub fn add_package(&self, release_id: Uuid, new: NewPackage) -> Result<Uuid> {
        let mut tables = self.tables.write()?;
        if !tables.releases.contains_key(&release_id) {
            return Err(Error::NotFound(format!("Release {release_id}")));
        }
        let package = Package::new(
            release_id,
            &new.name,
            &new.version,
            new.diff_url.as_deref(),
            new.rollback,
        );
        let id = package.id;
        info!(release = %release_id, package = %id, name = %new.name, version = %new.version,
              "create package");
        tables.packages.insert(id, package);
        Ok(id)
    }

    pub fn get_release(&self, release_id: Uuid) -> Result<Release> {
        let tables = self.tables.read()?;
        tables
            .releases
            .get(&release_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Release {release_id}")))
    }

    /// Fetch a package and validate that it belongs to the given release.
    pub fn get_package(&self, release_id: Uuid, package_id: Uuid) -> Result<Package> {
        let tables = self.tables.read()?;
        // Check the release first, it is the better error.
        if !tables.releases.contains_key(&release_id) {
            return Err(Error::NotFound(format!("Release {release_id}")));
        }
        let package = tables
            .packages
            .get(&package_id)
            .ok_or_else(|| Error::NotFound(format!("Package {package_id}")))?;
        if package.release_id != release_id {
            return Err(Error::InvalidUsage(format!(
                "Package {package_id} does not belong to release {release_id}"
            )));
        }
        Ok(package.clone())
    }

    /// Look up a platform by name, creating it if absent. Idempotent.
    pub fn ensure_platform(&self, name: &str) -> Result<Platform> {
        let mut tables = self.tables.write()?;
        Ok(tables
            .platforms
            .entry(name.to_string())
            .or_insert_with(|| {
                info!(platform = name, "create platform");
                Platform::new(name)
            })
            .clone())
    }

    /// Mark a package deployment as started.
    pub fn start_package(&self, release_id: Uuid, package_id: Uuid) -> Result<()> {
        self.get_package(release_id, package_id)?;
        let mut tables = self.tables.write()?;
        let package = tables
            .packages
            .get_mut(&package_id)
            .ok_or_else(|| Error::NotFound(format!("Package {package_id}")))?;
        package.start()?;
        info!(release = %release_id, package = %package_id, "package start");
        Ok(())
    }

    /// Mark a package deployment as finished. Concurrent stops race: the last
    /// write wins at this level, there is no compare-and-swap.
    pub fn stop_package(&self, release_id: Uuid, package_id: Uuid, success: bool) -> Result<()> {
        self.get_package(release_id, package_id)?;
        let mut tables = self.tables.write()?;
        let package = tables
            .packages
            .get_mut(&package_id)
            .ok_or_else(|| Error::NotFound(format!("Package {package_id}")))?;
        package.stop(success)?;
        info!(release = %release_id, package = %package_id, success, "package stop");
        Ok(())
    }

    /// Mark a release as finished. Does not require its packages to have
    /// reached a terminal state first; see [`Release::stop`].
    pub fn stop_release(&self, release_id: Uuid) -> Result<()> {
        let mut tables = self.tables.write()?;
        let release = tables
            .releases
            .get_mut(&release_id)
            .ok_or_else(|| Error::NotFound(format!("Release {release_id}")))?;
        release.stop();
        info!(release = %release_id, "release stop");
        Ok(())
    }

    pub fn add_result(&self, release_id: Uuid, package_id: Uuid, content: &str) -> Result<Uuid> {
        self.get_package(release_id, package_id)?;
        let mut tables = self.tables.write()?;
        let result = PackageResult::new(package_id, content);
        let id = result.id;
        tables.results.entry(package_id).or_default().push(result);
        Ok(id)
    }

    pub fn add_note(&self, release_id: Uuid, content: &str) -> Result<Uuid> {
        let mut tables = self.tables.write()?;
        if !tables.releases.contains_key(&release_id) {
            return Err(Error::NotFound(format!("Release {release_id}")));
        }
        let note = ReleaseNote::new(release_id, content);
        let id = note.id;
        info!(release = %release_id, "add note");
        tables.notes.entry(release_id).or_default().push(note);
        Ok(id)
    }

    pub fn add_metadata(&self, release_id: Uuid, key: &str, value: &str) -> Result<Uuid> {
        let mut tables = self.tables.write()?;
        if !tables.releases.contains_key(&release_id) {
            return Err(Error::NotFound(format!("Release {release_id}")));
        }
        let entry = ReleaseMetadata::new(release_id, key, value);
        let id = entry.id;
        info!(release = %release_id, key, "add metadata");
        tables.metadata.entry(release_id).or_default().push(entry);
        Ok(id)
    }

    /// Import a complete historical release with explicit timings and
    /// statuses, bypassing the live lifecycle. Used to backfill records from
    /// other systems.
    pub fn import_release(&self, doc: ImportedRelease) -> Result<Uuid> {
        if doc.platforms.is_empty() {
            return Err(Error::InvalidUsage(
                "A release requires at least one platform".to_string(),
            ));
        }
        let mut tables = self.tables.write()?;
        let platforms: Vec<Platform> = doc
            .platforms
            .iter()
            .map(|name| {
                tables
                    .platforms
                    .entry(name.clone())
                    .or_insert_with(|| Platform::new(name))
                    .clone()
            })
            .collect();
        let mut release = Release::new(platforms, &doc.user, doc.team.as_deref(), doc.references)?;
        release.stime = doc.stime;
        release.ftime = doc.ftime;
        release.duration = doc.ftime.map(|f| (f - doc.stime).num_seconds());
        let release_id = release.id;
        info!(release = %release_id, user = %doc.user, "import release");
        tables.releases.insert(release_id, release);

        for p in doc.packages {
            let mut package = Package::new(
                release_id,
                &p.name,
                &p.version,
                p.diff_url.as_deref(),
                p.rollback,
            );
            package.status = p.status;
            package.stime = p.stime;
            package.ftime = p.ftime;
            package.duration = match (p.stime, p.ftime) {
                (Some(s), Some(f)) => Some((f - s).num_seconds()),
                _ => None,
            };
            tables.packages.insert(package.id, package);
        }
        Ok(release_id)
    }

    /// Snapshot of all releases, in no particular order.
    pub fn scan_releases(&self) -> Result<Vec<Release>> {
        let tables = self.tables.read()?;
        Ok(tables.releases.values().cloned().collect())
    }

    /// Snapshot of all packages, in no particular order.
    pub fn scan_packages(&self) -> Result<Vec<Package>> {
        let tables = self.tables.read()?;
        Ok(tables.packages.values().cloned().collect())
    }

    /// Packages of one release, ordered by `stime` with unstarted packages
    /// last.
    pub fn packages_of(&self, release_id: Uuid) -> Result<Vec<Package>> {
        let tables = self.tables.read()?;
        let mut packages: Vec<Package> = tables
            .packages
            .values()
            .filter(|p| p.release_id == release_id)
            .cloned()
            .collect();
        packages.sort_by(|a, b| match (a.stime, b.stime) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        Ok(packages)
    }

    pub fn notes_of(&self, release_id: Uuid) -> Result<Vec<ReleaseNote>> {
        let tables = self.tables.read()?;
        Ok(tables.notes.get(&release_id).cloned().unwrap_or_default())
    }

    pub fn metadata_of(&self, release_id: Uuid) -> Result<Vec<ReleaseMetadata>> {
        let tables = self.tables.read()?;
        Ok(tables.metadata.get(&release_id).cloned().unwrap_or_default())
    }

    /// Metadata entries folded into one map, later keys shadowing earlier
    /// ones.
    pub fn metadata_map(&self, release_id: Uuid) -> Result<BTreeMap<String, String>> {
        let entries = self.metadata_of(release_id)?;
        let mut map = BTreeMap::new();
        for entry in entries {
            map.insert(entry.key, entry.value);
        }
        Ok(map)
    }

    pub fn results_of(&self, package_id: Uuid) -> Result<Vec<PackageResult>> {
        let tables = self.tables.read()?;
        Ok(tables.results.get(&package_id).cloned().unwrap_or_default())
    }

    /// Full JSON document for one release, children embedded.
    pub fn release_doc(&self, release_id: Uuid, config: &Config) -> Result<JsonValue> {
        let release = self.get_release(release_id)?;
        let packages = self.packages_of(release_id)?;
        let notes = self.notes_of(release_id)?;
        let metadata = self.metadata_of(release_id)?;
        Ok(release.to_doc(&packages, &notes, &metadata, config))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
