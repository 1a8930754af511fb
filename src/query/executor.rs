//! Query executor: applies a compiled query to the store.
//!
//! Pipeline: conjunctive predicates over a scan snapshot, then ordering by
//! `stime` (ascending unless `desc`), then `offset`/`limit` pagination, then
//! the optional `latest` restriction to a single row.

use crate::core::Result;
use crate::model::{Package, Release};
use crate::query::filter::{CompiledQuery, QueryOptions};
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

pub struct QueryExecutor<'a> {
    store: &'a Store,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Releases matching the compiled query, ordered and paginated.
    pub fn releases(&self, query: &CompiledQuery) -> Result<Vec<Release>> {
        let releases = self.store.scan_releases()?;
        let by_release = self.packages_by_release()?;
        let empty: Vec<Package> = Vec::new();

        let mut hits: Vec<Release> = releases
            .into_iter()
            .filter(|release| {
                let packages = by_release.get(&release.id).unwrap_or(&empty);
                // Aggregated status/rollback and package_* filters are joins
                // to the package table: a release with no packages has no
                // rows to join and can never match.
                if query.join_packages && packages.is_empty() {
                    return false;
                }
                query
                    .predicates
                    .iter()
                    .all(|p| p.matches_release(release, packages))
            })
            .collect();

        hits.sort_by(|a, b| order_times(Some(a.stime), Some(b.stime), query.options.descending));
        debug!(count = hits.len(), "release query matched");
        Ok(paginate(hits, &query.options))
    }

    /// Packages matching the compiled query. Release-scoped predicates apply
    /// to each package's parent release.
    pub fn packages(&self, query: &CompiledQuery) -> Result<Vec<Package>> {
        let releases: HashMap<Uuid, Release> = self
            .store
            .scan_releases()?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        let by_release = self.packages_by_release()?;
        let empty: Vec<Package> = Vec::new();

        let mut hits: Vec<Package> = self
            .store
            .scan_packages()?
            .into_iter()
            .filter(|package| {
                let Some(release) = releases.get(&package.release_id) else {
                    return false;
                };
                let siblings = by_release.get(&release.id).unwrap_or(&empty);
                query
                    .predicates
                    .iter()
                    .all(|p| p.matches_package(package, release, siblings))
            })
            .collect();

        hits.sort_by(|a, b| order_times(a.stime, b.stime, query.options.descending));
        debug!(count = hits.len(), "package query matched");
        Ok(paginate(hits, &query.options))
    }

    fn packages_by_release(&self) -> Result<HashMap<Uuid, Vec<Package>>> {
        let mut map: HashMap<Uuid, Vec<Package>> = HashMap::new();
        for package in self.store.scan_packages()? {
            map.entry(package.release_id).or_default().push(package);
        }
        Ok(map)
    }
}

/// `stime` ordering. Unset times sort last ascending and first descending,
/// so reversing the direction reverses the whole order.
fn order_times(
    a: Option<DateTime<Utc>>,
    b: Option<DateTime<Utc>>,
    descending: bool,
) -> Ordering {
    let ordering = match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    if descending {
        ordering.reverse()
    } else {
        ordering
    }
}

fn paginate<T>(rows: Vec<T>, options: &QueryOptions) -> Vec<T> {
    let mut rows: Vec<T> = rows
        .into_iter()
        .skip(options.offset.unwrap_or(0))
        .take(options.limit.unwrap_or(usize::MAX))
        .collect();
    if options.latest {
        rows.truncate(1);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_window() {
        let rows: Vec<u32> = (0..10).collect();
        let options = QueryOptions {
            limit: Some(3),
            offset: Some(8),
            ..Default::default()
        };
        // limit=3, offset=8 over 10 rows: max(0, min(3, 10-8)) = 2 rows.
        assert_eq!(paginate(rows, &options), vec![8, 9]);
    }

    #[test]
    fn test_paginate_offset_past_end() {
        let rows: Vec<u32> = (0..4).collect();
        let options = QueryOptions {
            offset: Some(10),
            ..Default::default()
        };
        assert!(paginate(rows, &options).is_empty());
    }

    #[test]
    fn test_latest_takes_one() {
        let rows: Vec<u32> = (0..4).collect();
        let options = QueryOptions {
            latest: true,
            ..Default::default()
        };
        assert_eq!(paginate(rows, &options), vec![0]);
    }
}
