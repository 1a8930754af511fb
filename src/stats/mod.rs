//! Time-bucketed aggregation trees.
//!
//! A filtered set of releases or packages is folded into a nested mapping
//! keyed by calendar components, then (for packages) the package name, then
//! the outcome category pair `normal|rollback` / `successful|failed`, with
//! integer counts at the leaves. Counting is commutative: any input order
//! produces the identical tree.

pub mod summary;

use crate::core::{Error, Result};
use crate::query::executor::QueryExecutor;
use crate::query::filter::CompiledQuery;
use crate::query::status::{classify_package, classify_release, DeployMode, DeployOutcome};
use crate::store::Store;
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

/// Calendar unit to bucket records by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Year,
    Month,
    /// ISO year and week number.
    Week,
    Day,
    Hour,
    /// Full ISO calendar tuple: year, week, weekday.
    Iso,
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            "week" => Ok(Self::Week),
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            "iso" => Ok(Self::Iso),
            other => Err(Error::InvalidUsage(format!(
                "Invalid unit \"{other}\" specified for breakdown"
            ))),
        }
    }
}

/// One node of the aggregation tree: either a counter leaf or a nested map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Count(u64),
    Tree(BTreeMap<String, Node>),
}

pub type BucketTree = BTreeMap<String, Node>;

/// Calendar components of `t` for the given unit.
///
/// With `summarize_by_unit` the path is a single component (the unit's own
/// value, collapsing across coarser units, e.g. just the month number);
/// otherwise the full hierarchical breakdown down to the unit.
pub fn time_path(t: DateTime<Utc>, unit: TimeUnit, summarize_by_unit: bool) -> Result<Vec<String>> {
    if summarize_by_unit {
        let component = match unit {
            TimeUnit::Year => t.year().to_string(),
            TimeUnit::Month => t.month().to_string(),
            TimeUnit::Week => t.iso_week().week().to_string(),
            TimeUnit::Day => t.day().to_string(),
            TimeUnit::Hour => t.hour().to_string(),
            TimeUnit::Iso => {
                return Err(Error::InvalidUsage(
                    "Unit \"iso\" cannot be summarized by unit".to_string(),
                ))
            }
        };
        return Ok(vec![component]);
    }

    Ok(match unit {
        TimeUnit::Year => vec![t.year().to_string()],
        TimeUnit::Month => vec![t.year().to_string(), t.month().to_string()],
        TimeUnit::Week => vec![
            t.iso_week().year().to_string(),
            t.iso_week().week().to_string(),
        ],
        TimeUnit::Iso => vec![
            t.iso_week().year().to_string(),
            t.iso_week().week().to_string(),
            t.weekday().number_from_monday().to_string(),
        ],
        TimeUnit::Day => vec![
            t.year().to_string(),
            t.month().to_string(),
            t.day().to_string(),
        ],
        TimeUnit::Hour => vec![
            t.year().to_string(),
            t.month().to_string(),
            t.day().to_string(),
            t.hour().to_string(),
        ],
    })
}

/// One classified record ready for bucketing.
#[derive(Debug, Clone)]
pub struct BucketRecord {
    pub stime: DateTime<Utc>,
    /// Package name, inserted into the path between time components and the
    /// outcome category. Absent for release records.
    pub name: Option<String>,
    pub mode: DeployMode,
    pub outcome: DeployOutcome,
}

/// Fold records into the nested count tree.
pub fn bucket_records<I>(records: I, unit: TimeUnit, summarize_by_unit: bool) -> Result<BucketTree>
where
    I: IntoIterator<Item = BucketRecord>,
{
    let mut tree = BucketTree::new();
    for record in records {
        let mut path = time_path(record.stime, unit, summarize_by_unit)?;
        if let Some(name) = &record.name {
            path.push(name.clone());
        }
        debug!(?path, mode = record.mode.as_str(), outcome = record.outcome.as_str(),
               "bucket record");
        increment(&mut tree, &path, record.mode, record.outcome);
    }
    Ok(tree)
}

/// Descend the path creating intermediate maps, zero-fill the four outcome
/// leaves of the bucket, then increment the addressed one. Zero-filling keeps
/// every bucket's category shape complete regardless of which outcomes were
/// actually seen.
fn increment(tree: &mut BucketTree, path: &[String], mode: DeployMode, outcome: DeployOutcome) {
    let bucket = descend(tree, path);
    for mode_key in ["normal", "rollback"] {
        let entry = bucket
            .entry(mode_key.to_string())
            .or_insert_with(|| Node::Tree(BTreeMap::new()));
        if let Node::Tree(categories) = entry {
            for outcome_key in ["successful", "failed"] {
                categories
                    .entry(outcome_key.to_string())
                    .or_insert(Node::Count(0));
            }
        }
    }
    if let Some(Node::Tree(categories)) = bucket.get_mut(mode.as_str()) {
        if let Some(Node::Count(n)) = categories.get_mut(outcome.as_str()) {
            *n += 1;
        }
    }
}

fn descend<'a>(tree: &'a mut BucketTree, path: &[String]) -> &'a mut BucketTree {
    match path {
        [] => tree,
        [head, rest @ ..] => {
            let node = tree
                .entry(head.clone())
                .or_insert_with(|| Node::Tree(BTreeMap::new()));
            match node {
                Node::Tree(child) => descend(child, rest),
                // A leaf at an interior position cannot happen with fixed
                // classification depth; replace it to stay total.
                other => {
                    *other = Node::Tree(BTreeMap::new());
                    match other {
                        Node::Tree(child) => descend(child, rest),
                        Node::Count(_) => unreachable!(),
                    }
                }
            }
        }
    }
}

/// Releases matching the query, bucketed by time and outcome. Releases with
/// no terminal outcome yet are excluded.
pub fn releases_by_time(
    store: &Store,
    query: &CompiledQuery,
    unit: TimeUnit,
    summarize_by_unit: bool,
) -> Result<BucketTree> {
    let executor = QueryExecutor::new(store);
    let releases = executor.releases(query)?;
    let mut packages_by_release: BTreeMap<Uuid, Vec<_>> = BTreeMap::new();
    for package in store.scan_packages()? {
        packages_by_release
            .entry(package.release_id)
            .or_default()
            .push(package);
    }

    let records = releases.into_iter().filter_map(|release| {
        let packages = packages_by_release
            .get(&release.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let (mode, outcome) = classify_release(packages)?;
        Some(BucketRecord {
            stime: release.stime,
            name: None,
            mode,
            outcome,
        })
    });
    bucket_records(records, unit, summarize_by_unit)
}

/// Packages matching the query, bucketed by time, package name and outcome.
pub fn packages_by_time(
    store: &Store,
    query: &CompiledQuery,
    unit: TimeUnit,
    summarize_by_unit: bool,
) -> Result<BucketTree> {
    let executor = QueryExecutor::new(store);
    let packages = executor.packages(query)?;

    let records = packages.into_iter().filter_map(|package| {
        let (mode, outcome) = classify_package(&package)?;
        let stime = package.stime?;
        Some(BucketRecord {
            stime,
            name: Some(package.name),
            mode,
            outcome,
        })
    });
    bucket_records(records, unit, summarize_by_unit)
}
