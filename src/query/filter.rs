//! Filter compiler: turns a flat bag of string filter parameters into typed
//! predicates plus ordering/pagination directives.
//!
//! Field-name grammar (case-sensitive):
//! - `limit`, `offset`, `desc`, `asc`, `latest` are reserved and become
//!   [`QueryOptions`], never predicates.
//! - A `package_` prefix routes the rest of the name to the package entity
//!   and forces a join from releases to their packages.
//! - Suffixes select the comparator, first match wins: `_gt`, `_lt`,
//!   `_before` (absolute timestamp, `<`), `_after` (absolute timestamp, `>`);
//!   no suffix means exact match.
//! - A base field containing `duration` takes integer seconds.
//! - `platform` matches releases with at least one platform of that name.
//! - `status` and `rollback` are derived release attributes and go through
//!   the aggregation rules in [`crate::query::status`].
//!
//! Compilation is purely declarative: no side effects beyond raising on
//! malformed input. All predicates combine conjunctively, so their order
//! never affects correctness.

use crate::core::{Config, Error, Result};
use crate::model::{Package, PackageStatus, Release};
use crate::query::fields::{
    parse_bool, parse_seconds, parse_time, parse_value, FieldKind, FilterValue, PackageField,
    ReleaseField,
};
use crate::query::status;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Gt,
    Lt,
}

impl Comparator {
    fn allows(&self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (Self::Eq, Some(Ordering::Equal)) => true,
            (Self::Gt, Some(Ordering::Greater)) => true,
            (Self::Lt, Some(Ordering::Less)) => true,
            _ => false,
        }
    }
}

/// One compiled, typed predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Compare a release column against a value.
    Release(ReleaseField, Comparator, FilterValue),
    /// Compare a package column; a release matches if any of its packages
    /// does (join semantics).
    Package(PackageField, Comparator, FilterValue),
    /// Release has at least one associated platform with this name.
    PlatformAny(String),
    /// Aggregated release status (ALL/ANY rules per status value).
    ReleaseStatus(PackageStatus),
    /// Aggregated release rollback flag (any-match / none-match).
    ReleaseRollback(bool),
}

impl Predicate {
    /// Evaluate against a release and its packages.
    pub fn matches_release(&self, release: &Release, packages: &[Package]) -> bool {
        match self {
            Self::Release(field, cmp, value) => field
                .get(release)
                .map_or(false, |actual| cmp.allows(actual.compare(value))),
            Self::Package(field, cmp, value) => packages.iter().any(|p| {
                field
                    .get(p)
                    .map_or(false, |actual| cmp.allows(actual.compare(value)))
            }),
            Self::PlatformAny(name) => release.platforms.iter().any(|p| &p.name == name),
            Self::ReleaseStatus(wanted) => status::release_matches_status(packages, *wanted),
            Self::ReleaseRollback(wanted) => status::release_matches_rollback(packages, *wanted),
        }
    }

    /// Evaluate against a single package record. Release-level predicates
    /// apply to the parent release; the aggregated status/rollback rules
    /// still consider the whole sibling set.
    pub fn matches_package(
        &self,
        package: &Package,
        release: &Release,
        siblings: &[Package],
    ) -> bool {
        match self {
            Self::Package(field, cmp, value) => field
                .get(package)
                .map_or(false, |actual| cmp.allows(actual.compare(value))),
            Self::Release(..) | Self::PlatformAny(_) => {
                self.matches_release(release, std::slice::from_ref(package))
            }
            Self::ReleaseStatus(_) | Self::ReleaseRollback(_) => {
                self.matches_release(release, siblings)
            }
        }
    }
}

/// Ordering and pagination directives, consumed by the query executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Order by `stime` descending instead of the default ascending.
    pub descending: bool,
    /// Restrict to exactly one row, the first of the ordered result.
    pub latest: bool,
}

/// Output of the filter compiler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    pub predicates: Vec<Predicate>,
    pub options: QueryOptions,
    /// Whether evaluating this query requires joining releases to their
    /// packages (any `package_*`, `status` or `rollback` filter).
    pub join_packages: bool,
}

/// Compile a flat mapping of filter-field-name to raw string value.
pub fn compile<I, K, V>(params: I, config: &Config) -> Result<CompiledQuery>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut query = CompiledQuery::default();

    for (key, value) in params {
        let key = key.as_ref();
        let raw = value.as_ref();
        debug!(field = key, value = raw, "compile filter parameter");

        match key {
            "limit" => query.options.limit = Some(parse_count("limit", raw)?),
            "offset" => query.options.offset = Some(parse_count("offset", raw)?),
            "desc" => query.options.descending = parse_flag("desc", raw)?,
            "asc" => {
                if parse_flag("asc", raw)? {
                    query.options.descending = false;
                }
            }
            "latest" => query.options.latest = parse_flag("latest", raw)?,
            "platform" => query
                .predicates
                .push(Predicate::PlatformAny(raw.to_string())),
            "status" => {
                query.predicates.push(Predicate::ReleaseStatus(raw.parse()?));
                query.join_packages = true;
            }
            "rollback" => {
                query
                    .predicates
                    .push(Predicate::ReleaseRollback(parse_bool("rollback", raw)?));
                query.join_packages = true;
            }
            _ => {
                let predicate = compile_comparison(key, raw, config)?;
                if matches!(predicate, Predicate::Package(..)) {
                    query.join_packages = true;
                }
                query.predicates.push(predicate);
            }
        }
    }

    Ok(query)
}

fn compile_comparison(key: &str, raw: &str, config: &Config) -> Result<Predicate> {
    let (package_scope, rest) = match key.strip_prefix("package_") {
        Some(rest) => (true, rest),
        None => (false, key),
    };

    // Suffix priority: _gt, _lt, _before, _after, then exact match. The
    // time suffixes force timestamp parsing regardless of the field type.
    let (base, comparator, forced_time) = if let Some(base) = rest.strip_suffix("_gt") {
        (base, Comparator::Gt, false)
    } else if let Some(base) = rest.strip_suffix("_lt") {
        (base, Comparator::Lt, false)
    } else if let Some(base) = rest.strip_suffix("_before") {
        (base, Comparator::Lt, true)
    } else if let Some(base) = rest.strip_suffix("_after") {
        (base, Comparator::Gt, true)
    } else {
        (rest, Comparator::Eq, false)
    };

    let value = |kind: FieldKind| -> Result<FilterValue> {
        if forced_time {
            parse_time(raw, config).map(FilterValue::Time)
        } else if base.contains("duration") {
            parse_seconds(key, raw).map(FilterValue::Seconds)
        } else {
            parse_value(kind, key, raw, config)
        }
    };

    if package_scope {
        let field = PackageField::from_name(base)
            .ok_or_else(|| Error::InvalidUsage(format!("Unknown filter field '{key}'")))?;
        Ok(Predicate::Package(field, comparator, value(field.kind())?))
    } else {
        let field = ReleaseField::from_name(base)
            .ok_or_else(|| Error::InvalidUsage(format!("Unknown filter field '{key}'")))?;
        Ok(Predicate::Release(field, comparator, value(field.kind())?))
    }
}

fn parse_count(name: &str, raw: &str) -> Result<usize> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidUsage(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
    }
}

/// Flags take the same boolean literal set as value booleans.
fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw {
        "true" | "True" => Ok(true),
        "false" | "False" => Ok(false),
        other => Err(Error::InvalidUsage(format!(
            "{name} must be a boolean, got '{other}'"
        ))),
    }
}
