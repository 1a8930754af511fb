//! Typed field dispatch for the filter grammar.
//!
//! Filter parameters arrive as string field names; instead of reflective
//! attribute lookup these enums map each known name to a typed accessor, so
//! an unknown name is an explicit error and every comparison is typed.

use crate::core::{Config, Error, Result};
use crate::model::{Package, PackageStatus, Release};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

/// A parsed filter value, typed to match the column it compares against.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    Time(DateTime<Utc>),
    /// Durations are filtered as whole seconds.
    Seconds(i64),
    Status(PackageStatus),
    Id(Uuid),
}

impl FilterValue {
    /// Compare two values of the same variant. `None` means the values are
    /// not comparable (mixed variants), which never matches a predicate.
    pub fn compare(&self, other: &FilterValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::Seconds(a), Self::Seconds(b)) => Some(a.cmp(b)),
            (Self::Status(a), Self::Status(b)) => Some(a.as_str().cmp(b.as_str())),
            (Self::Id(a), Self::Id(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// The scalar type a field holds, driving value parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Time,
    Seconds,
    Status,
    Id,
}

/// Filterable columns of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseField {
    Id,
    User,
    Team,
    Stime,
    Ftime,
    Duration,
}

impl ReleaseField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "user" => Some(Self::User),
            "team" => Some(Self::Team),
            "stime" => Some(Self::Stime),
            "ftime" => Some(Self::Ftime),
            "duration" => Some(Self::Duration),
            _ => None,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Id => FieldKind::Id,
            Self::User | Self::Team => FieldKind::Text,
            Self::Stime | Self::Ftime => FieldKind::Time,
            Self::Duration => FieldKind::Seconds,
        }
    }

    /// Current value of this field on a release; `None` for unset optionals,
    /// which never match.
    pub fn get(&self, release: &Release) -> Option<FilterValue> {
        match self {
            Self::Id => Some(FilterValue::Id(release.id)),
            Self::User => Some(FilterValue::Text(release.user.clone())),
            Self::Team => release.team.clone().map(FilterValue::Text),
            Self::Stime => Some(FilterValue::Time(release.stime)),
            Self::Ftime => release.ftime.map(FilterValue::Time),
            Self::Duration => release.duration.map(FilterValue::Seconds),
        }
    }
}

/// Filterable columns of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageField {
    Id,
    Name,
    Version,
    Status,
    Rollback,
    DiffUrl,
    Stime,
    Ftime,
    Duration,
}

impl PackageField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "version" => Some(Self::Version),
            "status" => Some(Self::Status),
            "rollback" => Some(Self::Rollback),
            "diff_url" => Some(Self::DiffUrl),
            "stime" => Some(Self::Stime),
            "ftime" => Some(Self::Ftime),
            "duration" => Some(Self::Duration),
            _ => None,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Id => FieldKind::Id,
            Self::Name | Self::Version | Self::DiffUrl => FieldKind::Text,
            Self::Status => FieldKind::Status,
            Self::Rollback => FieldKind::Bool,
            Self::Stime | Self::Ftime => FieldKind::Time,
            Self::Duration => FieldKind::Seconds,
        }
    }

    pub fn get(&self, package: &Package) -> Option<FilterValue> {
        match self {
            Self::Id => Some(FilterValue::Id(package.id)),
            Self::Name => Some(FilterValue::Text(package.name.clone())),
            Self::Version => Some(FilterValue::Text(package.version.clone())),
            Self::Status => Some(FilterValue::Status(package.status)),
            Self::Rollback => Some(FilterValue::Bool(package.rollback)),
            Self::DiffUrl => package.diff_url.clone().map(FilterValue::Text),
            Self::Stime => package.stime.map(FilterValue::Time),
            Self::Ftime => package.ftime.map(FilterValue::Time),
            Self::Duration => package.duration.map(FilterValue::Seconds),
        }
    }
}

/// Parse a raw filter value for a field of the given kind.
pub fn parse_value(kind: FieldKind, field: &str, raw: &str, config: &Config) -> Result<FilterValue> {
    match kind {
        FieldKind::Text => Ok(FilterValue::Text(raw.to_string())),
        FieldKind::Bool => parse_bool(field, raw).map(FilterValue::Bool),
        FieldKind::Time => parse_time(raw, config).map(FilterValue::Time),
        FieldKind::Seconds => parse_seconds(field, raw).map(FilterValue::Seconds),
        FieldKind::Status => raw.parse::<PackageStatus>().map(FilterValue::Status),
        FieldKind::Id => Uuid::parse_str(raw)
            .map(FilterValue::Id)
            .map_err(|_| Error::InvalidUsage(format!("'{raw}' is not a valid UUID"))),
    }
}

/// Booleans accept exactly `true`/`True`/`false`/`False`. Anything else is a
/// type error in the caller, not merely an invalid filter.
pub fn parse_bool(field: &str, raw: &str) -> Result<bool> {
    match raw {
        "true" | "True" => Ok(true),
        "false" | "False" => Ok(false),
        other => Err(Error::BadParameter(format!(
            "Bad {field} parameter: '{other}', type string. Boolean expected."
        ))),
    }
}

/// Durations are given as integer seconds.
pub fn parse_seconds(field: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| {
        Error::InvalidUsage(format!(
            "Filter {field} expects an integer number of seconds, got '{raw}'"
        ))
    })
}

/// Absolute timestamps: RFC 3339 first, then the configured time format
/// interpreted as UTC.
pub fn parse_time(raw: &str, config: &Config) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, &config.time_format) {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(Error::InvalidUsage(format!(
        "Could not parse timestamp '{raw}' (expected format {})",
        config.time_format
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_has_no_mapping() {
        assert!(ReleaseField::from_name("flavour").is_none());
        assert!(PackageField::from_name("flavour").is_none());
    }

    #[test]
    fn test_boolean_coercion_is_exact() {
        assert!(parse_bool("rollback", "true").unwrap());
        assert!(parse_bool("rollback", "True").unwrap());
        assert!(!parse_bool("rollback", "false").unwrap());
        assert!(!parse_bool("rollback", "False").unwrap());
        assert!(matches!(
            parse_bool("rollback", "TRUE").unwrap_err(),
            Error::BadParameter(_)
        ));
        assert!(matches!(
            parse_bool("rollback", "1").unwrap_err(),
            Error::BadParameter(_)
        ));
    }

    #[test]
    fn test_parse_time_accepts_configured_format() {
        let config = Config::default();
        let t = parse_time("2024-05-01T12:30:00Z", &config).unwrap();
        assert_eq!(t.to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        let config = Config::default();
        assert!(matches!(
            parse_time("yesterday", &config).unwrap_err(),
            Error::InvalidUsage(_)
        ));
    }

    #[test]
    fn test_mixed_variants_do_not_compare() {
        let a = FilterValue::Text("10".to_string());
        let b = FilterValue::Seconds(10);
        assert!(a.compare(&b).is_none());
    }
}
