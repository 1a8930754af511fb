//! End-to-end filter compilation and query execution over imported data.

mod common;

use common::{at, import_release};
use shiplog::{compile, Config, NewRelease, PackageStatus, QueryExecutor, Store};
use uuid::Uuid;

const OK: PackageStatus = PackageStatus::Successful;
const FAILED: PackageStatus = PackageStatus::Failed;

/// Three releases: alice on site1 (May, 120s), bob on site2 (June, 30s),
/// alice on site1 (July, 600s, failed, rollback).
fn seed(store: &Store) -> (Uuid, Uuid, Uuid) {
    let may = import_release(
        store,
        "alice",
        "site1",
        at(2024, 5, 1, 12, 0),
        &[("frontend", "1.0.0", OK, false, 120)],
    );
    let june = import_release(
        store,
        "bob",
        "site2",
        at(2024, 6, 1, 12, 0),
        &[("backend", "2.0.0", OK, false, 30)],
    );
    let july = import_release(
        store,
        "alice",
        "site1",
        at(2024, 7, 1, 12, 0),
        &[("frontend", "1.1.0", FAILED, true, 600)],
    );
    (may, june, july)
}

fn run(store: &Store, params: &[(&str, &str)]) -> Vec<Uuid> {
    let query = compile(params.iter().copied(), &Config::default()).unwrap();
    QueryExecutor::new(store)
        .releases(&query)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect()
}

#[test]
fn test_exact_match_on_user() {
    let store = Store::new();
    let (may, _, july) = seed(&store);
    assert_eq!(run(&store, &[("user", "alice")]), vec![may, july]);
}

#[test]
fn test_platform_any_match() {
    let store = Store::new();
    let (_, june, _) = seed(&store);
    assert_eq!(run(&store, &[("platform", "site2")]), vec![june]);
    assert!(run(&store, &[("platform", "site9")]).is_empty());
}

#[test]
fn test_stime_before_and_after() {
    let store = Store::new();
    let (may, june, july) = seed(&store);
    assert_eq!(
        run(&store, &[("stime_before", "2024-06-15T00:00:00Z")]),
        vec![may, june]
    );
    assert_eq!(
        run(&store, &[("stime_after", "2024-06-15T00:00:00Z")]),
        vec![july]
    );
}

#[test]
fn test_duration_bounds() {
    let store = Store::new();
    let (may, _, july) = seed(&store);
    // Releases that took more than a minute.
    assert_eq!(run(&store, &[("duration_gt", "60")]), vec![may, july]);
    // No release has a non-positive duration in the happy path.
    assert!(run(&store, &[("duration_lt", "0")]).is_empty());
    assert_eq!(run(&store, &[("duration_gt", "0")]).len(), 3);
}

#[test]
fn test_package_name_joins() {
    let store = Store::new();
    let (may, _, july) = seed(&store);
    assert_eq!(run(&store, &[("package_name", "frontend")]), vec![may, july]);
}

#[test]
fn test_package_version_and_duration() {
    let store = Store::new();
    let (_, _, july) = seed(&store);
    assert_eq!(run(&store, &[("package_version", "1.1.0")]), vec![july]);
    assert_eq!(run(&store, &[("package_duration_gt", "300")]), vec![july]);
}

#[test]
fn test_status_aggregation() {
    let store = Store::new();
    let (may, june, july) = seed(&store);
    assert_eq!(run(&store, &[("status", "SUCCESSFUL")]), vec![may, june]);
    assert_eq!(run(&store, &[("status", "FAILED")]), vec![july]);
}

#[test]
fn test_mixed_release_matches_failed_not_successful() {
    let store = Store::new();
    let mixed = import_release(
        &store,
        "carol",
        "site3",
        at(2024, 8, 1, 12, 0),
        &[
            ("frontend", "1.0.0", OK, false, 10),
            ("backend", "1.0.0", OK, false, 10),
            ("worker", "1.0.0", FAILED, false, 10),
        ],
    );
    assert_eq!(run(&store, &[("status", "FAILED")]), vec![mixed]);
    assert!(run(&store, &[("status", "SUCCESSFUL")]).is_empty());
}

#[test]
fn test_rollback_aggregation() {
    let store = Store::new();
    let (may, june, july) = seed(&store);
    assert_eq!(run(&store, &[("rollback", "true")]), vec![july]);
    assert_eq!(run(&store, &[("rollback", "false")]), vec![may, june]);
}

#[test]
fn test_ordering_and_desc() {
    let store = Store::new();
    let (may, june, july) = seed(&store);
    assert_eq!(run(&store, &[]), vec![may, june, july]);
    assert_eq!(run(&store, &[("desc", "true")]), vec![july, june, may]);
}

#[test]
fn test_pagination_window() {
    let store = Store::new();
    let (_, june, july) = seed(&store);
    assert_eq!(
        run(&store, &[("limit", "1"), ("offset", "1")]),
        vec![june]
    );
    // offset past the end yields nothing.
    assert!(run(&store, &[("offset", "5")]).is_empty());
    // limit larger than the remainder yields the remainder.
    assert_eq!(run(&store, &[("offset", "2"), ("limit", "10")]), vec![july]);
}

#[test]
fn test_latest_returns_one_row() {
    let store = Store::new();
    let (may, _, july) = seed(&store);
    assert_eq!(run(&store, &[("latest", "true")]), vec![may]);
    assert_eq!(
        run(&store, &[("latest", "true"), ("desc", "true")]),
        vec![july]
    );
}

#[test]
fn test_conjunctive_composition() {
    let store = Store::new();
    let (may, _, _) = seed(&store);
    assert_eq!(
        run(
            &store,
            &[
                ("user", "alice"),
                ("platform", "site1"),
                ("status", "SUCCESSFUL"),
                ("duration_lt", "300"),
            ]
        ),
        vec![may]
    );
}

#[test]
fn test_release_without_packages_never_matches_joined_filters() {
    let store = Store::new();
    seed(&store);
    // A freshly created release has no packages yet; the aggregated filters
    // join to the package table, so it must not match them vacuously.
    let empty = store
        .create_release(NewRelease {
            platforms: vec!["site1".to_string()],
            user: "dave".to_string(),
            ..Default::default()
        })
        .unwrap();

    assert!(!run(&store, &[("status", "SUCCESSFUL")]).contains(&empty));
    assert!(!run(&store, &[("status", "NOT_STARTED")]).contains(&empty));
    assert!(!run(&store, &[("rollback", "false")]).contains(&empty));
    // Release-level filters still see it.
    assert_eq!(run(&store, &[("user", "dave")]), vec![empty]);
}

#[test]
fn test_package_query_applies_release_filters() {
    let store = Store::new();
    seed(&store);
    let query = compile([("user", "alice")], &Config::default()).unwrap();
    let packages = QueryExecutor::new(&store).packages(&query).unwrap();
    let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["frontend", "frontend"]);
}
