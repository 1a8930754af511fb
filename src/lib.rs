//! shiplog: records deployment releases and answers filtered and aggregated
//! queries over them.
//!
//! A *release* groups package deployments across platforms. Packages carry
//! their own start/stop lifecycle and status; a release's aggregate status
//! and rollback flag are derived from its packages at query time. Queries
//! arrive as flat string filter parameters (as from a query string) and are
//! compiled into typed predicates, executed with ordering and pagination,
//! and serialized as a streaming JSON list or folded into time-bucketed
//! count trees.
//!
//! # Examples
//!
//! ```
//! use shiplog::{compile, Config, NewPackage, NewRelease, QueryExecutor, Store};
//!
//! # fn main() -> shiplog::Result<()> {
//! let store = Store::new();
//! let config = Config::default();
//!
//! // create release -> add package -> start -> stop -> stop release
//! let release = store.create_release(NewRelease {
//!     platforms: vec!["site1".to_string()],
//!     user: "alice".to_string(),
//!     ..Default::default()
//! })?;
//! let package = store.add_package(release, NewPackage {
//!     name: "frontend".to_string(),
//!     version: "1.2.3".to_string(),
//!     ..Default::default()
//! })?;
//! store.start_package(release, package)?;
//! store.stop_package(release, package, true)?;
//! store.stop_release(release)?;
//!
//! // Filter releases: successful ones on site1, newest first.
//! let query = compile(
//!     [("status", "SUCCESSFUL"), ("platform", "site1"), ("desc", "true")],
//!     &config,
//! )?;
//! let releases = QueryExecutor::new(&store).releases(&query)?;
//! assert_eq!(releases.len(), 1);
//!
//! // Stream them as {"releases": [...]} without buffering.
//! let mut out = Vec::new();
//! let docs = releases
//!     .iter()
//!     .map(|r| store.release_doc(r.id, &config))
//!     .collect::<shiplog::Result<Vec<_>>>()?;
//! shiplog::stream_doc(&mut out, "releases", docs)?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod model;
pub mod query;
pub mod stats;
pub mod store;
pub mod stream;

// Re-export the main types for convenience.
pub use crate::core::{Config, Error, Result};
pub use crate::model::{
    Package, PackageResult, PackageStatus, Platform, Release, ReleaseMetadata, ReleaseNote,
};
pub use crate::query::{compile, CompiledQuery, Predicate, QueryExecutor, QueryOptions};
pub use crate::stats::{
    bucket_records, packages_by_time, releases_by_time, BucketRecord, BucketTree, Node, TimeUnit,
};
pub use crate::store::{ImportedPackage, ImportedRelease, NewPackage, NewRelease, Store};
pub use crate::stream::{stream_doc, JsonListWriter};
