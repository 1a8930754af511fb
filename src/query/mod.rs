pub mod executor;
pub mod fields;
pub mod filter;
pub mod status;

pub use executor::QueryExecutor;
pub use fields::{FilterValue, PackageField, ReleaseField};
pub use filter::{compile, Comparator, CompiledQuery, Predicate, QueryOptions};
pub use status::{DeployMode, DeployOutcome};
