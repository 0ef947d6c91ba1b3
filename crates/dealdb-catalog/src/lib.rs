//! In-memory discount catalog: snapshot store, multi-source refresh, and the
//! read path that keeps the snapshot fresh.

pub mod merge;
pub mod query;
pub mod refresh;
pub mod store;

pub use merge::{merge_sources, MergeOutcome};
pub use query::CatalogService;
pub use refresh::{RefreshCoordinator, RefreshReport, SourceOutcome};
pub use store::{CatalogSnapshot, CatalogStore};
