//! Core pipeline of the EcoMap clients: exhaustively fetch a paginated
//! collection of located resources, merge co-located ones into marker groups,
//! cluster them for the current viewport, and keep table/map filters in sync
//! with a shareable query representation.

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filters;
pub mod grouping;
pub mod query;
pub mod store;
pub mod types;

pub use aggregate::{Aggregation, PaginatedAggregator};
pub use cluster::ClusterRenderEngine;
pub use error::{FetchError, PageError};
pub use fetch::{HttpPageFetcher, PageFetcher};
pub use grouping::LocationGroupingIndex;
pub use query::{FilterSet, SearchParams};
pub use store::FilterSyncedStore;
