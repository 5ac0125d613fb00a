//! nest-catalog
//!
//! Instrument catalog shared by the recommendation front ends:
//! - `InstrumentSource` abstraction (JSON file, static list)
//! - Immutable snapshots published by build-then-swap
//! - Periodic refresh task; failures keep the previous snapshot
//! - Filtered candidate listing for the allocation core

pub mod catalog;
pub mod source;

pub use catalog::{
    spawn_refresh_loop, CandidateQuery, Catalog, CatalogSnapshot, RefreshOutcome, DEFAULT_TTL,
};
pub use source::{parse_instruments, InstrumentSource, JsonFileSource, StaticSource};
