//! Lineage reconciliation core.
//!
//! Turns a flat set of family records into a rooted tree, derives
//! generations from the dot-notation ids, matches lifespans against a
//! reign calendar and migrates legacy monarch names to canonical ids.
//! Every function here is pure over in-memory collections; `store` is the
//! only module that touches the filesystem.

pub mod config;
pub mod generation;
pub mod migrate;
pub mod reign;
pub mod resolve;
pub mod search;
pub mod stats;
pub mod store;
pub mod tree;
pub mod validate;

pub use generation::generation_of;
pub use migrate::{
    build_migration_report, migrate_all, migrate_person, validate_monarch_id_references,
};
pub use reign::overlapping_reign_ids;
pub use resolve::resolve_monarch_name_to_id;
pub use stats::stats_by_generation;
pub use tree::build_tree;
