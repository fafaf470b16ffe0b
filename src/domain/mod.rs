//! Shared data model layer (structs/constants only).
//!
//! ## Purpose
//! - Keep record, aggregate and report structs in one place.
//! - Avoid cyclic imports between the data source, aggregator, builder and renderer.
//! - Make JSON output schema changes explicit and reviewable.
//!
//! ## Files
//! - `models.rs` — input records, aggregates, report document model, output structs.
//! - `constants.rs` — stable defaults (partitions, premium account groups, paths).
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem/process side effects.
//!
//! ## Compatibility note
//! Changes in these structs can affect `--json` outputs.
//! Keep schema-impacting changes synchronized with `docs/contracts/*`.

pub mod constants;
pub mod models;
