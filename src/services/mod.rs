//! Service layer containing business logic and side-effect helpers.
//!
//! ## Service map
//! - `source.rs` — `DataSource` trait, source selection, JSON snapshot source.
//! - `slurm.rs` — live source over `getent`/`id`/`sacct`.
//! - `directory.rs` — group/passwd parsing, membership and profile resolution.
//! - `quota.rs` — quota report parsing.
//! - `period.rs` — report period parsing and bounds.
//! - `aggregate.rs` — per-user/per-group usage and storage totals.
//! - `report.rs` — four-section document model.
//! - `render.rs` — PDF serialization and atomic write.
//! - `dispatch.rs` — MIME message + sendmail.
//! - `pipeline.rs` — source → aggregate → report.
//! - `config.rs` — TOML config loading.
//! - `output.rs` — JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod aggregate;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod output;
pub mod period;
pub mod pipeline;
pub mod quota;
pub mod render;
pub mod report;
pub mod slurm;
pub mod source;
