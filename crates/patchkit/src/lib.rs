//! # patchkit
//!
//! Ordered patch application with conflict isolation.
//!
//! This crate provides functionality for:
//! - Loading a patch catalog split into required and optional pools
//! - Applying required patches in order, aborting on the first conflict
//! - Working out which other patch a failing patch conflicts with, using
//!   only dry-run checks of aggregated patch bodies
//! - Reverting patches and reporting their state in the working tree
//!
//! ## Example
//!
//! ```no_run
//! use patchkit::backend::git::GitBackend;
//! use patchkit::{Applier, Catalog, EnvMarker, FsContent, NoReport, Orchestrator};
//! use std::path::Path;
//!
//! let catalog = Catalog::load(Path::new("patches/patches.toml")).expect("catalog");
//! let backend = GitBackend::new(".");
//! let content = FsContent::new(catalog.base_dir());
//! let applier = Applier::new(&backend, &content);
//! let environment = EnvMarker::default();
//!
//! let orchestrator = Orchestrator::new(&applier, &catalog, &environment);
//! match orchestrator.apply_required(&mut NoReport) {
//!     Ok(report) => println!("{} patches applied", report.applied.len()),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod applier;
pub mod backend;
pub mod catalog;
pub mod content;
pub mod environment;
pub mod error;
pub mod orchestrator;
pub mod tree;
pub mod types;

#[cfg(test)]
mod testing;

pub use analyzer::{Diagnosis, Finding, OptionalAnalyzer, Probe, RequiredAnalyzer};
pub use applier::{Applier, ApplyOutcome, Conflict, PatchStatus};
pub use backend::{Backend, Direction, EngineKind, EngineOutput};
pub use catalog::{Catalog, Pool};
pub use content::{ContentSource, FsContent, MemoryContent};
pub use environment::{EnvMarker, Environment, Fixed};
pub use error::{Error, Result};
pub use orchestrator::{ApplyReport, NoReport, Orchestrator, PatchEntry, Reporter, RevertReport};
pub use types::{PatchRecord, PatchType};
