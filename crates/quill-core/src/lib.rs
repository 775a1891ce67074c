//! # quill-core
//!
//! Reference graph for long-form writing projects: chapters, character sheets
//! and world notes kept as Markdown files under a directory tree, each
//! directory described by a YAML metadata record.
//!
//! ## Overview
//!
//! - **[`path_resolver`]**: canonical project-relative paths for link targets,
//!   origin-relative first, root-relative second.
//! - **[`link_parser`]**: `[text](target "title")` extraction and byte-exact
//!   link rewrite edits.
//! - **[`reference_index`]**: forward and reverse edges, explicit (from
//!   metadata) and hyperlink (from text), kept symmetric.
//! - **[`link_updater`]**: rewrites links and explicit references across the
//!   project after a file or directory moves.
//! - **[`event_bus`]**: synchronous change notifications.
//! - **[`project`]**: the facade tying the above to file operations.
//!
//! ## Quick Start
//!
//! ```no_run
//! use quill_core::Project;
//!
//! let mut project = Project::open("my-novel")?;
//! for entry in project.references("settings/world.md").referenced_by {
//!     println!("{} ({:?})", entry.path, entry.source);
//! }
//! let result = project.move_file("settings/world.md", "settings/world-setting.md")?;
//! assert!(result.success);
//! # Ok::<(), quill_core::ProjectError>(())
//! ```

pub mod config;
pub mod error;
pub mod event_bus;
pub mod link_parser;
pub mod link_updater;
pub mod metadata;
pub mod path_resolver;
pub mod project;
pub mod reference_index;

#[cfg(test)]
mod test_support;

pub use config::ProjectConfig;
pub use error::{ProjectError, Result};
pub use event_bus::{ChangeEvent, ChangeKind, EventBus, Subscription};
pub use link_updater::{FailedFile, LinkUpdateResult, LinkUpdater};
pub use metadata::{FileKind, MetadataTree, ProjectFile};
pub use path_resolver::{PathMove, PathResolver};
pub use project::Project;
pub use reference_index::{
    FileReferences, Provenance, ReferenceEntry, ReferenceIndex, ReferenceSource, SharedReferenceIndex,
};
