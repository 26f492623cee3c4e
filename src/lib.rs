//! ytsprint - submission client for the content sprint dashboard
//!
//! Keeps the item store free of duplicate and half-filled submissions:
//! YouTube links are checked for format and prior submission before an
//! item can be saved, and status-dependent rules decide whether a link or
//! an uploaded video file is the evidence.
//!
//! # Modules
//!
//! - `adapters`: The item store (HTTP API and in-memory)
//! - `auth`: Identity, login strategies and the saved session
//! - `core`: Link verification, validation, the submission workflow, the board
//! - `domain`: Data structures (ContentItem, TaxonomyOptions, ItemFilter)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Log in with a company email
//! ytsprint login --email you@adda247.com
//!
//! # Check a link before submitting it
//! ytsprint verify https://youtu.be/dQw4w9WgXcQ
//!
//! # Submit an item
//! ytsprint add --link https://youtu.be/dQw4w9WgXcQ -t Exam_Information \
//!     --vertical SSC --exam CGL -s Draft
//! ```

pub mod adapters;
pub mod auth;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{HttpItemService, ItemService, MemoryItemService, ServiceError};
pub use auth::{Authenticator, Identity};
pub use core::{Board, DuplicateCheckPolicy, SubmissionWorkflow, WorkflowError};
pub use domain::{ContentItem, ContentType, ItemFilter, Status, TaxonomyOptions};
