//! Client-side submission logic.
//!
//! This module contains:
//! - link: video identifier extraction
//! - form: editable item fields
//! - validation: conditional submission rules
//! - workflow: verify, submit, edit and delete for one form session
//! - board: cached options and item list

pub mod board;
pub mod form;
pub mod link;
pub mod validation;
pub mod workflow;

// Re-export commonly used types
pub use board::{Board, BoardStats, RefreshReport};
pub use form::ItemForm;
pub use link::{extract_video_id, VideoId};
pub use validation::{validate, RequiredField, Violation, MAX_UPLOAD_BYTES};
pub use workflow::{
    Confirm, DeleteOutcome, DuplicateCheckPolicy, Phase, SubmissionWorkflow, VerifyOutcome,
    WorkflowError,
};
