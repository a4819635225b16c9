//! # pac-plan
//!
//! Model and summarizer for policy deployment plan documents.
//!
//! A plan document is the diff the automation module produces between the
//! declared definitions and the live environment: per resource category
//! (definitions, set-definitions, assignments, exemptions), a bucket of
//! change items per action kind. This crate parses that document leniently
//! — missing categories and action keys default to empty — and reduces it
//! to a bounded [`PlanSummary`] safe to hand back to an agent.
//!
//! Summarization is pure: no I/O, same input always yields the same output.

mod document;
mod error;
mod summary;

pub use document::{ChangeAction, ChangeBucket, ChangePlanDocument, ResourceCategory};
pub use error::PlanError;
pub use summary::{summarize, ActionCounts, PlanSummary, DETAIL_LIMIT};
