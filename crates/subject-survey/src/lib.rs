//! Scoring engine for a multi-step subject-preference survey.
//!
//! Respondents answer Likert-scale (1..=5) items grouped into curriculum
//! sections and receive per-subject preference scores, normalized by how
//! many catalog items touch each subject. The [`survey`] module holds the
//! catalog, attempt, and scoring machinery; [`config`], [`telemetry`],
//! and [`error`] carry the service plumbing shared with the API crate.

pub mod config;
pub mod error;
pub mod survey;
pub mod telemetry;
