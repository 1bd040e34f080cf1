//! Core library for caseforge: a pipeline that drafts, audits, and refines
//! decision-scenario benchmark cases, plus the append-only case history and
//! the evaluation store built on top of it.
//!
//! The generation side is [`pipeline`]: a critique-refine loop over three
//! rubric dimensions followed by a value-clarification pass. The review side
//! is [`record`] (the per-case append-only log) and [`store`] (per-user
//! sessions and read-side reconstruction of evaluations from that log).

pub mod config;
pub mod errors;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod record;
pub mod store;

pub use errors::{StoreError, StoreResult};
pub use model::{AxisTags, Case, CaseSnapshot, TaggedCase, TaggedChoice, ValueAxis, ValueTag};
pub use record::{CaseRecord, Decision, HumanEvaluation, Iteration, IterationEntry, SnapshotStep};
pub use store::{EvaluationStore, EvaluationView, SessionStats, SessionSummary, UserSession};
