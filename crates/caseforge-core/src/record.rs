//! Append-only case history.
//!
//! A [`CaseRecord`] is an ordered log of [`Iteration`]s, one per pipeline
//! stage or human decision. Entries carry a stable sequence number and are
//! never reordered, rewritten, or truncated; every mutation is an append.
//! The record is the source of truth for evaluation content — the session
//! store only caches which case ids a user has touched.
//!
//! On the wire each iteration is a flat object with a `step_description`
//! discriminator (`draft`, `refined`, `tagged`, `value_adjusted`,
//! `human_evaluation`), which is also the shape the read-side fold in
//! [`crate::store::reconstruct`] walks backward over.

use crate::errors::{StoreError, StoreResult};
use crate::model::{CaseSnapshot, TaggedCase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline stages that snapshot case content into the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStep {
    Draft,
    Refined,
    Tagged,
    ValueAdjusted,
}

impl SnapshotStep {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotStep::Draft => "draft",
            SnapshotStep::Refined => "refined",
            SnapshotStep::Tagged => "tagged",
            SnapshotStep::ValueAdjusted => "value_adjusted",
        }
    }
}

/// Reviewer verdict on a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Parse boundary for stringly inputs (CLI, session tooling). Anything
    /// but the two accepted values is an invalid-input error.
    pub fn parse(s: &str) -> StoreResult<Self> {
        match s {
            "approve" => Ok(Decision::Approve),
            "reject" => Ok(Decision::Reject),
            other => Err(StoreError::InvalidDecision {
                decision: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}

/// One human review appended to the log. `case` is the case as evaluated:
/// the reviewer's edit when there was one, otherwise the prior snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanEvaluation {
    pub decision: Decision,
    pub evaluator: String,
    pub case: CaseSnapshot,
    pub has_edits: bool,
    pub notes: Option<String>,
}

/// One entry in the history log: a content snapshot from a pipeline stage,
/// or a human-evaluation marker.
#[derive(Debug, Clone, PartialEq)]
pub enum IterationEntry {
    Snapshot { step: SnapshotStep, case: CaseSnapshot },
    Evaluation(HumanEvaluation),
}

impl IterationEntry {
    /// The case content this entry snapshots, whatever its kind.
    pub fn data(&self) -> &CaseSnapshot {
        match self {
            IterationEntry::Snapshot { case, .. } => case,
            IterationEntry::Evaluation(ev) => &ev.case,
        }
    }

    pub fn is_evaluation(&self) -> bool {
        matches!(self, IterationEntry::Evaluation(_))
    }

    pub fn as_evaluation(&self) -> Option<&HumanEvaluation> {
        match self {
            IterationEntry::Evaluation(ev) => Some(ev),
            IterationEntry::Snapshot { .. } => None,
        }
    }

    /// The wire tag for this entry.
    pub fn step_description(&self) -> &'static str {
        match self {
            IterationEntry::Snapshot { step, .. } => step.as_str(),
            IterationEntry::Evaluation(_) => "human_evaluation",
        }
    }
}

/// One immutable log entry with its position and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireIteration", into = "WireIteration")]
pub struct Iteration {
    pub seq: u64,
    pub recorded_at: DateTime<Utc>,
    pub entry: IterationEntry,
}

/// Flat wire shape for an iteration. Kept separate so the in-memory model
/// can stay a tagged two-variant enum while the file format stays the flat
/// `step_description` object other tooling expects.
#[derive(Serialize, Deserialize)]
struct WireIteration {
    seq: u64,
    step_description: String,
    recorded_at: DateTime<Utc>,
    data: CaseSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    decision: Option<Decision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evaluator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    has_edits: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl From<Iteration> for WireIteration {
    fn from(it: Iteration) -> Self {
        let step_description = it.entry.step_description().to_string();
        match it.entry {
            IterationEntry::Snapshot { case, .. } => WireIteration {
                seq: it.seq,
                step_description,
                recorded_at: it.recorded_at,
                data: case,
                decision: None,
                evaluator: None,
                has_edits: None,
                notes: None,
            },
            IterationEntry::Evaluation(ev) => WireIteration {
                seq: it.seq,
                step_description,
                recorded_at: it.recorded_at,
                data: ev.case,
                decision: Some(ev.decision),
                evaluator: Some(ev.evaluator),
                has_edits: Some(ev.has_edits),
                notes: ev.notes,
            },
        }
    }
}

impl TryFrom<WireIteration> for Iteration {
    type Error = String;

    fn try_from(w: WireIteration) -> Result<Self, Self::Error> {
        let entry = match w.step_description.as_str() {
            "draft" => IterationEntry::Snapshot {
                step: SnapshotStep::Draft,
                case: w.data,
            },
            "refined" => IterationEntry::Snapshot {
                step: SnapshotStep::Refined,
                case: w.data,
            },
            "tagged" => IterationEntry::Snapshot {
                step: SnapshotStep::Tagged,
                case: w.data,
            },
            "value_adjusted" => IterationEntry::Snapshot {
                step: SnapshotStep::ValueAdjusted,
                case: w.data,
            },
            "human_evaluation" => IterationEntry::Evaluation(HumanEvaluation {
                decision: w
                    .decision
                    .ok_or("human_evaluation iteration missing decision")?,
                evaluator: w
                    .evaluator
                    .ok_or("human_evaluation iteration missing evaluator")?,
                case: w.data,
                has_edits: w.has_edits.unwrap_or(false),
                notes: w.notes,
            }),
            other => return Err(format!("unrecognized step_description: {}", other)),
        };
        Ok(Iteration {
            seq: w.seq,
            recorded_at: w.recorded_at,
            entry,
        })
    }
}

/// Append-only history for one generated case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_id: String,
    pub created_at: DateTime<Utc>,
    refinement_history: Vec<Iteration>,
}

impl CaseRecord {
    pub fn new(case_id: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            created_at: Utc::now(),
            refinement_history: Vec::new(),
        }
    }

    /// The full log, oldest first.
    pub fn history(&self) -> &[Iteration] {
        &self.refinement_history
    }

    pub fn len(&self) -> usize {
        self.refinement_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refinement_history.is_empty()
    }

    fn push(&mut self, entry: IterationEntry) {
        let seq = self.refinement_history.len() as u64;
        self.refinement_history.push(Iteration {
            seq,
            recorded_at: Utc::now(),
            entry,
        });
    }

    /// Append a pipeline-stage snapshot at the next sequence index.
    pub fn append_snapshot(&mut self, step: SnapshotStep, case: impl Into<CaseSnapshot>) {
        self.push(IterationEntry::Snapshot {
            step,
            case: case.into(),
        });
    }

    /// Append a human evaluation. The stored snapshot is `updated_case` when
    /// the reviewer edited, otherwise the immediately preceding iteration's
    /// data; evaluating an empty record is a shape violation.
    pub fn add_human_evaluation(
        &mut self,
        decision: Decision,
        evaluator: impl Into<String>,
        updated_case: Option<TaggedCase>,
        notes: Option<String>,
    ) -> StoreResult<()> {
        let has_edits = updated_case.is_some();
        let case = match updated_case {
            Some(c) => CaseSnapshot::Tagged(c),
            None => self
                .refinement_history
                .last()
                .map(|it| it.entry.data().clone())
                .ok_or_else(|| StoreError::MalformedRecord {
                    case_id: self.case_id.clone(),
                    reason: "cannot evaluate a record with no iterations".into(),
                })?,
        };
        self.push(IterationEntry::Evaluation(HumanEvaluation {
            decision,
            evaluator: evaluator.into(),
            case,
            has_edits,
            notes,
        }));
        Ok(())
    }

    /// Most recent human evaluation, if any.
    pub fn latest_evaluation(&self) -> Option<(&Iteration, &HumanEvaluation)> {
        self.refinement_history
            .iter()
            .rev()
            .find_map(|it| it.entry.as_evaluation().map(|ev| (it, ev)))
    }

    /// Data of the last iteration in the log, whatever its kind.
    pub fn final_case(&self) -> Option<&CaseSnapshot> {
        self.refinement_history.last().map(|it| it.entry.data())
    }
}
