//! The critique-refine loop.
//!
//! Drafts a case from a seed, then runs a fixed number of rounds. Each
//! round audits the current case on all three rubric dimensions in
//! sequence, feeds the aggregated feedback to one refinement call, and
//! replaces the case with the result unconditionally — including when all
//! three audits passed. The fixed round count with no early exit is a
//! deliberate product contract: the output distribution of the generator
//! depends on every case taking the same number of refinement passes.

use crate::model::{Case, CaseSnapshot};
use crate::pipeline::rubric::{AuditFeedback, RubricAuditor, DIMENSIONS};
use crate::pipeline::{PipelineContext, PipelineEvent};
use crate::record::{CaseRecord, SnapshotStep};
use serde_json::json;

/// Number of critique-refine rounds every case goes through.
const REFINE_ROUNDS: usize = 2;

/// Drafts a case and iterates it through the fixed critique-refine rounds.
pub struct CritiqueRefine<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> CritiqueRefine<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self { ctx }
    }

    /// Draft from the seed, then run all rounds, snapshotting the draft and
    /// every refined case into `record`.
    pub async fn run(&self, seed: &str, record: &mut CaseRecord) -> anyhow::Result<Case> {
        let mut case: Case = self
            .ctx
            .structured("seed_draft", &json!({ "seed": seed }))
            .await?;
        record.append_snapshot(SnapshotStep::Draft, CaseSnapshot::Plain(case.clone()));
        self.ctx.emit(PipelineEvent::DraftReady);

        let auditor = RubricAuditor::new(self.ctx);
        for round in 0..REFINE_ROUNDS {
            let mut feedback = Vec::with_capacity(DIMENSIONS.len());
            for dimension in &DIMENSIONS {
                let result = auditor.audit(dimension, &case).await?;
                self.ctx.emit(PipelineEvent::AuditCompleted {
                    dimension: dimension.name.to_string(),
                    passed: result.overall_pass,
                });
                feedback.push(AuditFeedback::from_result(result));
            }

            case = self.refine(&case, &feedback).await?;
            record.append_snapshot(SnapshotStep::Refined, CaseSnapshot::Plain(case.clone()));
            self.ctx.emit(PipelineEvent::RoundCompleted { round });
            tracing::info!(round, "critique-refine round complete");
        }

        Ok(case)
    }

    async fn refine(&self, case: &Case, feedback: &[AuditFeedback]) -> anyhow::Result<Case> {
        // DIMENSIONS order: clinical, ethical, stylistic.
        let vars = json!({
            "old_vignette": case.vignette,
            "old_choice_1": case.choice_1,
            "old_choice_2": case.choice_2,
            "clinical_feedback": feedback[0].render(),
            "ethical_feedback": feedback[1].render(),
            "style_feedback": feedback[2].render(),
        });
        self.ctx.structured("refine", &vars).await
    }
}
