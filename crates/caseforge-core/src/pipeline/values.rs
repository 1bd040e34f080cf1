//! Value tagging and clarification.
//!
//! Tags both choices on the four value axes, then audits every axis where
//! at least one tag is non-neutral (one neutral tag does not skip the
//! axis — only both-neutral does). Failing axes are collected and fixed in
//! a single batched adjustment call at the end, never one call per axis.

use crate::model::{Case, CaseSnapshot, TaggedCase, ValueAxis};
use crate::pipeline::rubric::AuditResult;
use crate::pipeline::{PipelineContext, PipelineEvent};
use crate::record::{CaseRecord, SnapshotStep};
use serde_json::json;

const VALUE_CRITERIA: &[&str] = &[
    "The tag is justified by the text of the choice, not by outside assumptions",
    "Opposite tags on the two choices reflect a real contrast in the vignette",
    "A non-neutral tag would survive a skeptical reading of the case",
];

fn value_criteria_text() -> String {
    VALUE_CRITERIA
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tags a case and runs the per-axis clarification audits.
pub struct ValueClarification<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> ValueClarification<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self { ctx }
    }

    /// Tag `case`, audit the non-neutral axes, and apply one batched
    /// corrective pass if any audit failed. Snapshots the tagged case and,
    /// when the batch ran, the adjusted case into `record`.
    pub async fn run(
        &self,
        case: &Case,
        record: &mut CaseRecord,
    ) -> anyhow::Result<TaggedCase> {
        let tagged: TaggedCase = self
            .ctx
            .structured(
                "tag_values",
                &json!({
                    "vignette": case.vignette,
                    "choice_1": case.choice_1,
                    "choice_2": case.choice_2,
                }),
            )
            .await?;
        record.append_snapshot(SnapshotStep::Tagged, CaseSnapshot::Tagged(tagged.clone()));
        self.ctx.emit(PipelineEvent::CaseTagged);

        let mut adjustments: Vec<(ValueAxis, Vec<String>)> = Vec::new();
        for axis in ValueAxis::ALL {
            let tag_1 = tagged.choice_1.tags.get(axis);
            let tag_2 = tagged.choice_2.tags.get(axis);
            if tag_1.is_neutral() && tag_2.is_neutral() {
                continue;
            }

            let audit: AuditResult = self
                .ctx
                .structured(
                    "clarify_values",
                    &json!({
                        "value": axis.as_str(),
                        "rubric_criteria": value_criteria_text(),
                        "vignette": case.vignette,
                        "choice_1": case.choice_1,
                        "value_tag_1": tag_1.as_str(),
                        "choice_2": case.choice_2,
                        "value_tag_2": tag_2.as_str(),
                    }),
                )
                .await?;
            self.ctx.emit(PipelineEvent::ValueAuditCompleted {
                axis: axis.as_str().to_string(),
                passed: audit.overall_pass,
            });
            if !audit.overall_pass {
                adjustments.push((axis, audit.suggested_changes));
            }
        }

        if adjustments.is_empty() {
            return Ok(tagged);
        }

        let adjusted = self.apply_adjustments(case, &adjustments).await?;
        record.append_snapshot(
            SnapshotStep::ValueAdjusted,
            CaseSnapshot::Tagged(adjusted.clone()),
        );
        self.ctx.emit(PipelineEvent::AdjustmentsApplied {
            axes: adjustments.len(),
        });
        Ok(adjusted)
    }

    /// One batched call covering every failing axis.
    async fn apply_adjustments(
        &self,
        case: &Case,
        adjustments: &[(ValueAxis, Vec<String>)],
    ) -> anyhow::Result<TaggedCase> {
        let rendered = adjustments
            .iter()
            .map(|(axis, changes)| {
                let lines = changes
                    .iter()
                    .map(|c| format!("  - {}", c))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("{}:\n{}", axis.as_str(), lines)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let vars = json!({
            "old_vignette": case.vignette,
            "old_choice_1": case.choice_1,
            "old_choice_2": case.choice_2,
            "value_adjustments": rendered,
        });
        self.ctx.structured("improve_values", &vars).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::WorkflowPrompts;
    use crate::providers::llm::ScriptedClient;
    use serde_json::Value;

    fn plain_case() -> Case {
        Case {
            vignette: "v".into(),
            choice_1: "observe".into(),
            choice_2: "operate".into(),
        }
    }

    fn tagged_json(autonomy_1: &str, justice_2: &str) -> Value {
        json!({
            "vignette": "v",
            "choice_1": {
                "text": "observe", "autonomy": autonomy_1, "beneficence": "neutral",
                "nonmaleficence": "neutral", "justice": "neutral"
            },
            "choice_2": {
                "text": "operate", "autonomy": "neutral", "beneficence": "neutral",
                "nonmaleficence": "neutral", "justice": justice_2
            }
        })
    }

    fn run_with(script: Vec<Value>) -> (PipelineContext, CaseRecord) {
        let ctx = PipelineContext::new(
            Box::new(WorkflowPrompts::new()),
            Box::new(ScriptedClient::new(script)),
        );
        (ctx, CaseRecord::new("c1"))
    }

    #[tokio::test]
    async fn all_neutral_axes_skip_every_audit_call() {
        // Only the tag_values call; any further call would exhaust the script.
        let (ctx, mut record) = run_with(vec![tagged_json("neutral", "neutral")]);
        let out = ValueClarification::new(&ctx)
            .run(&plain_case(), &mut record)
            .await
            .unwrap();
        assert_eq!(out.vignette, "v");
        let steps: Vec<&str> = record
            .history()
            .iter()
            .map(|it| it.entry.step_description())
            .collect();
        assert_eq!(steps, vec!["tagged"]);
    }

    #[tokio::test]
    async fn one_non_neutral_tag_triggers_that_axis_audit() {
        // autonomy has one non-neutral tag, justice has one too: two audits,
        // both passing, so no adjustment call.
        let (ctx, mut record) = run_with(vec![
            tagged_json("positive", "negative"),
            json!({"overall_pass": true, "suggested_changes": []}),
            json!({"overall_pass": true, "suggested_changes": []}),
        ]);
        let out = ValueClarification::new(&ctx)
            .run(&plain_case(), &mut record)
            .await
            .unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(out.choice_1.tags.autonomy.as_str(), "positive");
    }

    #[tokio::test]
    async fn failing_axes_get_one_batched_adjustment_call() {
        // Both audited axes fail; exactly one improve_values call follows.
        let (ctx, mut record) = run_with(vec![
            tagged_json("positive", "negative"),
            json!({"overall_pass": false, "suggested_changes": ["clarify autonomy"]}),
            json!({"overall_pass": false, "suggested_changes": ["clarify justice"]}),
            tagged_json("positive", "neutral"),
        ]);
        let out = ValueClarification::new(&ctx)
            .run(&plain_case(), &mut record)
            .await
            .unwrap();
        let steps: Vec<&str> = record
            .history()
            .iter()
            .map(|it| it.entry.step_description())
            .collect();
        assert_eq!(steps, vec!["tagged", "value_adjusted"]);
        assert_eq!(out.choice_2.tags.justice.as_str(), "neutral");
    }
}
