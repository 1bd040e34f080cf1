//! Case generation pipeline.
//!
//! Stages run strictly in sequence: seed → draft → critique-refine rounds →
//! value tagging → value clarification. Every stage snapshots its output
//! into the [`CaseRecord`] as it goes, so the history log a reviewer later
//! evaluates against holds the full provenance of the case.
//!
//! There is no retry or partial recovery: the first upstream failure
//! propagates out and aborts the whole run.

use crate::model::TaggedCase;
use crate::prompts::PromptBuilder;
use crate::providers::llm::CompletionClient;
use crate::record::CaseRecord;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub mod critique;
pub mod rubric;
pub mod values;

pub use critique::CritiqueRefine;
pub use rubric::{AuditFeedback, AuditResult, RubricAuditor, RubricDimension};
pub use values::ValueClarification;

/// One progress update from the pipeline. The console layer consumes these
/// via a sink; the pipeline itself never prints.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    DraftReady,
    AuditCompleted { dimension: String, passed: bool },
    RoundCompleted { round: usize },
    CaseTagged,
    ValueAuditCompleted { axis: String, passed: bool },
    AdjustmentsApplied { axes: usize },
}

/// Sink for pipeline progress events.
pub type ProgressSink = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Everything a pipeline operation needs, constructed once by the caller
/// and passed down explicitly. There are no shared module-level
/// collaborators anywhere in the pipeline.
pub struct PipelineContext {
    prompts: Box<dyn PromptBuilder>,
    client: Box<dyn CompletionClient>,
    progress: Option<ProgressSink>,
}

impl PipelineContext {
    pub fn new(prompts: Box<dyn PromptBuilder>, client: Box<dyn CompletionClient>) -> Self {
        Self {
            prompts,
            client,
            progress: None,
        }
    }

    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Build the named template, run the completion, and check the output
    /// against the expected shape. Malformed output is a hard error.
    pub async fn structured<T: DeserializeOwned>(
        &self,
        template_name: &str,
        vars: &serde_json::Value,
    ) -> anyhow::Result<T> {
        use anyhow::Context;
        let messages = self.prompts.build_messages(template_name, vars)?;
        let raw = self
            .client
            .complete(&messages)
            .await
            .with_context(|| format!("completion failed for template '{}'", template_name))?;
        serde_json::from_value(raw)
            .with_context(|| format!("malformed structured output for template '{}'", template_name))
    }

    pub(crate) fn emit(&self, event: PipelineEvent) {
        if let Some(sink) = &self.progress {
            sink(&event);
        }
    }
}

/// Run the full pipeline for one seed, appending every stage snapshot to
/// `record`, and return the final tagged case.
pub async fn generate_case(
    ctx: &PipelineContext,
    seed: &str,
    record: &mut CaseRecord,
) -> anyhow::Result<TaggedCase> {
    let case = CritiqueRefine::new(ctx).run(seed, record).await?;
    let tagged = ValueClarification::new(ctx).run(&case, record).await?;
    tracing::info!(case_id = %record.case_id, iterations = record.len(), "pipeline complete");
    Ok(tagged)
}
