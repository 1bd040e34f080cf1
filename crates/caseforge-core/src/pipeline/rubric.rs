//! Rubric audits.
//!
//! One [`RubricDimension`] is one independent review lens (clinical,
//! ethical, stylistic) with its own reviewer role and criteria list. An
//! audit returns a fresh [`AuditResult`]; results are combined into
//! [`AuditFeedback`] values, which distinguish "passed, nothing to say"
//! from "failed, apply these changes" at the type level. The legacy
//! "No issues detected." sentinel only exists where feedback is rendered
//! back into prompt text.

use crate::model::Case;
use crate::pipeline::PipelineContext;
use serde::Deserialize;
use serde_json::json;

/// Wire shape of one audit call. Deserialized fresh per call, never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditResult {
    pub overall_pass: bool,
    #[serde(default)]
    pub suggested_changes: Vec<String>,
}

/// Outcome of one audit dimension as fed to refinement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditFeedback {
    /// The audit passed; there is nothing to apply.
    Clean,
    /// The audit failed; these changes should be applied.
    Revise(Vec<String>),
}

impl AuditFeedback {
    pub fn from_result(result: AuditResult) -> Self {
        if result.overall_pass {
            AuditFeedback::Clean
        } else {
            AuditFeedback::Revise(result.suggested_changes)
        }
    }

    /// Prompt-boundary rendering. This is the only place the sentinel
    /// phrase appears.
    pub fn render(&self) -> String {
        match self {
            AuditFeedback::Clean => "No issues detected.".to_string(),
            AuditFeedback::Revise(changes) => changes
                .iter()
                .map(|c| format!("- {}", c))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// One audit dimension: reviewer role plus the criteria it checks.
#[derive(Debug, Clone, Copy)]
pub struct RubricDimension {
    pub name: &'static str,
    pub role: &'static str,
    pub criteria: &'static [&'static str],
}

impl RubricDimension {
    pub fn criteria_text(&self) -> String {
        self.criteria
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub const CLINICAL: RubricDimension = RubricDimension {
    name: "clinical",
    role: "Senior Attending Physician and Medical Director",
    criteria: &[
        "The clinical presentation is internally consistent and plausible",
        "Both choices are actions a competent clinician could defend",
        "No choice depends on information absent from the vignette",
        "Dosages, timelines, and findings are medically accurate",
    ],
};

pub const ETHICAL: RubricDimension = RubricDimension {
    name: "ethical",
    role: "Medical Ethics Professor specializing in principlist values",
    criteria: &[
        "The two choices create a genuine ethical tension, not a right answer and a wrong one",
        "Neither choice is framed with leading or judgmental language",
        "The scenario does not trivialize patient autonomy or welfare",
    ],
};

pub const STYLISTIC: RubricDimension = RubricDimension {
    name: "stylistic",
    role: "Senior Medical Editor",
    criteria: &[
        "The vignette is concise and free of irrelevant detail",
        "Both choices are written in parallel structure and comparable length",
        "Terminology is consistent throughout the case",
    ],
};

/// The three dimensions every critique round runs, in order.
pub const DIMENSIONS: [RubricDimension; 3] = [CLINICAL, ETHICAL, STYLISTIC];

/// Runs one audit dimension against a case.
pub struct RubricAuditor<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> RubricAuditor<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self { ctx }
    }

    pub async fn audit(
        &self,
        dimension: &RubricDimension,
        case: &Case,
    ) -> anyhow::Result<AuditResult> {
        let vars = json!({
            "role_name": dimension.role,
            "rubric_criteria": dimension.criteria_text(),
            "vignette": case.vignette,
            "choice_1": case.choice_1,
            "choice_2": case.choice_2,
        });
        let result: AuditResult = self.ctx.structured("rubric", &vars).await?;
        tracing::debug!(
            dimension = dimension.name,
            passed = result.overall_pass,
            changes = result.suggested_changes.len(),
            "rubric audit complete"
        );
        Ok(result)
    }
}
