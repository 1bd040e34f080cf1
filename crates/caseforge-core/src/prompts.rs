//! Prompt construction.
//!
//! The pipeline never formats prompt text itself; it names a workflow
//! template and hands over variables, and a [`PromptBuilder`] turns that
//! into role/content messages. [`WorkflowPrompts`] is the production
//! builder covering the six generation templates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Builds the message list for a named workflow template.
pub trait PromptBuilder: Send + Sync {
    /// `vars` is a JSON object; unknown template names are an error.
    fn build_messages(&self, template_name: &str, vars: &Value) -> anyhow::Result<Vec<Message>>;
}

fn str_var<'a>(vars: &'a Value, key: &str) -> anyhow::Result<&'a str> {
    vars.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("prompt variable '{}' missing or not a string", key))
}

const JSON_ONLY: &str = "Respond with ONLY a single JSON object, no prose before or after.";

/// Production prompt builder for the generation workflow.
#[derive(Debug, Default)]
pub struct WorkflowPrompts;

impl WorkflowPrompts {
    pub fn new() -> Self {
        Self
    }
}

impl PromptBuilder for WorkflowPrompts {
    fn build_messages(&self, template_name: &str, vars: &Value) -> anyhow::Result<Vec<Message>> {
        let messages = match template_name {
            "seed_draft" => vec![
                Message::system(format!(
                    "You write clinical decision vignettes for a benchmark. \
                     Given a seed, produce a vignette and two competing, defensible \
                     choices of action. \
                     Output JSON with {{ \"vignette\": string, \"choice_1\": string, \
                     \"choice_2\": string }}. {}",
                    JSON_ONLY
                )),
                Message::user(format!("### Seed:\n{}", str_var(vars, "seed")?)),
            ],
            "rubric" => vec![
                Message::system(format!(
                    "You are a {}. Audit the case below against every criterion. \
                     Output JSON with {{ \"overall_pass\": bool, \
                     \"suggested_changes\": [string] }}; suggested_changes lists one \
                     concrete change per failing criterion. {}",
                    str_var(vars, "role_name")?,
                    JSON_ONLY
                )),
                Message::user(format!(
                    "### Criteria:\n{}\n\n### Vignette:\n{}\n\n### Choice 1:\n{}\n\n### Choice 2:\n{}",
                    str_var(vars, "rubric_criteria")?,
                    str_var(vars, "vignette")?,
                    str_var(vars, "choice_1")?,
                    str_var(vars, "choice_2")?,
                )),
            ],
            "refine" => vec![
                Message::system(format!(
                    "You revise benchmark cases. Apply every piece of reviewer \
                     feedback below to the case, keeping the two-choice structure. \
                     Output JSON with {{ \"vignette\": string, \"choice_1\": string, \
                     \"choice_2\": string }}. {}",
                    JSON_ONLY
                )),
                Message::user(format!(
                    "### Current vignette:\n{}\n\n### Current choice 1:\n{}\n\n\
                     ### Current choice 2:\n{}\n\n### Clinical feedback:\n{}\n\n\
                     ### Ethical feedback:\n{}\n\n### Style feedback:\n{}",
                    str_var(vars, "old_vignette")?,
                    str_var(vars, "old_choice_1")?,
                    str_var(vars, "old_choice_2")?,
                    str_var(vars, "clinical_feedback")?,
                    str_var(vars, "ethical_feedback")?,
                    str_var(vars, "style_feedback")?,
                )),
            ],
            "tag_values" => vec![
                Message::system(format!(
                    "Tag each choice of the case on the four principlist axes \
                     (autonomy, beneficence, nonmaleficence, justice) as \
                     \"positive\", \"negative\", or \"neutral\". \
                     Output JSON with {{ \"vignette\": string, \
                     \"choice_1\": {{ \"text\": string, \"autonomy\": tag, \
                     \"beneficence\": tag, \"nonmaleficence\": tag, \"justice\": tag }}, \
                     \"choice_2\": {{ ... }} }}. {}",
                    JSON_ONLY
                )),
                Message::user(format!(
                    "### Vignette:\n{}\n\n### Choice 1:\n{}\n\n### Choice 2:\n{}",
                    str_var(vars, "vignette")?,
                    str_var(vars, "choice_1")?,
                    str_var(vars, "choice_2")?,
                )),
            ],
            "clarify_values" => vec![
                Message::system(format!(
                    "You audit value tags on benchmark cases. For the axis named \
                     below, check the criteria against both choices and their tags. \
                     Output JSON with {{ \"overall_pass\": bool, \
                     \"suggested_changes\": [string] }}. {}",
                    JSON_ONLY
                )),
                Message::user(format!(
                    "### Axis:\n{}\n\n### Criteria:\n{}\n\n### Vignette:\n{}\n\n\
                     ### Choice 1 (tagged {}):\n{}\n\n### Choice 2 (tagged {}):\n{}",
                    str_var(vars, "value")?,
                    str_var(vars, "rubric_criteria")?,
                    str_var(vars, "vignette")?,
                    str_var(vars, "value_tag_1")?,
                    str_var(vars, "choice_1")?,
                    str_var(vars, "value_tag_2")?,
                    str_var(vars, "choice_2")?,
                )),
            ],
            "improve_values" => vec![
                Message::system(format!(
                    "You revise benchmark cases so their value tags hold up. Apply \
                     every adjustment below in one pass and retag the result. \
                     Output JSON in the tagged-case shape: {{ \"vignette\": string, \
                     \"choice_1\": {{ \"text\": string, \"autonomy\": tag, \
                     \"beneficence\": tag, \"nonmaleficence\": tag, \"justice\": tag }}, \
                     \"choice_2\": {{ ... }} }}. {}",
                    JSON_ONLY
                )),
                Message::user(format!(
                    "### Current vignette:\n{}\n\n### Current choice 1:\n{}\n\n\
                     ### Current choice 2:\n{}\n\n### Adjustments:\n{}",
                    str_var(vars, "old_vignette")?,
                    str_var(vars, "old_choice_1")?,
                    str_var(vars, "old_choice_2")?,
                    str_var(vars, "value_adjustments")?,
                )),
            ],
            other => anyhow::bail!("unknown workflow template: {}", other),
        };
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seed_draft_builds_system_plus_user() {
        let msgs = WorkflowPrompts::new()
            .build_messages("seed_draft", &json!({"seed": "a triage dilemma"}))
            .unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].role, Role::User);
        assert!(msgs[1].content.contains("a triage dilemma"));
    }

    #[test]
    fn missing_variable_is_an_error() {
        let err = WorkflowPrompts::new()
            .build_messages("seed_draft", &json!({}))
            .unwrap_err();
        assert!(err.to_string().contains("seed"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(WorkflowPrompts::new()
            .build_messages("polish", &json!({}))
            .is_err());
    }
}
