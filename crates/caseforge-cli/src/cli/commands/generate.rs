//! Generate one case from a seed file, saving the full iteration history.

use crate::cli::args::GenerateArgs;
use anyhow::Context;
use caseforge_core::config::GeneratorConfig;
use caseforge_core::loader::{CaseLoader, JsonCaseStore};
use caseforge_core::model::TaggedCase;
use caseforge_core::pipeline::{generate_case, PipelineContext, PipelineEvent};
use caseforge_core::prompts::WorkflowPrompts;
use caseforge_core::providers::llm::OpenAiClient;
use caseforge_core::record::CaseRecord;
use chrono::Utc;
use std::sync::Arc;

pub async fn run(args: GenerateArgs) -> anyhow::Result<i32> {
    let seed = std::fs::read_to_string(&args.seed)
        .with_context(|| format!("failed to read seed file {}", args.seed.display()))?
        .trim()
        .to_string();
    anyhow::ensure!(!seed.is_empty(), "seed file {} is empty", args.seed.display());

    let config = GeneratorConfig::load(&args.config)?;
    let data_dir = args.data_dir.unwrap_or_else(|| config.data_dir.clone());

    let client = OpenAiClient::from_env(
        config.model.clone(),
        config.temperature,
        config.max_tokens,
    )?;
    let ctx = PipelineContext::new(Box::new(WorkflowPrompts::new()), Box::new(client))
        .with_progress(Arc::new(console_progress));

    let case_id = format!("case_{}", Utc::now().format("%Y%m%d_%H%M%S"));
    let mut record = CaseRecord::new(case_id.clone());
    let final_case = generate_case(&ctx, &seed, &mut record).await?;

    let loader = JsonCaseStore::new(data_dir.join("cases"))?;
    loader.save_case(&record)?;

    println!("\nSaved {} ({} iterations)", case_id, record.len());
    print_case("FINAL CASE", &final_case);
    Ok(0)
}

fn console_progress(event: &PipelineEvent) {
    match event {
        PipelineEvent::DraftReady => println!("Draft ready"),
        PipelineEvent::AuditCompleted { dimension, passed } => {
            println!("  [{}] audit: {}", dimension, if *passed { "pass" } else { "fail" })
        }
        PipelineEvent::RoundCompleted { round } => println!("Round {} complete", round + 1),
        PipelineEvent::CaseTagged => println!("Values tagged"),
        PipelineEvent::ValueAuditCompleted { axis, passed } => {
            println!("  [{}] value audit: {}", axis, if *passed { "pass" } else { "fail" })
        }
        PipelineEvent::AdjustmentsApplied { axes } => {
            println!("Applied adjustments across {} axes", axes)
        }
    }
}

fn print_case(title: &str, case: &TaggedCase) {
    println!("\n=== {} ===", title);
    println!("{}\n", case.vignette);
    for (label, choice) in [("Choice 1", &case.choice_1), ("Choice 2", &case.choice_2)] {
        println!(
            "{}: {}\n  autonomy={} beneficence={} nonmaleficence={} justice={}",
            label,
            choice.text,
            choice.tags.autonomy.as_str(),
            choice.tags.beneficence.as_str(),
            choice.tags.nonmaleficence.as_str(),
            choice.tags.justice.as_str(),
        );
    }
}
