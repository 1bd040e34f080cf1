//! The evaluation-store session utility: open or create a session for an
//! email, print its info and best-effort statistics, then list every
//! session in the store.

use crate::cli::args::SessionArgs;
use caseforge_core::loader::JsonCaseStore;
use caseforge_core::store::EvaluationStore;

pub fn run(args: SessionArgs) -> anyhow::Result<i32> {
    let data_dir = super::data_dir();
    let mut store = EvaluationStore::new(data_dir.join("evaluations"))?;

    println!("\nEvaluation Store");
    println!("{}", "-".repeat(80));

    let email = match args.email {
        Some(email) => email,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Enter your email")
            .interact_text()?
            .trim()
            .to_string(),
    };

    if let Err(e) = store.load_or_create_session(&email) {
        eprintln!("\nError: {}", e);
        return Ok(e.exit_code());
    }
    // Persist the (possibly fresh) session so it shows up in the listing.
    store.save_session()?;
    let session = store.current_session().expect("session just loaded");

    println!("\nSession Info:");
    println!("  Email: {}", session.user_email);
    println!("  Session ID: {}", session.session_id);
    println!("  Started: {}", session.started_at.to_rfc3339());
    println!("  Reviewed cases: {}", session.reviewed_case_ids.len());

    // Statistics are best effort: a broken cases directory should not take
    // the session utility down.
    match JsonCaseStore::new(data_dir.join("cases")) {
        Ok(loader) => {
            let stats = store.get_statistics(&loader);
            println!("\nStatistics:");
            println!("  Total reviewed: {}", stats.total_reviewed);
            println!("  Approved: {}", stats.approved);
            println!("  Rejected: {}", stats.rejected);
            println!("  With edits: {}", stats.with_edits);
        }
        Err(e) => {
            println!("\nNote: could not load statistics: {}", e);
        }
    }

    println!("\n{}", "-".repeat(80));
    println!("\nAll Sessions:");
    for s in store.list_all_sessions() {
        println!(
            "  - {}: {} evaluations (updated: {})",
            s.email,
            s.num_evaluations,
            &s.last_updated[..19.min(s.last_updated.len())]
        );
    }

    Ok(0)
}
