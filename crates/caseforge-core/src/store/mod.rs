//! Per-user evaluation sessions and the read side of the evaluation store.
//!
//! A session is a lightweight cache of *which* case ids a user has acted
//! on; the [`CaseRecord`](crate::record::CaseRecord) log stays authoritative
//! for *what* each evaluation contains. Sessions persist as one JSON file
//! per sanitized email, rewritten whole on every change, with no locking —
//! concurrent writers for the same email race and the last write wins.
//!
//! Evaluation content is never duplicated into the session; reads go
//! through [`reconstruct`], which derives the before/after views of an
//! evaluation purely from the case log.

use crate::errors::{StoreError, StoreResult};
use crate::loader::CaseLoader;
use crate::model::TaggedCase;
use crate::record::Decision;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub mod reconstruct;

pub use reconstruct::EvaluationView;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid regex");
}

/// Lowercase `raw` and replace every character outside `[a-z0-9_.-]` with
/// an underscore. Used for both session filenames and case filenames.
pub fn sanitize_component(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// One user's session: identity plus the set of reviewed case ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_email: String,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_case_ids: BTreeSet<String>,
}

/// Counts over the current session's reviewed cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total_reviewed: usize,
    pub approved: usize,
    pub rejected: usize,
    pub with_edits: usize,
}

/// One row of the all-sessions listing.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub email: String,
    pub session_id: String,
    pub started_at: String,
    pub last_updated: String,
    pub num_evaluations: usize,
}

/// Session persistence plus the evaluation read/write paths.
pub struct EvaluationStore {
    evaluations_dir: PathBuf,
    current_session: Option<UserSession>,
}

impl EvaluationStore {
    pub fn new(evaluations_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let evaluations_dir = evaluations_dir.into();
        std::fs::create_dir_all(&evaluations_dir)?;
        Ok(Self {
            evaluations_dir,
            current_session: None,
        })
    }

    pub fn current_session(&self) -> Option<&UserSession> {
        self.current_session.as_ref()
    }

    fn session_file_path(&self, email: &str) -> PathBuf {
        self.evaluations_dir
            .join(format!("session_{}.json", sanitize_component(email)))
    }

    /// Load the session for `user_email`, creating one on first contact.
    /// Loading an existing session bumps `last_updated`.
    pub fn load_or_create_session(&mut self, user_email: &str) -> StoreResult<&UserSession> {
        if !is_valid_email(user_email) {
            return Err(StoreError::InvalidEmail {
                email: user_email.to_string(),
            });
        }

        let path = self.session_file_path(user_email);
        let session = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let mut session: UserSession = serde_json::from_str(&raw)?;
            session.last_updated = Utc::now();
            tracing::info!(
                email = user_email,
                reviewed = session.reviewed_case_ids.len(),
                "loaded existing session"
            );
            session
        } else {
            let now = Utc::now();
            let session = UserSession {
                user_email: user_email.to_string(),
                session_id: format!(
                    "{}_{}",
                    sanitize_component(user_email),
                    now.format("%Y%m%d_%H%M%S")
                ),
                started_at: now,
                last_updated: now,
                reviewed_case_ids: BTreeSet::new(),
            };
            tracing::info!(email = user_email, "created new session");
            session
        };

        self.current_session = Some(session);
        Ok(self.current_session.as_ref().expect("just set"))
    }

    /// Persist the current session as a whole-file overwrite, bumping
    /// `last_updated`.
    pub fn save_session(&mut self) -> StoreResult<()> {
        let session = self
            .current_session
            .as_mut()
            .ok_or(StoreError::NoActiveSession)?;
        session.last_updated = Utc::now();
        let path = self
            .evaluations_dir
            .join(format!("session_{}.json", sanitize_component(&session.user_email)));
        let raw = serde_json::to_string_pretty(&session)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Record a human evaluation against the case log, then — only once the
    /// record is safely persisted — track the case id in the session. A
    /// failure anywhere before that last step leaves the session untouched,
    /// so session membership always implies a persisted evaluation.
    pub fn record_evaluation(
        &mut self,
        loader: &dyn CaseLoader,
        case_id: &str,
        decision: &str,
        updated_case: Option<TaggedCase>,
        notes: Option<String>,
    ) -> StoreResult<()> {
        let session = self
            .current_session
            .as_ref()
            .ok_or(StoreError::NoActiveSession)?;
        let decision = Decision::parse(decision)?;

        let mut record = loader
            .get_case_by_id(case_id)
            .map_err(StoreError::Storage)?
            .ok_or_else(|| StoreError::CaseNotFound {
                case_id: case_id.to_string(),
            })?;

        record.add_human_evaluation(decision, session.user_email.clone(), updated_case, notes)?;
        loader.save_case(&record).map_err(StoreError::Storage)?;

        let session = self
            .current_session
            .as_mut()
            .ok_or(StoreError::NoActiveSession)?;
        session.reviewed_case_ids.insert(case_id.to_string());
        self.save_session()?;
        tracing::info!(case_id, "evaluation recorded");
        Ok(())
    }

    /// Whether the current session has reviewed `case_id`. No session means
    /// nothing is reviewed.
    pub fn has_reviewed(&self, case_id: &str) -> bool {
        self.current_session
            .as_ref()
            .map(|s| s.reviewed_case_ids.contains(case_id))
            .unwrap_or(false)
    }

    /// `all_case_ids` minus the session's reviewed set, in input order.
    pub fn get_unreviewed_cases(&self, all_case_ids: &[String]) -> Vec<String> {
        match &self.current_session {
            None => all_case_ids.to_vec(),
            Some(session) => all_case_ids
                .iter()
                .filter(|id| !session.reviewed_case_ids.contains(*id))
                .cloned()
                .collect(),
        }
    }

    /// Reconstruct the most recent evaluation view for `case_id` from its
    /// log. Missing record or no evaluation is `None`, not an error.
    pub fn get_evaluation(
        &self,
        loader: &dyn CaseLoader,
        case_id: &str,
    ) -> StoreResult<Option<EvaluationView>> {
        let record = match loader.get_case_by_id(case_id).map_err(StoreError::Storage)? {
            Some(r) => r,
            None => return Ok(None),
        };
        reconstruct::reconstruct(&record)
    }

    /// Best-effort statistics over the current session's reviewed ids.
    /// Missing or unevaluated records are skipped, not errors.
    pub fn get_statistics(&self, loader: &dyn CaseLoader) -> SessionStats {
        let session = match &self.current_session {
            Some(s) => s,
            None => return SessionStats::default(),
        };

        let mut stats = SessionStats {
            total_reviewed: session.reviewed_case_ids.len(),
            ..SessionStats::default()
        };
        for case_id in &session.reviewed_case_ids {
            let record = match loader.get_case_by_id(case_id) {
                Ok(Some(r)) => r,
                _ => continue,
            };
            let Some((_, ev)) = record.latest_evaluation() else {
                continue;
            };
            match ev.decision {
                Decision::Approve => stats.approved += 1,
                Decision::Reject => stats.rejected += 1,
            }
            if ev.has_edits {
                stats.with_edits += 1;
            }
        }
        stats
    }

    /// List every session file in the store, newest activity first.
    /// Malformed files are skipped with a warning.
    pub fn list_all_sessions(&self) -> Vec<SessionSummary> {
        let mut sessions = Vec::new();
        let entries = match std::fs::read_dir(&self.evaluations_dir) {
            Ok(e) => e,
            Err(_) => return sessions,
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with("session_") || !name.ends_with(".json") {
                continue;
            }
            let parsed: Result<UserSession, _> = std::fs::read_to_string(entry.path())
                .map_err(anyhow::Error::from)
                .and_then(|raw| serde_json::from_str(&raw).map_err(anyhow::Error::from));
            match parsed {
                Ok(session) => sessions.push(SessionSummary {
                    email: session.user_email,
                    session_id: session.session_id,
                    started_at: session.started_at.to_rfc3339(),
                    last_updated: session.last_updated.to_rfc3339(),
                    num_evaluations: session.reviewed_case_ids.len(),
                }),
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "skipping malformed session file");
                }
            }
        }
        sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        sessions
    }

    pub fn dir(&self) -> &Path {
        &self.evaluations_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn email_validation_basics() {
        assert!(is_valid_email("reviewer@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn sanitize_replaces_out_of_class_characters() {
        assert_eq!(
            sanitize_component("Reviewer+One@Example.com"),
            "reviewer_one_example.com"
        );
        assert_eq!(sanitize_component("a b/c"), "a_b_c");
    }

    #[test]
    fn session_round_trip_preserves_identity_and_reviewed_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EvaluationStore::new(dir.path()).unwrap();
        store.load_or_create_session("rev@example.com").unwrap();
        {
            let session = store.current_session.as_mut().unwrap();
            session.reviewed_case_ids.insert("case-2".into());
            session.reviewed_case_ids.insert("case-1".into());
        }
        store.save_session().unwrap();
        let session_id = store.current_session().unwrap().session_id.clone();

        let mut store2 = EvaluationStore::new(dir.path()).unwrap();
        let loaded = store2.load_or_create_session("rev@example.com").unwrap();
        assert_eq!(loaded.user_email, "rev@example.com");
        assert_eq!(loaded.session_id, session_id);
        assert_eq!(
            loaded.reviewed_case_ids,
            ["case-1", "case-2"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn session_file_lands_under_sanitized_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EvaluationStore::new(dir.path()).unwrap();
        store.load_or_create_session("Rev+One@Example.com").unwrap();
        store.save_session().unwrap();
        assert!(dir
            .path()
            .join("session_rev_one_example.com.json")
            .exists());
    }

    #[test]
    fn invalid_email_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EvaluationStore::new(dir.path()).unwrap();
        let err = store.load_or_create_session("nope").unwrap_err();
        assert!(matches!(err, StoreError::InvalidEmail { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn unreviewed_preserves_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EvaluationStore::new(dir.path()).unwrap();

        let all: Vec<String> = ["c3", "c1", "c2"].iter().map(|s| s.to_string()).collect();
        // No session: everything is unreviewed.
        assert_eq!(store.get_unreviewed_cases(&all), all);
        assert_eq!(store.get_unreviewed_cases(&[]), Vec::<String>::new());

        store.load_or_create_session("rev@example.com").unwrap();
        store
            .current_session
            .as_mut()
            .unwrap()
            .reviewed_case_ids
            .insert("c1".into());
        assert_eq!(store.get_unreviewed_cases(&all), vec!["c3", "c2"]);
    }

    #[test]
    fn list_all_sessions_skips_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EvaluationStore::new(dir.path()).unwrap();
        store.load_or_create_session("rev@example.com").unwrap();
        store.save_session().unwrap();
        std::fs::write(dir.path().join("session_broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), "ignored").unwrap();

        let sessions = store.list_all_sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].email, "rev@example.com");
    }

    #[test]
    fn list_all_sessions_sorts_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvaluationStore::new(dir.path()).unwrap();
        for (name, updated) in [
            ("session_old.json", "2026-01-01T00:00:00Z"),
            ("session_new.json", "2026-06-01T00:00:00Z"),
        ] {
            let raw = serde_json::json!({
                "user_email": format!("{}@example.com", name),
                "session_id": name,
                "started_at": "2026-01-01T00:00:00Z",
                "last_updated": updated,
                "reviewed_case_ids": []
            });
            std::fs::write(dir.path().join(name), raw.to_string()).unwrap();
        }
        let sessions = store.list_all_sessions();
        assert_eq!(sessions[0].session_id, "session_new.json");
    }

    proptest! {
        #[test]
        fn sanitization_emits_only_safe_chars_and_is_idempotent(raw in ".{0,64}") {
            let once = sanitize_component(&raw);
            prop_assert!(once
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-')));
            prop_assert_eq!(sanitize_component(&once), once.clone());
        }
    }
}
