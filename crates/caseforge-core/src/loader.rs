//! Case record persistence.
//!
//! The store only sees the [`CaseLoader`] trait; the on-disk format is this
//! module's business. [`JsonCaseStore`] keeps one pretty-printed JSON file
//! per case id. No locking anywhere: concurrent writers to the same case
//! race and the last write wins.

use crate::record::CaseRecord;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Loads and saves case records by id.
pub trait CaseLoader {
    fn get_case_by_id(&self, case_id: &str) -> anyhow::Result<Option<CaseRecord>>;
    fn save_case(&self, record: &CaseRecord) -> anyhow::Result<()>;
}

/// One JSON file per case under a cases directory.
pub struct JsonCaseStore {
    cases_dir: PathBuf,
}

impl JsonCaseStore {
    pub fn new(cases_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let cases_dir = cases_dir.into();
        std::fs::create_dir_all(&cases_dir)
            .with_context(|| format!("failed to create cases dir {}", cases_dir.display()))?;
        Ok(Self { cases_dir })
    }

    fn case_path(&self, case_id: &str) -> PathBuf {
        self.cases_dir
            .join(format!("case_{}.json", crate::store::sanitize_component(case_id)))
    }

    pub fn dir(&self) -> &Path {
        &self.cases_dir
    }
}

impl CaseLoader for JsonCaseStore {
    fn get_case_by_id(&self, case_id: &str) -> anyhow::Result<Option<CaseRecord>> {
        let path = self.case_path(case_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read case file {}", path.display()))?;
        let record: CaseRecord = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse case file {}", path.display()))?;
        Ok(Some(record))
    }

    fn save_case(&self, record: &CaseRecord) -> anyhow::Result<()> {
        let path = self.case_path(&record.case_id);
        let raw = serde_json::to_string_pretty(record).context("failed to serialize case record")?;
        std::fs::write(&path, raw)
            .with_context(|| format!("failed to write case file {}", path.display()))?;
        Ok(())
    }
}
