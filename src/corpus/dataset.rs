//! Bug-report dataset loading.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// One bug report: identifier, text, and the source revision it was filed
/// against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugReport {
    pub bug_id: u32,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub commit: String,
}

impl BugReport {
    /// Summary and description joined into the text fed to the pipeline.
    pub fn full_text(&self) -> String {
        match &self.description {
            Some(description) if !description.is_empty() => {
                format!("{}\n{}", self.summary, description)
            }
            _ => self.summary.clone(),
        }
    }
}

/// Read-only collection of bug reports, loaded once at startup.
pub struct BugDataset {
    records: Vec<BugReport>,
    index: HashMap<u32, usize>,
}

impl BugDataset {
    /// Load the dataset from a CSV file with columns
    /// `bug_id,summary,description,commit`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::dataset(format!(
                "dataset file not found: {}",
                path.display()
            )));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        let mut index = HashMap::new();

        for result in reader.deserialize() {
            let record: BugReport = result?;
            // First record wins on duplicate ids.
            index.entry(record.bug_id).or_insert(records.len());
            records.push(record);
        }

        if records.is_empty() {
            return Err(Error::dataset(format!(
                "{} contains no bug reports",
                path.display()
            )));
        }

        Ok(Self { records, index })
    }

    /// Look up a bug report by id.
    pub fn get(&self, bug_id: u32) -> Result<&BugReport> {
        self.index
            .get(&bug_id)
            .map(|&i| &self.records[i])
            .ok_or(Error::BugNotFound { bug_id })
    }

    /// Iterate over all bug reports in file order.
    pub fn iter(&self) -> impl Iterator<Item = &BugReport> {
        self.records.iter()
    }

    /// Number of bug reports.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
