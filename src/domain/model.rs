use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

/// One row of the supplier CSV, column name -> raw cell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    /// 1-based data row index (the header is row 0).
    pub row: usize,
    /// Line in the source file where the row starts.
    pub line: u64,
    pub fields: HashMap<String, String>,
}

impl InputRecord {
    pub fn new(row: usize, fields: HashMap<String, String>) -> Self {
        Self {
            row,
            line: row as u64 + 1,
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// One parsed row destined for the output CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub fields: Mapping,
}

impl OutputRecord {
    pub fn new(fields: Mapping) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Render,
    Parse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub row: usize,
    pub stage: FailureStage,
    /// Rendered text when the failure happened while parsing.
    pub text: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionResult {
    pub records: Vec<OutputRecord>,
    pub failures: Vec<RecordFailure>,
    /// Renders that came out empty and were dropped without counting as failures.
    pub skipped: usize,
    pub input_count: usize,
}

impl ConversionResult {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn converted(&self) -> usize {
        self.records.len()
    }
}

/// What the renderer does when a placeholder names a column the row does not have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum MissingFieldPolicy {
    #[default]
    Empty,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum RenderErrorPolicy {
    #[default]
    Skip,
    Abort,
}

/// How unquoted YAML scalars are typed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ScalarMode {
    /// YAML 1.1 typing: `yes`/`off` booleans, `010` octal, `1_000` grouping,
    /// repeated keys overwrite.
    #[default]
    Typed,
    /// YAML 1.2 core schema as serde_yaml reads it; repeated keys are an error.
    Yaml12,
    /// Every non-null scalar keeps its literal text.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub output_path: Option<String>,
    pub input_records: usize,
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
}
