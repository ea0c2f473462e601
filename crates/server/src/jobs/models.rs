use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an ingestion job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Per-job ingestion overrides. Provider/model/vector-store endpoint are
/// process-wide singletons (§9 Design Notes); only the document language
/// varies per upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "th".to_string()
}

impl Default for JobConfig {
    fn default() -> Self {
        Self { language: default_language() }
    }
}

/// Progress update for a job, mirroring `notebook_core::Stage` (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub stage: String,
}

/// Result of a completed ingestion job (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub source_id: Uuid,
    pub documents_indexed: u32,
    pub skipped_units: Vec<String>,
}

/// An ingestion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub filename: String,
    pub status: JobStatus,
    pub config: JobConfig,
    pub progress: Option<JobProgress>,
    pub result: Option<JobResult>,
    pub error: Option<String>,
    /// Hex-encoded hash of the uploaded bytes, used for idempotent re-ingest
    /// (spec §3 Lifecycle: a hash match returns the existing source instead
    /// of re-creating and re-indexing).
    pub content_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Job {
    /// A job's id doubles as the ingested source's id, so progress events
    /// keyed by `source_id` (a string) route back to the right row.
    pub fn new(id: Uuid, filename: String, config: JobConfig, content_hash: String) -> Self {
        let now = iso_now();
        Self {
            id,
            filename,
            status: JobStatus::Pending,
            config,
            progress: None,
            result: None,
            error: None,
            content_hash,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// ISO 8601 UTC timestamp, e.g. `2026-02-19T01:12:24Z`.
pub fn iso_now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
