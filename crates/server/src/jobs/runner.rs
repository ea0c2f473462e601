use super::models::{JobProgress, JobResult, JobStatus};
use super::queue::JobQueue;
use notebook_core::{Orchestrator, ProgressReporter, Stage};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Bridges `notebook_core::ProgressReporter` stage transitions into the job
/// queue's broadcast channel. One instance is shared by the process-wide
/// `Orchestrator`; events are routed to the right job by parsing `source_id`
/// back into the `Uuid` that doubles as the job id.
pub struct QueueProgressReporter {
    queue: JobQueue,
}

impl QueueProgressReporter {
    pub fn new(queue: JobQueue) -> Self {
        Self { queue }
    }
}

impl ProgressReporter for QueueProgressReporter {
    fn on_stage(&self, source_id: &str, stage: Stage) {
        let Ok(id) = Uuid::parse_str(source_id) else {
            return;
        };
        let queue = self.queue.clone();
        let progress = JobProgress { stage: stage.as_str().to_string() };
        tokio::spawn(async move {
            queue.update_progress(&id, progress).await;
        });
    }

    fn on_unit_skipped(&self, source_id: &str, unit: &str, reason: &str) {
        tracing::warn!(source_id, unit, reason, "ingestion unit skipped");
    }

    fn on_finished(&self, source_id: &str, stage: Stage, skipped_units: u32) {
        tracing::info!(source_id, ?stage, skipped_units, "ingestion finished");
    }
}

/// Run one ingestion job in the background, recording its outcome in the
/// queue. Per-stage progress is reported by the orchestrator's shared
/// [`QueueProgressReporter`], not by this function.
pub async fn run_job(
    job_id: Uuid,
    file_path: PathBuf,
    output_dir: PathBuf,
    filename: String,
    queue: JobQueue,
    orchestrator: Arc<Orchestrator>,
) {
    queue.update_status(&job_id, JobStatus::Processing).await;

    match orchestrator.ingest(job_id, &file_path, &output_dir, &filename).await {
        Ok(outcome) => {
            let result = JobResult {
                source_id: outcome.source_id,
                documents_indexed: outcome.documents_indexed as u32,
                skipped_units: outcome.skipped_units,
            };
            queue.set_completed(&job_id, result).await;
        }
        Err(e) => {
            queue.set_failed(&job_id, e.to_string()).await;
        }
    }
}
