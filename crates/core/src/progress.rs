/// A stage transition in the ingestion state machine (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Extracted,
    Segmented,
    Captioned,
    TreeBuilt,
    Chunked,
    Embedded,
    Indexed,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Extracted => "extracted",
            Self::Segmented => "segmented",
            Self::Captioned => "captioned",
            Self::TreeBuilt => "tree_built",
            Self::Chunked => "chunked",
            Self::Embedded => "embedded",
            Self::Indexed => "indexed",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Trait for reporting ingestion progress. Implementations can target CLI
/// (indicatif), WebSocket, or any other channel.
pub trait ProgressReporter: Send + Sync {
    /// Called whenever the orchestrator transitions to a new stage.
    fn on_stage(&self, source_id: &str, stage: Stage);

    /// Called after an OCR/caption unit completes, successfully or not.
    fn on_unit_skipped(&self, source_id: &str, unit: &str, reason: &str);

    /// Called once ingestion reaches DONE or FAILED.
    fn on_finished(&self, source_id: &str, stage: Stage, skipped_units: u32);
}

/// A no-op progress reporter that discards all events.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn on_stage(&self, _source_id: &str, _stage: Stage) {}
    fn on_unit_skipped(&self, _source_id: &str, _unit: &str, _reason: &str) {}
    fn on_finished(&self, _source_id: &str, _stage: Stage, _skipped_units: u32) {}
}

/// Reports every event through `tracing`, in the teacher's style of logging
/// progress alongside (not instead of) a structured reporter interface.
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn on_stage(&self, source_id: &str, stage: Stage) {
        tracing::info!(source_id, stage = stage.as_str(), "ingestion stage");
    }
    fn on_unit_skipped(&self, source_id: &str, unit: &str, reason: &str) {
        tracing::warn!(source_id, unit, reason, "best-effort unit skipped");
    }
    fn on_finished(&self, source_id: &str, stage: Stage, skipped_units: u32) {
        tracing::info!(source_id, stage = stage.as_str(), skipped_units, "ingestion finished");
    }
}
