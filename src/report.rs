//! Run summary and exit status.

use std::fmt::Write as _;

use crate::upload::{UploadOutcome, UploadStatus};

/// Aggregated result of one run, collected after the orchestrator
/// completes. Outcomes arrive in completion order; nothing here depends
/// on it.
#[derive(Debug)]
pub struct RunReport {
    total_tasks: usize,
    outcomes: Vec<UploadOutcome>,
}

impl RunReport {
    pub fn new(total_tasks: usize, outcomes: Vec<UploadOutcome>) -> Self {
        Self {
            total_tasks,
            outcomes,
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    /// Tasks that were enumerated but never claimed, e.g. after an
    /// interrupt.
    pub fn not_attempted(&self) -> usize {
        self.total_tasks.saturating_sub(self.outcomes.len())
    }

    pub fn outcomes(&self) -> &[UploadOutcome] {
        &self.outcomes
    }

    /// Exit status for scripting: zero only when every enumerated task
    /// succeeded.
    pub fn exit_code(&self) -> i32 {
        if self.failed_count() == 0 && self.not_attempted() == 0 {
            0
        } else {
            1
        }
    }

    /// Human-readable summary. The exact format is not a compatibility
    /// contract.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            let path = outcome.task.local_path.display();
            match &outcome.status {
                UploadStatus::Succeeded(receipt) => {
                    let _ = writeln!(out, "[OK] {path} -> file_id={}", receipt.file_id);
                }
                UploadStatus::FailedPermanently => {
                    let cause = outcome
                        .last_error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "unknown error".to_string());
                    let _ = writeln!(
                        out,
                        "[ERR] {path} -> {cause} (after {} attempts)",
                        outcome.attempts_made
                    );
                }
            }
        }
        let _ = writeln!(
            out,
            "Done. ok={} failed={}",
            self.succeeded_count(),
            self.failed_count()
        );
        if self.not_attempted() > 0 {
            let _ = writeln!(out, "{} tasks not attempted (interrupted)", self.not_attempted());
        }
        out
    }
}
