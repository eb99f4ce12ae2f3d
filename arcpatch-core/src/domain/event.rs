//! Run event types
//!
//! Shapes emitted by the pipeline while a run is in flight and when it
//! finishes. The engine sends `ProgressUpdate`s over a channel and the
//! run task resolves to a single `RunOutcome`.

use serde::{Deserialize, Serialize};

/// Progress notification emitted while a run is underway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub message: String,
    pub current: usize,
    pub total: usize,
    pub percentage: u32,
}

impl ProgressUpdate {
    /// Creates an update with the percentage derived from current/total.
    ///
    /// The percentage truncates toward zero and is 0 for an empty batch.
    pub fn new(message: impl Into<String>, current: usize, total: usize) -> Self {
        let percentage = if total > 0 {
            (current * 100 / total) as u32
        } else {
            0
        };

        Self {
            message: message.into(),
            current,
            total,
            percentage,
        }
    }
}

/// Final result of one auto-apply run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCompletion {
    pub success: bool,
    pub error_message: Option<String>,
    /// Number of source files in the change set the run was given.
    pub source_count: usize,
    /// Number of archive units that were rebuilt successfully.
    pub unit_count: usize,
}

impl RunCompletion {
    pub fn succeeded(source_count: usize, unit_count: usize) -> Self {
        Self {
            success: true,
            error_message: None,
            source_count,
            unit_count,
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(error_message.into()),
            source_count: 0,
            unit_count: 0,
        }
    }
}

/// Outcome of asking the pipeline to run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Auto-apply is disabled for the project; nothing was launched and
    /// no events were emitted.
    Disabled,
    /// The run went through both phases (possibly with per-item failures).
    Completed(RunCompletion),
}

impl RunOutcome {
    pub fn completion(&self) -> Option<&RunCompletion> {
        match self {
            RunOutcome::Disabled => None,
            RunOutcome::Completed(completion) => Some(completion),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_truncates_toward_zero() {
        assert_eq!(ProgressUpdate::new("", 1, 3).percentage, 33);
        assert_eq!(ProgressUpdate::new("", 2, 3).percentage, 66);
        assert_eq!(ProgressUpdate::new("", 3, 3).percentage, 100);
    }

    #[test]
    fn test_percentage_is_zero_for_empty_batch() {
        assert_eq!(ProgressUpdate::new("", 0, 0).percentage, 0);
    }

    #[test]
    fn test_failed_completion_zeroes_counts() {
        let completion = RunCompletion::failed("boom");
        assert!(!completion.success);
        assert_eq!(completion.source_count, 0);
        assert_eq!(completion.unit_count, 0);
        assert_eq!(completion.error_message.as_deref(), Some("boom"));
    }
}
