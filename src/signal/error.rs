use thiserror::Error;

use super::types::SignalKind;

/// Why a producer could not deliver a score.
///
/// Never crosses the producer boundary as an `Err`; it is folded into an unavailable
/// [`SignalResult`](super::SignalResult) with the message as its reason.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("input too short: {words} words (minimum {min})")]
    InputTooShort { words: usize, min: usize },

    #[error("{kind} producer timed out after {timeout_ms}ms")]
    Timeout { kind: SignalKind, timeout_ms: u64 },

    #[error("{kind} producer task failed: {reason}")]
    TaskFailed { kind: SignalKind, reason: String },

    #[error("no {kind} backend succeeded")]
    Exhausted { kind: SignalKind },
}

impl SignalError {
    pub fn into_result(self, kind: SignalKind) -> super::SignalResult {
        super::SignalResult::unavailable(kind, self.to_string())
    }
}
