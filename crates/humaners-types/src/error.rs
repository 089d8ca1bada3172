// ─────────────────────────────────────────────────────────────────────
// HumanERS — Threat Fusion Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all threat fusion failures.
///
/// None of these are fatal to a session: detectors that keep failing are
/// demoted to simulation and the failure surfaces only as a status flag.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HumanersError {
    /// Detector library or model is absent.
    #[error("detector unavailable: {0}")]
    Unavailable(String),

    /// Detector did not answer within its deadline.
    #[error("timeout: detector exceeded {deadline_ms}ms deadline")]
    Timeout { deadline_ms: u64 },

    /// Transient per-frame detection failure.
    #[error("detection error: {0}")]
    Detection(String),

    /// Raw signal did not have the expected shape for its channel.
    #[error("malformed signal: {0}")]
    MalformedSignal(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Invalid input (channel, parameters).
    #[error("validation error: {0}")]
    Validation(String),
}

pub type HumanersResult<T> = Result<T, HumanersError>;
