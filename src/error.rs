use thiserror::Error;

/// Result alias used by the analysis engine.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Structural and data-quality failures surfaced by the analysis engine.
///
/// Numeric degeneracies (zero-length windows, zero means, zero server counts)
/// are never reported through this type; they resolve to fixed fallback values
/// at the point of computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// A record violates the `arrival <= start <= finish` ordering or carries a
    /// negative timestamp. The whole batch is rejected.
    #[error("Data integrity violation at record {index}: {reason} (arrival={arrival_ns}, start={start_ns}, finish={finish_ns})")]
    DataIntegrity {
        index: usize,
        reason: &'static str,
        arrival_ns: i64,
        start_ns: i64,
        finish_ns: i64,
    },

    #[error("Unknown scheduler: {0} (expected one of fcfs, sjf, rr)")]
    UnknownScheduler(String),

    #[error("Unknown dimension: {0} (expected one of baseline, clients, servers, packet_size, quantum)")]
    UnknownDimension(String),

    #[error("Invalid experiment identity: {0}")]
    InvalidIdentity(String),
}

impl AnalysisError {
    /// Short machine-friendly name, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::DataIntegrity { .. } => "data_integrity",
            AnalysisError::UnknownScheduler(_) => "unknown_scheduler",
            AnalysisError::UnknownDimension(_) => "unknown_dimension",
            AnalysisError::InvalidIdentity(_) => "invalid_identity",
        }
    }
}
