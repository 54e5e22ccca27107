//! # Request Record Model
//!
//! Canonical per-request observation produced by the scheduling simulator and
//! the batch validation that turns raw timestamp tuples into records.
//!
//! Every record carries three timestamps in a shared nanosecond epoch. The
//! derived millisecond durations are computed once, at validation time, using
//! plain double-precision division; no further rounding is applied.
//!
//! Validation is all-or-nothing: a single out-of-order record rejects the whole
//! batch, since metrics computed over a partially corrupt log are misleading.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Nanoseconds per millisecond, used for every ns → ms conversion.
pub const NS_PER_MS: f64 = 1_000_000.0;

/// Nanoseconds per second, used for throughput windows.
pub const NS_PER_SEC: f64 = 1_000_000_000.0;

/// Operation type recorded by the simulator for each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestKind {
    Put,
    Get,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestKind::Put => write!(f, "PUT"),
            RequestKind::Get => write!(f, "GET"),
        }
    }
}

/// One unvalidated row as supplied by a loader.
///
/// Timestamps are signed so that corrupt input (negative values) can be
/// detected and reported instead of wrapping. Columns other than the three
/// timestamps are optional; precomputed duration columns in the simulator
/// log are ignored and recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub arrival_time_ns: i64,
    pub start_time_ns: i64,
    pub finish_time_ns: i64,
    #[serde(default, rename = "request_type")]
    pub request_kind: Option<RequestKind>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl RawRecord {
    /// Build a raw record from bare timestamps.
    pub fn new(arrival_time_ns: i64, start_time_ns: i64, finish_time_ns: i64) -> Self {
        Self {
            arrival_time_ns,
            start_time_ns,
            finish_time_ns,
            request_kind: None,
            filename: None,
            file_size: None,
        }
    }

    /// Validate this row, `index` being its position in the batch.
    pub fn validate(self, index: usize) -> Result<RequestRecord> {
        let violation = |reason: &'static str| AnalysisError::DataIntegrity {
            index,
            reason,
            arrival_ns: self.arrival_time_ns,
            start_ns: self.start_time_ns,
            finish_ns: self.finish_time_ns,
        };

        if self.arrival_time_ns < 0 || self.start_time_ns < 0 || self.finish_time_ns < 0 {
            return Err(violation("negative timestamp"));
        }
        if self.start_time_ns < self.arrival_time_ns {
            return Err(violation("start precedes arrival"));
        }
        if self.finish_time_ns < self.start_time_ns {
            return Err(violation("finish precedes start"));
        }

        // Non-negative and ordered, so the casts and subtractions below are exact.
        let arrival = self.arrival_time_ns as u64;
        let start = self.start_time_ns as u64;
        let finish = self.finish_time_ns as u64;

        Ok(RequestRecord {
            arrival_time_ns: arrival,
            start_time_ns: start,
            finish_time_ns: finish,
            waiting_time_ms: (start - arrival) as f64 / NS_PER_MS,
            response_time_ms: (finish - arrival) as f64 / NS_PER_MS,
            service_time_ms: (finish - start) as f64 / NS_PER_MS,
            request_kind: self.request_kind,
            filename: self.filename,
            file_size: self.file_size,
        })
    }
}

impl From<(i64, i64, i64)> for RawRecord {
    fn from((arrival, start, finish): (i64, i64, i64)) -> Self {
        Self::new(arrival, start, finish)
    }
}

/// A validated request observation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    arrival_time_ns: u64,
    start_time_ns: u64,
    finish_time_ns: u64,
    waiting_time_ms: f64,
    response_time_ms: f64,
    service_time_ms: f64,
    request_kind: Option<RequestKind>,
    filename: Option<String>,
    file_size: Option<u64>,
}

impl RequestRecord {
    pub fn arrival_time_ns(&self) -> u64 {
        self.arrival_time_ns
    }

    pub fn start_time_ns(&self) -> u64 {
        self.start_time_ns
    }

    pub fn finish_time_ns(&self) -> u64 {
        self.finish_time_ns
    }

    /// Queueing delay before service began.
    pub fn waiting_time_ms(&self) -> f64 {
        self.waiting_time_ms
    }

    /// Finish minus arrival.
    pub fn response_time_ms(&self) -> f64 {
        self.response_time_ms
    }

    /// Finish minus start.
    pub fn service_time_ms(&self) -> f64 {
        self.service_time_ms
    }

    pub fn request_kind(&self) -> Option<RequestKind> {
        self.request_kind
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }
}

/// Validate a whole batch of raw rows.
///
/// Returns every record in input order, or the first integrity violation.
/// No partial batch is ever returned.
pub fn validate_batch<I>(raw: I) -> Result<Vec<RequestRecord>>
where
    I: IntoIterator,
    I::Item: Into<RawRecord>,
{
    raw.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let row: RawRecord = row.into();
            row.validate(index)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_durations() {
        let record = RawRecord::new(1_000_000, 3_500_000, 13_500_000)
            .validate(0)
            .unwrap();

        assert_eq!(record.waiting_time_ms(), 2.5);
        assert_eq!(record.service_time_ms(), 10.0);
        assert_eq!(record.response_time_ms(), 12.5);
        assert_eq!(record.arrival_time_ns(), 1_000_000);
        assert_eq!(record.finish_time_ns(), 13_500_000);
    }

    #[test]
    fn test_zero_length_request_is_valid() {
        let record = RawRecord::new(42, 42, 42).validate(0).unwrap();
        assert_eq!(record.response_time_ms(), 0.0);
        assert_eq!(record.waiting_time_ms(), 0.0);
    }

    #[test]
    fn test_finish_before_start_rejected() {
        let err = RawRecord::new(0, 10, 5).validate(7).unwrap_err();
        match err {
            AnalysisError::DataIntegrity { index, reason, .. } => {
                assert_eq!(index, 7);
                assert_eq!(reason, "finish precedes start");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_start_before_arrival_rejected() {
        let err = RawRecord::new(10, 5, 20).validate(0).unwrap_err();
        assert!(err.to_string().contains("start precedes arrival"));
    }

    #[test]
    fn test_negative_timestamp_rejected() {
        let err = RawRecord::new(-1, 0, 0).validate(0).unwrap_err();
        assert!(err.to_string().contains("negative timestamp"));
    }

    #[test]
    fn test_batch_rejected_as_a_whole() {
        let batch: Vec<(i64, i64, i64)> = vec![(0, 0, 10), (0, 5, 10), (0, 20, 10), (0, 0, 1)];
        let err = validate_batch(batch).unwrap_err();
        assert!(matches!(err, AnalysisError::DataIntegrity { index: 2, .. }));
    }

    #[test]
    fn test_batch_preserves_order() {
        let batch: Vec<(i64, i64, i64)> = vec![(5, 5, 6), (0, 1, 2), (3, 3, 9)];
        let records = validate_batch(batch).unwrap();
        let arrivals: Vec<u64> = records.iter().map(|r| r.arrival_time_ns()).collect();
        assert_eq!(arrivals, vec![5, 0, 3]);
    }

    #[test]
    fn test_request_kind_serde() {
        let kind: RequestKind = serde_json::from_str("\"PUT\"").unwrap();
        assert_eq!(kind, RequestKind::Put);
        assert_eq!(RequestKind::Get.to_string(), "GET");
    }
}
