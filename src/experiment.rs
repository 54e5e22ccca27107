//! # Experiment Identity and Runs
//!
//! An experiment run is one completed simulation: every request record it
//! produced, tagged with the scheduler that served it and the value of the
//! independent variable being swept.
//!
//! Identities arrive from the loader as plain tokens ([`RawIdentity`]) and are
//! parsed into the strongly typed [`ExperimentId`]. Unknown tokens and
//! structurally inconsistent identities are rejected here, before any record
//! is looked at, so a mislabelled run can never end up silently merged into
//! the wrong series.

use crate::error::{AnalysisError, Result};
use crate::record::{validate_batch, RawRecord, RequestRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scheduling policy that produced a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheduler {
    /// First-come-first-served
    Fcfs,
    /// Shortest job first
    Sjf,
    /// Round robin with a time quantum
    #[serde(rename = "rr")]
    RoundRobin,
}

impl Scheduler {
    /// Short lowercase token, as used in identities and file names.
    pub fn token(&self) -> &'static str {
        match self {
            Scheduler::Fcfs => "fcfs",
            Scheduler::Sjf => "sjf",
            Scheduler::RoundRobin => "rr",
        }
    }
}

impl fmt::Display for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheduler::Fcfs => write!(f, "FCFS"),
            Scheduler::Sjf => write!(f, "SJF"),
            Scheduler::RoundRobin => write!(f, "RR"),
        }
    }
}

impl FromStr for Scheduler {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fcfs" => Ok(Scheduler::Fcfs),
            "sjf" => Ok(Scheduler::Sjf),
            "rr" => Ok(Scheduler::RoundRobin),
            _ => Err(AnalysisError::UnknownScheduler(s.to_string())),
        }
    }
}

/// Independent variable swept across the runs of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Reference configuration; carries no swept value.
    Baseline,
    Clients,
    Servers,
    PacketSize,
    Quantum,
}

impl Dimension {
    pub fn token(&self) -> &'static str {
        match self {
            Dimension::Baseline => "baseline",
            Dimension::Clients => "clients",
            Dimension::Servers => "servers",
            Dimension::PacketSize => "packet_size",
            Dimension::Quantum => "quantum",
        }
    }

    /// Axis label for the swept value.
    pub fn axis_label(&self) -> &'static str {
        match self {
            Dimension::Baseline => "Policy",
            Dimension::Clients => "Clients",
            Dimension::Servers => "Servers",
            Dimension::PacketSize => "Packet Size",
            Dimension::Quantum => "Quantum",
        }
    }

    /// Whether runs along this dimension have a parallelism baseline.
    pub fn has_scaling(&self) -> bool {
        matches!(self, Dimension::Servers)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Dimension {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(Dimension::Baseline),
            "clients" => Ok(Dimension::Clients),
            "servers" => Ok(Dimension::Servers),
            "packet_size" => Ok(Dimension::PacketSize),
            "quantum" => Ok(Dimension::Quantum),
            _ => Err(AnalysisError::UnknownDimension(s.to_string())),
        }
    }
}

/// Identity as handed over by a loader, before any token is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIdentity {
    pub scheduler: String,
    pub dimension: String,
    pub dimension_value: Option<u64>,
    /// Round-robin quantum; only valid on baseline RR runs.
    #[serde(default)]
    pub quantum: Option<u64>,
}

impl RawIdentity {
    pub fn new(scheduler: &str, dimension: &str, dimension_value: Option<u64>) -> Self {
        Self {
            scheduler: scheduler.to_string(),
            dimension: dimension.to_string(),
            dimension_value,
            quantum: None,
        }
    }

    pub fn with_quantum(mut self, quantum: u64) -> Self {
        self.quantum = Some(quantum);
        self
    }

    /// Parse and check the tokens.
    pub fn parse(&self) -> Result<ExperimentId> {
        let scheduler: Scheduler = self.scheduler.parse()?;
        let dimension: Dimension = self.dimension.parse()?;
        ExperimentId::new(scheduler, dimension, self.dimension_value, self.quantum)
    }
}

impl fmt::Display for RawIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheduler, self.dimension)?;
        if let Some(value) = self.dimension_value {
            write!(f, ":{}", value)?;
        }
        if let Some(quantum) = self.quantum {
            write!(f, ":q{}", quantum)?;
        }
        Ok(())
    }
}

/// Validated identity of one experiment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExperimentId {
    scheduler: Scheduler,
    dimension: Dimension,
    dimension_value: Option<u64>,
    quantum: Option<u64>,
}

impl ExperimentId {
    /// Build an identity, enforcing that:
    /// - `baseline` has no value and every other dimension has one
    /// - a quantum is only given for round robin, and only on a baseline run
    /// - the `quantum` dimension is only swept for round robin
    pub fn new(
        scheduler: Scheduler,
        dimension: Dimension,
        dimension_value: Option<u64>,
        quantum: Option<u64>,
    ) -> Result<Self> {
        match (dimension, dimension_value) {
            (Dimension::Baseline, Some(value)) => {
                return Err(AnalysisError::InvalidIdentity(format!(
                    "baseline run for {} must not carry a dimension value (got {})",
                    scheduler, value
                )))
            }
            (Dimension::Baseline, None) | (_, Some(_)) => {}
            (other, None) => {
                return Err(AnalysisError::InvalidIdentity(format!(
                    "{} run for {} is missing its dimension value",
                    other, scheduler
                )))
            }
        }

        if let Some(q) = quantum.filter(|_| dimension != Dimension::Baseline) {
            return Err(AnalysisError::InvalidIdentity(format!(
                "quantum q{} is only allowed on a baseline run, got {} {}",
                q, scheduler, dimension
            )));
        }

        if scheduler != Scheduler::RoundRobin {
            if quantum.is_some() {
                return Err(AnalysisError::InvalidIdentity(format!(
                    "quantum given for non round-robin scheduler {}",
                    scheduler
                )));
            }
            if dimension == Dimension::Quantum {
                return Err(AnalysisError::InvalidIdentity(format!(
                    "quantum sweep requires the RR scheduler, got {}",
                    scheduler
                )));
            }
        }

        Ok(Self {
            scheduler,
            dimension,
            dimension_value,
            quantum,
        })
    }

    /// Convenience constructor for a swept-dimension run.
    pub fn swept(scheduler: Scheduler, dimension: Dimension, value: u64) -> Result<Self> {
        Self::new(scheduler, dimension, Some(value), None)
    }

    /// Convenience constructor for a baseline run.
    pub fn baseline(scheduler: Scheduler, quantum: Option<u64>) -> Result<Self> {
        Self::new(scheduler, Dimension::Baseline, None, quantum)
    }

    pub fn scheduler(&self) -> Scheduler {
        self.scheduler
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn dimension_value(&self) -> Option<u64> {
        self.dimension_value
    }

    pub fn quantum(&self) -> Option<u64> {
        self.quantum
    }

    /// Human-readable policy label, e.g. `FCFS` or `RR (Q=5)`.
    pub fn policy_label(&self) -> String {
        match self.quantum {
            Some(q) => format!("{} (Q={})", self.scheduler, q),
            None => self.scheduler.to_string(),
        }
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheduler.token(), self.dimension)?;
        if let Some(value) = self.dimension_value {
            write!(f, ":{}", value)?;
        }
        if let Some(quantum) = self.quantum {
            write!(f, ":q{}", quantum)?;
        }
        Ok(())
    }
}

/// One completed simulation: an identity and its validated records.
///
/// Constructed once from a finite batch and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentRun {
    id: ExperimentId,
    records: Vec<RequestRecord>,
}

impl ExperimentRun {
    pub fn new(id: ExperimentId, records: Vec<RequestRecord>) -> Self {
        Self { id, records }
    }

    /// Validate a raw batch and wrap it into a run.
    pub fn from_raw<I>(id: ExperimentId, raw: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<RawRecord>,
    {
        Ok(Self::new(id, validate_batch(raw)?))
    }

    pub fn id(&self) -> &ExperimentId {
        &self.id
    }

    pub fn records(&self) -> &[RequestRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
