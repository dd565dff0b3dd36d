//! Run phases and summaries

use crate::error::{PrecacheError, PrecacheResult};
use crate::key::CacheKey;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Progress of one function through a precomputation run
///
/// ```text
/// NotStarted -> Loading -> Enumerating -> Computing* -> Done
/// ```
///
/// `Computing` repeats once per pending combination and is skipped
/// entirely when everything is cached. There are no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Loading,
    Enumerating,
    Computing,
    Done,
}

impl Phase {
    /// Move to `next`, rejecting transitions the run never makes
    pub fn advance(self, next: Phase) -> PrecacheResult<Phase> {
        use Phase::*;
        match (self, next) {
            (NotStarted, Loading)
            | (Loading, Enumerating)
            | (Enumerating, Computing)
            | (Enumerating, Done)
            | (Computing, Computing)
            | (Computing, Done) => Ok(next),
            _ => Err(PrecacheError::Internal(format!(
                "invalid phase transition {} -> {}",
                self, next
            ))),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not-started",
            Self::Loading => "loading",
            Self::Enumerating => "enumerating",
            Self::Computing => "computing",
            Self::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// How a function's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every combination was already cached; nothing ran
    FullyCached,
    /// At least one combination was attempted
    Computed,
    /// Disabled in configuration; not touched
    Disabled,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullyCached => write!(f, "fully cached"),
            Self::Computed => write!(f, "computed"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// One combination that failed during a run
#[derive(Debug)]
pub struct ComputationFailure {
    pub key: CacheKey,
    pub error: PrecacheError,
}

/// Counts for one function
#[derive(Debug)]
pub struct FunctionSummary {
    pub function: String,
    /// Size of the full combination space
    pub total: usize,
    /// Newly computed and persisted
    pub computed: usize,
    /// Already cached before the run
    pub skipped: usize,
    /// Attempted and failed; left uncached
    pub failed: usize,
    pub failures: Vec<ComputationFailure>,
    pub outcome: RunOutcome,
}

impl FunctionSummary {
    pub(crate) fn disabled(function: &str) -> Self {
        Self {
            function: function.to_string(),
            total: 0,
            computed: 0,
            skipped: 0,
            failed: 0,
            failures: Vec::new(),
            outcome: RunOutcome::Disabled,
        }
    }

    /// Whether every combination is now cached
    pub fn is_complete(&self) -> bool {
        self.outcome != RunOutcome::Disabled && self.computed + self.skipped == self.total
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "function": self.function,
            "outcome": self.outcome.to_string(),
            "total": self.total,
            "computed": self.computed,
            "skipped": self.skipped,
            "failed": self.failed,
        })
    }
}

/// Result of [`Precomputer::run`](crate::Precomputer::run)
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub functions: Vec<FunctionSummary>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Summary for one function
    pub fn function(&self, name: &str) -> Option<&FunctionSummary> {
        self.functions.iter().find(|f| f.function == name)
    }

    pub fn computed(&self) -> usize {
        self.functions.iter().map(|f| f.computed).sum()
    }

    pub fn skipped(&self) -> usize {
        self.functions.iter().map(|f| f.skipped).sum()
    }

    pub fn failed(&self) -> usize {
        self.functions.iter().map(|f| f.failed).sum()
    }
}
