//! Registered functions awaiting precomputation

use crate::domain::ParameterSpec;
use crate::error::{PrecacheError, PrecacheResult};
use crate::front::SnapshotCell;
use crate::target::TargetFunction;
use std::sync::Arc;

/// One registered function with its resolved domain
pub(crate) struct Registration {
    pub function: String,
    pub specs: Arc<[ParameterSpec]>,
    pub target: Arc<dyn TargetFunction>,
    pub snapshot: Arc<SnapshotCell>,
}

/// Functions known to one engine, in registration order
#[derive(Default)]
pub struct Catalog {
    entries: Vec<Registration>,
}

impl Catalog {
    pub(crate) fn insert(&mut self, registration: Registration) -> PrecacheResult<()> {
        if self.contains(&registration.function) {
            return Err(PrecacheError::DuplicateFunction(registration.function));
        }
        self.entries.push(registration);
        Ok(())
    }

    pub fn contains(&self, function: &str) -> bool {
        self.entries.iter().any(|r| r.function == function)
    }

    /// Registered function names in registration order
    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|r| r.function.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.functions()).finish()
    }
}
