//! CLI command implementations

pub mod config;
pub mod forget;
pub mod get;
pub mod show;
pub mod status;

pub use config::execute as config;
pub use forget::execute as forget;
pub use get::execute as get;
pub use show::execute as show;
pub use status::execute as status;

use crate::config::{Config, ConfigManager};
use crate::domain::DomainValue;
use crate::error::{PrecacheError, PrecacheResult};
use crate::store::PersistentStore;
use std::collections::HashSet;

/// Open the store the configuration points at
fn open_store(config: &Config) -> PersistentStore {
    PersistentStore::new(ConfigManager::store_path(config))
}

/// Reject a parameter given twice on the command line
fn check_unique(function: &str, args: &[(String, DomainValue)]) -> PrecacheResult<()> {
    let mut seen = HashSet::new();
    match args.iter().find(|(name, _)| !seen.insert(name.as_str())) {
        Some((name, _)) => Err(PrecacheError::InvalidArguments {
            function: function.to_string(),
            reason: format!("parameter {} given twice", name),
        }),
        None => Ok(()),
    }
}
