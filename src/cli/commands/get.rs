//! Get command - look up one precomputed result

use super::{check_unique, open_store};
use crate::cli::args::GetArgs;
use crate::config::Config;
use crate::error::{PrecacheError, PrecacheResult};
use crate::key;
use tracing::debug;

/// Execute the get command
///
/// The key is derived exactly as a live lookup would derive it, so
/// argument order on the command line does not matter.
pub async fn execute(args: GetArgs, config: &Config) -> PrecacheResult<()> {
    check_unique(&args.function, &args.args)?;
    let key = key::encode_pairs(&args.function, &args.args);
    debug!("Looking up {}", key);

    let store = open_store(config).load(&args.function).await?;
    let value = store.get(&key).ok_or_else(|| PrecacheError::CacheMiss {
        function: args.function.clone(),
        key: key.to_string(),
    })?;

    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
