//! Forget command - drop cached entries so the next run recomputes them

use super::{check_unique, open_store};
use crate::cli::args::ForgetArgs;
use crate::config::Config;
use crate::error::{PrecacheError, PrecacheResult};
use crate::key;
use crate::ui::{self, UiContext};

/// Execute the forget command
pub async fn execute(args: ForgetArgs, config: &Config) -> PrecacheResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let store = open_store(config);

    if args.args.is_empty() {
        let count = store.load(&args.function).await?.len();
        if count == 0 {
            ui::step_info(&ctx, &format!("No cached entries for {}", args.function));
            return Ok(());
        }

        let prompt = format!("Forget all {} entries of {}?", count, args.function);
        if !ui::confirm(&ctx, &prompt, false).await? {
            ui::step_warn_hint(&ctx, "Nothing removed", "Use --yes to skip confirmation");
            return Ok(());
        }

        let removed = store.clear(&args.function).await?;
        ui::step_ok(
            &ctx,
            &format!("Forgot {} entries of {}", removed, args.function),
        );
        return Ok(());
    }

    check_unique(&args.function, &args.args)?;
    let key = key::encode_pairs(&args.function, &args.args);
    match store.remove(&args.function, std::slice::from_ref(&key)).await? {
        0 => Err(PrecacheError::CacheMiss {
            function: args.function,
            key: key.into_string(),
        }),
        _ => {
            ui::step_ok_detail(&ctx, "Forgot entry", key.as_str());
            Ok(())
        }
    }
}
