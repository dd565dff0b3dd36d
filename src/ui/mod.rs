//! Terminal output for operator commands
//!
//! Uses `cliclack` log lines in interactive terminals and falls back to
//! plain bracketed output in CI or when piped.

mod context;
mod output;
mod prompts;

pub use context::UiContext;
pub use output::{step_info, step_ok, step_ok_detail, step_warn_hint};
pub use prompts::confirm;
