//! Step lines printed by the store maintenance commands

use super::context::UiContext;
use console::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Ok,
    Info,
    Warn,
}

impl Level {
    fn tag(self) -> console::StyledObject<&'static str> {
        match self {
            Level::Ok => style("[OK]").green(),
            Level::Info => style("[INFO]").cyan(),
            Level::Warn => style("[WARN]").yellow(),
        }
    }
}

/// Message with an optional trailing note, e.g. the key that was forgotten
fn compose(message: &str, detail: Option<(&str, &str)>, dim: bool) -> String {
    match detail {
        None => message.to_string(),
        Some((open, text)) => {
            let close = if open == "(" { ")" } else { "" };
            if dim {
                format!("{message} {open}{}{close}", style(text).dim())
            } else {
                format!("{message} {open}{text}{close}")
            }
        }
    }
}

fn emit(ctx: &UiContext, level: Level, message: &str, detail: Option<(&str, &str)>) {
    if ctx.use_fancy_output() {
        let line = compose(message, detail, true);
        let shown = match level {
            Level::Ok => cliclack::log::success(line),
            Level::Info => cliclack::log::info(line),
            Level::Warn => cliclack::log::warning(line),
        };
        // Terminal write failures are not worth failing a command over
        shown.ok();
    } else {
        println!("  {} {}", level.tag(), compose(message, detail, false));
    }
}

/// Report a completed store change
pub fn step_ok(ctx: &UiContext, message: &str) {
    emit(ctx, Level::Ok, message, None);
}

/// Report a completed store change along with what it touched
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    emit(ctx, Level::Ok, message, Some(("(", detail)));
}

/// Report a skipped action and how to make it happen
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    emit(ctx, Level::Warn, message, Some(("- ", hint)));
}

pub fn step_info(ctx: &UiContext, message: &str) {
    emit(ctx, Level::Info, message, None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_plain_detail_and_hint() {
        assert_eq!(compose("Nothing removed", None, false), "Nothing removed");
        assert_eq!(
            compose("Forgot entry", Some(("(", "sales::{\"store\":1}")), false),
            "Forgot entry (sales::{\"store\":1})"
        );
        assert_eq!(
            compose("Nothing removed", Some(("- ", "Use --yes")), false),
            "Nothing removed - Use --yes"
        );
    }
}
