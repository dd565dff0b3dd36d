//! CLI argument definitions using clap derive

use crate::domain::DomainValue;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Precompute and serve results of functions over finite input domains
///
/// The `about` text comes from the package description; keep both in sync.
#[derive(Parser, Debug)]
#[command(name = "precache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PRECACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show functions in the store and their entry counts
    Status,

    /// List the cached entries of one function
    Show(ShowArgs),

    /// Look up one precomputed result
    Get(GetArgs),

    /// Drop cached entries so the next run recomputes them
    Forget(ForgetArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Function name
    pub function: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Function name
    pub function: String,

    /// Arguments as NAME=VALUE (VALUE is a JSON literal or bare text)
    #[arg(value_parser = parse_assignment, required = true)]
    pub args: Vec<(String, DomainValue)>,
}

/// Arguments for the forget command
#[derive(Parser, Debug)]
pub struct ForgetArgs {
    /// Function name
    pub function: String,

    /// Forget only this entry (NAME=VALUE for every parameter)
    #[arg(value_parser = parse_assignment)]
    pub args: Vec<(String, DomainValue)>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for show command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Keys only, one per line
    Plain,
}

/// Parse an argument in NAME=VALUE format
fn parse_assignment(s: &str) -> Result<(String, DomainValue), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid NAME=VALUE format: no '=' found in '{s}'"))?;
    let name = &s[..pos];
    if name.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    Ok((name.to_string(), DomainValue::parse_lenient(&s[pos + 1..])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_assignment_typed() {
        let (k, v) = parse_assignment("store=101").unwrap();
        assert_eq!(k, "store");
        assert_eq!(v, DomainValue::Int(101));

        let (_, v) = parse_assignment("store=\"101\"").unwrap();
        assert_eq!(v, DomainValue::Str("101".into()));
    }

    #[test]
    fn parse_assignment_with_equals() {
        let (k, v) = parse_assignment("expr=a=b").unwrap();
        assert_eq!(k, "expr");
        assert_eq!(v, DomainValue::Str("a=b".into()));
    }

    #[test]
    fn parse_assignment_invalid() {
        assert!(parse_assignment("region").is_err());
        assert!(parse_assignment("=APAC").is_err());
    }

    #[test]
    fn cli_parses_status() {
        let cli = Cli::parse_from(["precache", "status"]);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn cli_parses_get() {
        let cli = Cli::parse_from(["precache", "get", "sales", "region=APAC", "store=101"]);
        match cli.command {
            Commands::Get(args) => {
                assert_eq!(args.function, "sales");
                assert_eq!(args.args.len(), 2);
                assert_eq!(args.args[0].1, DomainValue::Str("APAC".into()));
            }
            _ => panic!("expected Get command"),
        }
    }

    #[test]
    fn cli_get_requires_args() {
        assert!(Cli::try_parse_from(["precache", "get", "sales"]).is_err());
    }

    #[test]
    fn cli_parses_forget_all() {
        let cli = Cli::parse_from(["precache", "forget", "sales", "--yes"]);
        match cli.command {
            Commands::Forget(args) => {
                assert!(args.yes);
                assert!(args.args.is_empty());
            }
            _ => panic!("expected Forget command"),
        }
    }

    #[test]
    fn cli_parses_show_format() {
        let cli = Cli::parse_from(["precache", "show", "sales", "--format", "json"]);
        match cli.command {
            Commands::Show(args) => assert!(matches!(args.format, OutputFormat::Json)),
            _ => panic!("expected Show command"),
        }
    }

    #[test]
    fn cli_parses_config_init() {
        let cli = Cli::parse_from(["precache", "config", "init", "--force"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force }),
            }) => assert!(force),
            _ => panic!("expected Config Init command"),
        }
    }

    #[test]
    fn cli_verbose_count() {
        let cli = Cli::parse_from(["precache", "-vv", "status"]);
        assert_eq!(cli.verbose, 2);
    }
}
