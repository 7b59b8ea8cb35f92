//! Rollbar CLI - read and triage Rollbar errors from the terminal
//!
//! Usage:
//!   rollbar items                 List active items
//!   rollbar item <counter>        Show one item
//!   rollbar context <counter>     Bug report for an item and its recent occurrences
//!   rollbar occurrences --item N  List occurrences of an item
//!   rollbar resolve <counter>...  Mark items as resolved
//!   rollbar whoami                Check the access token
//!   rollbar completion <shell>    Print a shell completion script

mod commands;
mod time;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use commands::App;
use rollbar_core::{ColorMode, Config, ConfigEnv};
use rollbar_output::Format;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rollbar")]
#[command(author, version, about = "CLI for Rollbar error tracking")]
#[command(long_about = "Read, list and manage Rollbar items and occurrences.\n\n\
Use 'rollbar items' to list errors, 'rollbar item <counter>' for details,\n\
'rollbar context <counter>' for a bug report ready to hand to an agent, and\n\
'rollbar resolve <counter>' to mark items as resolved.")]
struct Cli {
    /// Config file (default: nearest .rollbar.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format: table, json, compact, markdown
    #[arg(short, long, global = true, value_name = "FORMAT")]
    output: Option<String>,

    /// Shorthand for --output compact --no-color
    #[arg(long, global = true)]
    ai: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List items (errors)
    Items(ItemsArgs),

    /// Show a single item by counter or internal id
    Item {
        /// Project counter (the `123` in `#123`)
        #[arg(required_unless_present = "uuid", conflicts_with = "uuid")]
        counter: Option<i64>,

        /// Look the item up by internal id instead
        #[arg(long, value_name = "ID")]
        uuid: Option<i64>,

        /// Include N recent occurrences
        #[arg(long, default_value = "0")]
        occurrences: usize,

        /// Render the full context report
        #[arg(long)]
        context: bool,
    },

    /// List occurrences (instances)
    Occurrences {
        /// Counter of the item to list occurrences for
        #[arg(long, value_name = "COUNTER")]
        item: Option<i64>,

        /// List occurrences across the project
        #[arg(long)]
        all: bool,

        /// Only occurrences since (e.g. '24h', '8 hours ago')
        #[arg(long)]
        since: Option<String>,

        /// Limit number of results (0 = no limit)
        #[arg(long, default_value = "0")]
        limit: usize,

        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Show a single occurrence
    Occurrence {
        /// Occurrence id
        id: i64,
    },

    /// Generate a bug report for an item
    Context {
        /// Project counter
        counter: i64,

        /// Number of recent occurrences to include
        #[arg(long, default_value = "3")]
        occurrences: usize,

        /// Write to a file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Verify the access token and show its project
    Whoami,

    /// Mark items as resolved (needs a write-scoped token)
    Resolve {
        /// Project counters
        #[arg(required_unless_present = "uuid", conflicts_with = "uuid")]
        counters: Vec<String>,

        /// Resolve by internal id instead
        #[arg(long, value_name = "ID")]
        uuid: Option<i64>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Create a .rollbar.toml in the current directory
    Init,

    /// Print a shell completion script (bash, zsh, fish, powershell, elvish)
    Completion {
        /// Target shell
        shell: Shell,
    },

    /// Show version and build information
    Version,
}

/// Filters for `rollbar items`
#[derive(Args)]
pub struct ItemsArgs {
    /// Status filter: active, resolved, muted, any
    #[arg(long, default_value = "active")]
    status: String,

    /// Level filter, comma-separated (debug, info, warning, error, critical)
    #[arg(long)]
    level: Option<String>,

    /// Environment filter (default: configured default_environment)
    #[arg(long)]
    env: Option<String>,

    /// Text search in item titles
    #[arg(long)]
    query: Option<String>,

    /// Items seen since (e.g. '24h', '8 hours ago', '7 days')
    #[arg(long)]
    since: Option<String>,

    /// Items seen from datetime (ISO 8601)
    #[arg(long)]
    from: Option<String>,

    /// Items seen until datetime (ISO 8601)
    #[arg(long)]
    to: Option<String>,

    /// Sort by: recent, occurrences, first-seen, level
    #[arg(long, default_value = "recent")]
    sort: String,

    /// Page number
    #[arg(long, default_value = "1")]
    page: u32,

    /// Limit number of results (0 = no limit)
    #[arg(long, default_value = "0")]
    limit: usize,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Set a value in the local config file
    Set {
        /// access_token, project_id, default_environment, output.format, output.color
        key: String,

        value: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries rendered output only
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Neither command needs a token or a config file
    match cli.command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "rollbar", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Version => {
            println!("{}", version_info());
            return Ok(());
        }
        _ => {}
    }

    let env = ConfigEnv::from_process()?;
    let config = Config::load(cli.config.as_deref(), &env)?;

    let color = use_color(
        cli.no_color || cli.ai,
        config.output.color,
        std::io::stdout().is_terminal(),
    );
    colored::control::set_override(color);

    let app = App {
        format: select_format(cli.ai, cli.output.as_deref(), &config.output.format),
        color,
        quiet: cli.quiet,
        config,
        env,
        config_path: cli.config,
    };

    match cli.command {
        Commands::Items(args) => commands::items(&app, args).await,
        Commands::Item {
            counter,
            uuid,
            occurrences,
            context,
        } => commands::item(&app, counter, uuid, occurrences, context).await,
        Commands::Occurrences {
            item,
            all,
            since,
            limit,
            page,
        } => commands::occurrences(&app, item, all, since, limit, page).await,
        Commands::Occurrence { id } => commands::occurrence(&app, id).await,
        Commands::Context {
            counter,
            occurrences,
            out,
        } => commands::context(&app, counter, occurrences, out).await,
        Commands::Whoami => commands::whoami(&app).await,
        Commands::Resolve { counters, uuid } => commands::resolve(&app, counters, uuid).await,
        Commands::Config { action } => match action {
            ConfigCommands::Show => commands::config_show(&app),
            ConfigCommands::Set { key, value } => commands::config_set(&app, &key, &value),
        },
        Commands::Init => commands::init(&app),
        Commands::Completion { .. } | Commands::Version => Ok(()),
    }
}

fn version_info() -> String {
    format!(
        "rollbar {} ({}-{})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Color needs no opt-out flag, a non-`never` setting, and `always` or a terminal
fn use_color(disabled: bool, mode: ColorMode, is_terminal: bool) -> bool {
    if disabled {
        return false;
    }
    match mode {
        ColorMode::Never => false,
        ColorMode::Always => true,
        ColorMode::Auto => is_terminal,
    }
}

/// `--ai` wins, then `--output`, then the configured format
fn select_format(ai: bool, output: Option<&str>, configured: &str) -> Format {
    if ai {
        return Format::Compact;
    }
    Format::parse_lenient(output.unwrap_or(configured))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_use_color() {
        assert!(use_color(false, ColorMode::Auto, true));
        assert!(!use_color(false, ColorMode::Auto, false));
        assert!(use_color(false, ColorMode::Always, false));
        assert!(!use_color(false, ColorMode::Never, true));
        assert!(!use_color(true, ColorMode::Always, true));
    }

    #[test]
    fn test_select_format() {
        assert_eq!(select_format(false, None, "table"), Format::Table);
        assert_eq!(select_format(false, None, "markdown"), Format::Markdown);
        assert_eq!(select_format(false, Some("json"), "markdown"), Format::Json);
        assert_eq!(select_format(false, Some("yaml"), "json"), Format::Table);
        assert_eq!(select_format(true, Some("json"), "table"), Format::Compact);
    }

    #[test]
    fn test_parse_items_flags() {
        let cli = Cli::try_parse_from([
            "rollbar", "items", "--level", "error,critical", "--sort", "occurrences", "--ai",
        ])
        .unwrap();
        assert!(cli.ai);
        match cli.command {
            Commands::Items(args) => {
                assert_eq!(args.status, "active");
                assert_eq!(args.level.as_deref(), Some("error,critical"));
                assert_eq!(args.sort, "occurrences");
                assert_eq!(args.page, 1);
                assert_eq!(args.limit, 0);
            }
            _ => panic!("expected items command"),
        }
    }

    #[test]
    fn test_item_requires_counter_or_uuid() {
        assert!(Cli::try_parse_from(["rollbar", "item"]).is_err());
        assert!(Cli::try_parse_from(["rollbar", "item", "12", "--uuid", "99"]).is_err());

        let cli = Cli::try_parse_from(["rollbar", "item", "--uuid", "99", "--context"]).unwrap();
        match cli.command {
            Commands::Item {
                counter,
                uuid,
                context,
                ..
            } => {
                assert_eq!(counter, None);
                assert_eq!(uuid, Some(99));
                assert!(context);
            }
            _ => panic!("expected item command"),
        }
    }

    #[test]
    fn test_resolve_arguments() {
        assert!(Cli::try_parse_from(["rollbar", "resolve"]).is_err());
        assert!(Cli::try_parse_from(["rollbar", "resolve", "1", "--uuid", "5"]).is_err());

        let cli = Cli::try_parse_from(["rollbar", "resolve", "1", "2", "x"]).unwrap();
        match cli.command {
            Commands::Resolve { counters, uuid } => {
                assert_eq!(counters, vec!["1", "2", "x"]);
                assert_eq!(uuid, None);
            }
            _ => panic!("expected resolve command"),
        }
    }

    #[test]
    fn test_context_defaults() {
        let cli = Cli::try_parse_from(["rollbar", "-q", "context", "42"]).unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Context {
                counter,
                occurrences,
                out,
            } => {
                assert_eq!(counter, 42);
                assert_eq!(occurrences, 3);
                assert_eq!(out, None);
            }
            _ => panic!("expected context command"),
        }
    }

    #[test]
    fn test_completion_needs_known_shell() {
        let cli = Cli::try_parse_from(["rollbar", "completion", "zsh"]).unwrap();
        match cli.command {
            Commands::Completion { shell } => assert_eq!(shell, Shell::Zsh),
            _ => panic!("expected completion command"),
        }
        assert!(Cli::try_parse_from(["rollbar", "completion"]).is_err());
        assert!(Cli::try_parse_from(["rollbar", "completion", "tcsh"]).is_err());
    }

    #[test]
    fn test_completion_script_names_subcommands() {
        let mut out = Vec::new();
        clap_complete::generate(Shell::Bash, &mut Cli::command(), "rollbar", &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("rollbar"));
        assert!(script.contains("occurrences"));
        assert!(script.contains("resolve"));
    }

    #[test]
    fn test_version_info() {
        assert!(matches!(
            Cli::try_parse_from(["rollbar", "version"]).unwrap().command,
            Commands::Version
        ));
        let info = version_info();
        assert!(info.starts_with(&format!("rollbar {}", env!("CARGO_PKG_VERSION"))));
        assert!(info.contains(std::env::consts::OS));
        assert!(info.contains(std::env::consts::ARCH));
    }
}
