//! Command-line argument definitions.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Long options that are also accepted with a single dash (`-es URL`).
const SINGLE_DASH_LONG: &[&str] = &[
    "es", "index", "schema", "shards", "replicas", "auth", "dd", "file",
];

/// Long options followed by a separate value token.
const VALUE_OPTIONS: &[&str] = &[
    "es", "index", "schema", "shards", "replicas", "auth", "dd", "file", "config", "dd-schema",
    "fallback-type",
];

/// Registry manager - maintains registry indices and their Field Registry
#[derive(Parser, Debug)]
#[command(name = "registry-manager", version)]
#[command(about = "Registry index and Field Registry management", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = "REGMGR_CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the registry index and its Field Registry index
    CreateRegistry(CreateRegistryArgs),
    /// Load a data dictionary into the Field Registry
    LoadDd(LoadDdArgs),
    /// Load documents from a bulk-format NDJSON file
    LoadData(LoadDataArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Connection options shared by every engine command. Values given here
/// override the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Search engine URL, e.g. http://localhost:9200
    #[arg(long = "es", value_name = "URL")]
    pub url: Option<String>,

    /// Registry index name
    #[arg(long, value_name = "NAME", allow_hyphen_values = true)]
    pub index: Option<String>,

    /// Authentication file
    #[arg(long, value_name = "FILE")]
    pub auth: Option<String>,
}

/// `create-registry` options.
#[derive(Args, Debug, Clone)]
pub struct CreateRegistryArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Registry index schema; the built-in template when omitted
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Field Registry index schema; the built-in template when omitted
    #[arg(long, value_name = "FILE")]
    pub dd_schema: Option<PathBuf>,

    /// Number of primary shards
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub shards: i64,

    /// Number of replicas
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub replicas: i64,
}

/// `load-dd` options.
#[derive(Args, Debug, Clone)]
pub struct LoadDdArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Data dictionary JSON file
    #[arg(long = "dd", value_name = "FILE")]
    pub dictionary: PathBuf,
}

/// `load-data` options.
#[derive(Args, Debug, Clone)]
pub struct LoadDataArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Bulk-format NDJSON file
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,

    /// Type for fields unknown to the Field Registry (engine or logical type)
    #[arg(long, value_name = "TYPE")]
    pub fallback_type: Option<String>,

    /// Save fallback types to the Field Registry
    #[arg(long, requires = "fallback_type")]
    pub persist_fallback: bool,
}

/// `config` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Print a value by dotted key, e.g. `engine.url`
    Get {
        /// Dotted key
        key: String,
    },
    /// Write a config file with default values
    Init {
        /// Target file; the default location when omitted
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Rewrite single-dash long options (`-es`, `-index=x`) to their double-dash
/// form so clap can parse them.
///
/// Only tokens in option position are rewritten: the value after a
/// value-taking option (`-index -es`) is passed through unchanged.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut value_next = false;
    let mut normalized = Vec::new();
    for arg in args.into_iter().map(Into::into) {
        if std::mem::take(&mut value_next) {
            normalized.push(arg);
            continue;
        }

        let (promote, takes_value) = match arg.to_str() {
            Some(s) => match s.strip_prefix("--") {
                Some(long) => (false, VALUE_OPTIONS.contains(&long)),
                None => match s.strip_prefix('-') {
                    Some(rest) if SINGLE_DASH_LONG.contains(&rest) => (true, true),
                    Some(rest) => {
                        let inline = rest
                            .split_once('=')
                            .is_some_and(|(name, _)| SINGLE_DASH_LONG.contains(&name));
                        (inline, false)
                    }
                    None => (false, false),
                },
            },
            None => (false, false),
        };
        value_next = takes_value;

        if promote {
            let mut long = OsString::from("-");
            long.push(&arg);
            normalized.push(long);
        } else {
            normalized.push(arg);
        }
    }
    normalized
}

// ============================================================================
// Tests
// ============================================================================
