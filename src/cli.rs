use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Render text templates and try out tag filter chains
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true, env = "TAGFILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Expand every tag in a template
    Render {
        /// Template text
        #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
        template: Option<String>,

        /// Read the template from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// JSON or JSON5 file with the values tags resolve against
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Set a value, `key=value`; dotted keys nest
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Named template for include tags, `name=path`
        #[arg(long = "include", value_name = "NAME=PATH")]
        include: Vec<String>,
    },
    /// Show how a tag reference is parsed
    Parse {
        /// Tag text, with or without braces
        tag: String,
    },
    /// Apply a filter chain to a literal input
    Filter {
        /// Filter chain, e.g. "trim|upper"
        #[arg(short, long)]
        chain: String,

        /// Input value; omitted means null
        #[arg(short, long)]
        input: Option<String>,
    },
    /// List the stock filter names
    Filters,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
