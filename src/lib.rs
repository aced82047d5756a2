pub mod cli;
pub mod config;
pub mod engine;
pub mod expression;
pub mod filter;
pub mod resolver;
pub mod value;

use anyhow::{Context, anyhow};
use log::LevelFilter;
use std::fs;
use std::path::Path;

pub use cli::{Commands, cli_parse};
pub use config::{ConfigError, EngineConfig, load_config, load_config_from_path};
pub use engine::Engine;
pub use expression::{TagExpression, parse_tag_expression};
pub use filter::{CustomFilter, FilterContext, FilterError, FilterRegistry};
pub use resolver::{MapResolver, Resolver};
pub use value::Value;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG, when set, overrides the flag.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn load_data(path: &Path) -> anyhow::Result<MapResolver> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file '{}'", path.display()))?;
    let json: serde_json::Value = json5::from_str(&raw)
        .with_context(|| format!("Failed to parse data file '{}'", path.display()))?;
    Ok(MapResolver::from_json(json))
}

fn split_pair<'a>(pair: &'a str, flag: &str) -> anyhow::Result<(&'a str, &'a str)> {
    pair.split_once('=')
        .ok_or_else(|| anyhow!("--{flag} expects key=value, got '{pair}'"))
}

/// Tag text as typed on the command line: braces and sigil are optional.
fn tag_body(tag: &str) -> &str {
    let tag = tag.trim();
    let tag = tag
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(tag);
    tag.strip_prefix(['~', '$']).unwrap_or(tag)
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(path) = &cli.config {
        log::info!("loaded config from {}", path.display());
    }
    let engine = Engine::with_config(config);

    match &cli.command {
        Commands::Render {
            template,
            file,
            data,
            set,
            include,
        } => {
            let text = match (template, file) {
                (Some(text), _) => text.clone(),
                (None, Some(path)) => fs::read_to_string(path)
                    .with_context(|| format!("Failed to read template '{}'", path.display()))?,
                (None, None) => return Err(anyhow!("either --template or --file is required")),
            };

            let mut resolver = match data {
                Some(path) => load_data(path)?,
                None => MapResolver::new(),
            };
            for pair in set {
                let (key, value) = split_pair(pair, "set")?;
                resolver.set(key, value);
            }
            for pair in include {
                let (name, path) = split_pair(pair, "include")?;
                let body = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read include '{path}'"))?;
                resolver = resolver.with_template(name, &body);
            }

            print!("{}", engine.render(&text, &resolver));
        }
        Commands::Parse { tag } => {
            let expr = parse_tag_expression(tag_body(tag));
            println!("{}", serde_json::to_string_pretty(&expr)?);
        }
        Commands::Filter { chain, input } => {
            let input = input.as_deref().map(Value::text);
            let output = engine.evaluate_filter_chain(chain, input, &MapResolver::new());
            println!("{}", value::text_of(output.as_ref()));
        }
        Commands::Filters => {
            for name in filter::builtin_names() {
                println!("{name}");
            }
        }
    }

    Ok(())
}
