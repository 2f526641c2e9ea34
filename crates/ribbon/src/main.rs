//! Binary entrypoint for ribbon: configuration checks and expression evaluation.
use std::{
    io,
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use config::{
    Document, MacroTable, Scanner, Token, load_from_path, resolve_config_path, value::parse_value,
};
use exprlib::{BasicHost, CallContext, ConfigPaths, Evaluator, registry};
use logging as logshared;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "ribbon", about = "Status-bar configuration tools", version)]
/// Command-line interface for the `ribbon` binary.
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,

    /// Logging controls
    #[command(flatten)]
    log: logshared::LogArgs,

    /// Optional path to the config file
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Command {
    /// Load and validate the configuration then exit.
    Check {
        /// Path to configuration file to check (defaults to $XDG_CONFIG_HOME/ribbon/config)
        path: Option<PathBuf>,

        /// Dump the parsed configuration as JSON to stdout
        #[arg(long)]
        dump: bool,
    },

    /// Evaluate one expression and print the result.
    Eval {
        /// Expression text, e.g. 'pad(str(disk("/", "%used")), 3) + "%"'
        expr: String,
    },

    /// Evaluate every block value in the configuration once.
    DumpValues {
        /// Path to configuration file (defaults to $XDG_CONFIG_HOME/ribbon/config)
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let final_spec = cli.log.spec();
    tracing_subscriber::registry()
        .with(logshared::env_filter_from_spec(&final_spec))
        .with(fmt::layer().without_time().with_writer(io::stderr))
        .try_init()
        .ok();
    debug!(filter = %final_spec, "logging initialised");

    match &cli.command {
        Command::Check { path, dump } => {
            let doc = load_or_exit(path.as_deref().or(cli.config.as_deref()));
            if *dump {
                match serde_json::to_string_pretty(&doc) {
                    Ok(json) => println!("{json}"),
                    Err(e) => fail(&format!("Failed to serialize config: {e}")),
                }
            } else {
                println!("OK");
            }
        }
        Command::Eval { expr } => {
            let doc = cli.config.as_deref().map(|p| load_or_exit(Some(p)));
            let macros = doc.as_ref().map(|d| d.macros.clone()).unwrap_or_default();
            let expanded = match expand(expr, &macros) {
                Ok(text) => text,
                Err(e) => fail(&e.pretty()),
            };
            debug!(expr = %expanded, "expanded expression");

            let config_dir = doc.as_ref().and_then(|d| d.config_dir.as_deref());
            let host = BasicHost::new(ConfigPaths::standard(config_dir));
            let ctx = CallContext::new(&host);
            match Evaluator::new(registry()).render(&expanded, &ctx) {
                Ok(text) => println!("{text}"),
                Err(e) => fail(&e.to_string()),
            }
        }
        Command::DumpValues { path } => {
            let doc = load_or_exit(path.as_deref().or(cli.config.as_deref()));
            if !dump_values(&doc) {
                process::exit(1);
            }
        }
    }
}

/// Print `message` to stderr and exit with status 1.
fn fail(message: &str) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

/// Resolve and load the configuration, exiting on failure.
fn load_or_exit(explicit: Option<&Path>) -> Document {
    let loaded = resolve_config_path(explicit).and_then(|p| load_from_path(&p));
    match loaded {
        Ok(doc) => doc,
        Err(e) => fail(&e.pretty()),
    }
}

/// Run a command-line expression through the value reader so macros apply.
fn expand(expr: &str, macros: &MacroTable) -> Result<String, config::Error> {
    let mut scanner = Scanner::new(expr);
    let text = parse_value(&mut scanner, macros, None)?;
    let rest = scanner.next_token()?;
    if rest != Token::Eof {
        return Err(scanner.error(format!("unexpected {} after expression", rest)));
    }
    Ok(text)
}

/// Print `label: result` for every block with a value. Returns false when any
/// expression failed.
fn dump_values(doc: &Document) -> bool {
    let host = BasicHost::new(ConfigPaths::standard(doc.config_dir.as_deref()));
    let ctx = CallContext::new(&host);
    let mut evaluator = Evaluator::new(registry()).with_cache();
    let mut ok = true;
    for block in doc.all_blocks() {
        let Some(expr) = block.value.as_deref() else {
            continue;
        };
        let label = block
            .value_label
            .clone()
            .unwrap_or_else(|| block.display_name());
        match evaluator.render(expr, &ctx) {
            Ok(text) => println!("{label}: {text}"),
            Err(e) => {
                println!("{label}: error: {e}");
                ok = false;
            }
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_substitutes_macros() {
        let mut macros = MacroTable::new();
        macros.define("Unit", r#""%""#);
        assert_eq!(
            expand(r#"str(50) + Unit"#, &macros).unwrap(),
            r#"str(50)+"%""#
        );
    }

    #[test]
    fn expand_rejects_trailing_tokens() {
        let err = expand("1 + 2 } 3", &MacroTable::new()).unwrap_err();
        assert_eq!(err.message(), "unexpected '}' after expression");
    }

    #[test]
    fn cli_parses_commands() {
        let cli = Cli::parse_from(["ribbon", "--config", "/tmp/x", "eval", "1+1"]);
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/x")));
        assert!(matches!(cli.command, Command::Eval { ref expr } if expr == "1+1"));

        let cli = Cli::parse_from(["ribbon", "check", "cfg", "--dump"]);
        assert!(matches!(cli.command, Command::Check { dump: true, .. }));
    }
}
