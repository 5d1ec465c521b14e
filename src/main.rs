//! Tessera - project document inspector
//!
//! Entry point: argument parsing and logging setup, commands live in
//! [`commands`].

mod commands;

use std::path::PathBuf;
use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static TRACING_INIT: Once = Once::new();

const USAGE: &str = "\
Usage:
  tessera inspect <file> [--json]
  tessera check <file> [--config <dir>] [--json]
  tessera sample-config
  tessera --version";

/// Initialize tracing subscriber (only once)
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG")
                    .unwrap_or_else(|_| "tessera=info,tessera_core=info".into()),
            ))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    });
}

/// Command-line arguments
#[derive(Debug, Default, PartialEq)]
struct Args {
    /// Subcommand name
    command: Option<String>,
    /// Project document
    file: Option<PathBuf>,
    /// Directory to load `.tessera.toml` from
    config_dir: Option<PathBuf>,
    /// Machine-readable output
    json: bool,
}

impl Args {
    /// Parse command-line arguments
    fn parse() -> Self {
        Self::parse_from(std::env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> Self {
        let mut args = args.into_iter();
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    parsed.config_dir = args.next().map(PathBuf::from);
                }
                "--json" => parsed.json = true,
                "--version" | "-V" => parsed.command = Some("version".to_string()),
                "--help" | "-h" => parsed.command = Some("help".to_string()),
                _ if !arg.starts_with('-') => {
                    if parsed.command.is_none() {
                        parsed.command = Some(arg);
                    } else {
                        parsed.file = Some(PathBuf::from(arg));
                    }
                }
                _ => {
                    // Ignore unknown flags
                }
            }
        }

        parsed
    }

    fn require_file(&self) -> anyhow::Result<&PathBuf> {
        self.file
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("missing <file>\n\n{}", USAGE))
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    match args.command.as_deref() {
        Some("inspect") => {
            let summaries = commands::inspect(args.require_file()?)?;
            print!("{}", commands::render_inspect(&summaries, args.json)?);
        }
        Some("check") => {
            let file = args.require_file()?;
            let report = commands::check(file, args.config_dir.as_deref())?;
            print!("{}", commands::render_check(&report, args.json)?);
        }
        Some("sample-config") => print!("{}", tessera_core::config::sample_config()),
        Some("version") => println!("tessera {}", tessera_core::version()),
        Some("help") | None => println!("{}", USAGE),
        Some(other) => anyhow::bail!("unknown command '{}'\n\n{}", other, USAGE),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Args {
        Args::parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_check_with_flags() {
        assert_eq!(
            parse(&["check", "--config", "/tmp/proj", "project.xml", "--json"]),
            Args {
                command: Some("check".to_string()),
                file: Some(PathBuf::from("project.xml")),
                config_dir: Some(PathBuf::from("/tmp/proj")),
                json: true,
            }
        );
    }

    #[test]
    fn test_parse_empty_and_version() {
        assert_eq!(parse(&[]), Args::default());
        assert_eq!(parse(&["-V"]).command.as_deref(), Some("version"));
        assert!(parse(&["inspect"]).require_file().is_err());
    }
}
