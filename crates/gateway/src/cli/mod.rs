pub mod classify;
pub mod config;

use clap::{Parser, Subcommand};

/// tutorgate: conversational tutoring gateway.
#[derive(Debug, Parser)]
#[command(name = "tutorgate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Run the crisis and quality gates on a piece of text, offline.
    Classify {
        /// The student text to classify.
        text: String,
        /// Exchange counter to evaluate the low-effort gate against.
        #[arg(long, default_value_t = 0)]
        exchange_count: u32,
        /// Minimum-exchange threshold for the low-effort gate.
        #[arg(long, default_value_t = 5)]
        min_exchanges: u32,
        /// Print the verdicts as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `TG_CONFIG` (or
/// `tutorgate.toml` by default). A missing file means all defaults.
/// Returns the parsed config and the path that was used.
pub fn load_config() -> anyhow::Result<(tg_domain::config::Config, String)> {
    let config_path = std::env::var("TG_CONFIG").unwrap_or_else(|_| "tutorgate.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        tg_domain::config::Config::default()
    };

    Ok((config, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["tutorgate"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn classify_parses_counters() {
        let cli = Cli::try_parse_from([
            "tutorgate",
            "classify",
            "idk",
            "--exchange-count",
            "3",
            "--min-exchanges",
            "4",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Classify {
                text,
                exchange_count,
                min_exchanges,
                json,
            }) => {
                assert_eq!(text, "idk");
                assert_eq!(exchange_count, 3);
                assert_eq!(min_exchanges, 4);
                assert!(!json);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn config_subcommands_parse() {
        let cli = Cli::try_parse_from(["tutorgate", "config", "validate"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Config(ConfigCommand::Validate))));
    }
}
