use tg_domain::config::{Config, ConfigSeverity};

/// Parse and validate the config, printing any issues.
///
/// Returns `false` when at least one error was found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();

    for issue in &issues {
        println!("{issue}");
    }
    println!(
        "\n{error_count} error(s), {} warning(s) in {config_path}",
        issues.len() - error_count,
    );

    error_count == 0
}

/// Render the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_show() {
        let rendered = show(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.server.port, 8787);
        assert_eq!(parsed.rate_limits.tutor.max_requests, 10);
        assert_eq!(parsed.tutor.completion_sentinel, "[SESSION_COMPLETE]");
    }

    #[test]
    fn invalid_config_fails_validation() {
        let mut cfg = Config::default();
        cfg.llm.timeout_ms = 0;
        assert!(!validate(&cfg, "test.toml"));
        assert!(validate(&Config::default(), "test.toml"));
    }
}
