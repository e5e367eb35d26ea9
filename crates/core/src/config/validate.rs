use super::{types::Config, ConfigError};

/// Validate configuration
///
/// Rejects values that would make the service unusable: a zero port, a zero
/// attempt budget, zero timeouts or intervals, and non-http candidate bases.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.retry.attempts_per_candidate == 0 {
        return Err(invalid("retry.attempts_per_candidate must be at least 1"));
    }

    if config.extractor.timeout_secs == 0 {
        return Err(invalid("extractor.timeout_secs must be greater than 0"));
    }

    if config.transcoder.timeout_secs == 0 {
        return Err(invalid("transcoder.timeout_secs must be greater than 0"));
    }

    if config.jobs.sweep_interval_secs == 0 {
        return Err(invalid("jobs.sweep_interval_secs must be greater than 0"));
    }

    if config.jobs.max_age_secs == 0 {
        return Err(invalid("jobs.max_age_secs must be greater than 0"));
    }

    if config.jobs.max_concurrent == 0 {
        return Err(invalid("jobs.max_concurrent must be at least 1"));
    }

    for (key, base) in [
        ("candidates.canonical_base", &config.candidates.canonical_base),
        ("candidates.player_base", &config.candidates.player_base),
    ] {
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be an http(s) URL, got {:?}",
                key, base
            )));
        }
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
