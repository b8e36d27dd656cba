use crate::config::types::{Config, CrawlerConfig, FetcherConfig, MonitorConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

const MAX_IO_CONCURRENCY: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_storage_config(&config.storage)?;
    validate_monitor_config(&config.monitor)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates crawl limits and pool sizing
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.io_concurrency < 1 || config.io_concurrency > MAX_IO_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "io_concurrency must be between 1 and {}, got {}",
            MAX_IO_CONCURRENCY, config.io_concurrency
        )));
    }

    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.connect_timeout_ms == 0 || config.read_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "fetch timeouts must be greater than zero".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "storage path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_monitor_config(config: &MonitorConfig) -> Result<(), ConfigError> {
    if config.interval_secs == 0 {
        return Err(ConfigError::Validation(
            "monitor interval must be at least one second".to_string(),
        ));
    }
    Ok(())
}

/// Validates seed URLs: absolute, http or https
pub fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }
    }

    Ok(())
}
