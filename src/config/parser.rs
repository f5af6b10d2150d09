use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stamped into the crawl metadata written to `crawl.json`.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    use crate::config::CrawlTask;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[crawler]
seed-url = "https://example.com"
max-pages = 50
max-depth = 3
follow-external-links = false
request-delay = 200
max-concurrent-requests = 4
retry-attempts = 1
request-timeout = 5000

[user-agent]
crawler-name = "TestAuditBot"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
directory = "./out"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_pages, 50);
        assert_eq!(config.crawler.max_depth, 3);
        assert_eq!(config.crawler.max_concurrent_requests, 4);
        assert_eq!(config.user_agent.crawler_name, "TestAuditBot");
        assert!(config.publish.is_none());
        assert!(!config.url.strip_www);
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(VALID_CONFIG).unwrap();
        assert!(config.crawler.use_sitemap);
        assert_eq!(config.crawler.max_child_sitemaps, 10);
        assert_eq!(config.output.sitemap_chunk_size, 50_000);
    }

    #[test]
    fn test_crawl_task_from_config() {
        let config = parse_config(VALID_CONFIG).unwrap();
        let task = CrawlTask::from_config(&config.crawler);

        assert_eq!(task.seed_url, "https://example.com");
        assert_eq!(task.max_pages, 50);
        assert_eq!(task.request_delay, Duration::from_millis(200));
        assert_eq!(task.request_timeout, Duration::from_millis(5000));
        assert_eq!(task.max_concurrent_requests, 4);
        assert_eq!(task.retry_attempts, 1);
    }

    #[test]
    fn test_publish_section_parsed_and_redacted() {
        let content = format!(
            "{}\n[publish]\nhost = \"deploy.example.com\"\nusername = \"deploy\"\npassword = \"hunter2\"\n",
            VALID_CONFIG
        );
        let config = parse_config(&content).unwrap();
        let target = config.publish.unwrap();

        assert_eq!(target.host, "deploy.example.com");
        assert_eq!(target.scheme, "https");
        assert!(!format!("{:?}", target).contains("hunter2"));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/audit.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = VALID_CONFIG.replace("max-pages = 50", "max-pages = 0");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
