use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads, parses and validates the TOML configuration at `path`
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use fleet_sounding::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Rosters: {}", config.roster.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so discovery runs can be tied to the settings they used.
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
    use crate::roster::MemberClass;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const HTTP_SECTION: &str = r#"
[http]
crawler-name = "FleetSounding"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "ops@example.com"
"#;

    #[test]
    fn test_load_valid_config() {
        let config_content = format!(
            r#"{}
request-timeout-secs = 20

[discovery]
batch-width = 8
max-pages-per-company = 4
enrich = false

[search]
cache-ttl-hours = 12
deadline-secs = 60
include-photos = false

[output]
database-path = "./fleet.db"

[[roster]]
path = "./primary.json"
member-class = "primary"

[[roster]]
path = "./associate.json"
member-class = "associate"
"#,
            HTTP_SECTION
        );

        let file = create_temp_config(&config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.http.crawler_name, "FleetSounding");
        assert_eq!(config.http.request_timeout_secs, 20);
        assert_eq!(config.http.probe_timeout_secs, 10);
        assert_eq!(config.discovery.batch_width, 8);
        assert_eq!(config.discovery.max_pages_per_company, 4);
        assert!(!config.discovery.enrich);
        assert_eq!(config.search.cache_ttl().as_secs(), 12 * 3600);
        assert!(!config.search.include_photos);
        assert!(config.search.include_tracking);
        assert_eq!(config.roster.len(), 2);
        assert_eq!(config.roster[1].member_class, MemberClass::Associate);
    }

    #[test]
    fn test_sections_default_when_missing() {
        let config_content = format!(
            "{}\n[output]\ndatabase-path = \"./fleet.db\"\n",
            HTTP_SECTION
        );

        let file = create_temp_config(&config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.discovery.batch_width, 5);
        assert!(config.discovery.enrich);
        assert_eq!(config.search.cache_ttl_hours, 24);
        assert!(config.roster.is_empty());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = format!(
            "{}\n[discovery]\nbatch-width = 0\n\n[output]\ndatabase-path = \"./fleet.db\"\n",
            HTTP_SECTION
        );

        let file = create_temp_config(&config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_unknown_member_class_is_parse_error() {
        let config_content = format!(
            "{}\n[output]\ndatabase-path = \"a.db\"\n\n[[roster]]\npath = \"r.json\"\nmember-class = \"honorary\"\n",
            HTTP_SECTION
        );

        let file = create_temp_config(&config_content);
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_hash_tracks_content() {
        let first = create_temp_config("batch-width = 5");
        let same = create_temp_config("batch-width = 5");
        let changed = create_temp_config("batch-width = 6");

        let hash = compute_config_hash(first.path()).unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, compute_config_hash(same.path()).unwrap());
        assert_ne!(hash, compute_config_hash(changed.path()).unwrap());
    }
}
