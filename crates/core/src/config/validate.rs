use super::{
    types::{Config, DownloadConfig, PolicyConfig},
    ConfigError,
};

/// Validate every section present in the configuration.
///
/// At least one of `[download]` and `[policy]` must be present.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.download.is_none() && config.policy.is_none() {
        return Err(ConfigError::ValidationError(
            "neither [download] nor [policy] is configured".to_string(),
        ));
    }

    if let Some(download) = &config.download {
        validate_download(download)?;
    }
    if let Some(policy) = &config.policy {
        validate_policy(policy)?;
    }

    Ok(())
}

/// Validate the `[download]` section
/// Currently validates:
/// - Base URL is set
/// - Download range is not inverted and the stride is positive
/// - At least one concurrent stream is allowed
/// - Feed names are set
pub fn validate_download(download: &DownloadConfig) -> Result<(), ConfigError> {
    if download.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "download.base_url cannot be empty".to_string(),
        ));
    }

    if download.stride_days == 0 {
        return Err(ConfigError::ValidationError(
            "download.stride_days must be greater than 0".to_string(),
        ));
    }

    if download.from > download.to {
        return Err(ConfigError::ValidationError(format!(
            "download.from ({}) is after download.to ({})",
            download.from, download.to
        )));
    }

    if download.max_concurrent_streams == 0 {
        return Err(ConfigError::ValidationError(
            "download.max_concurrent_streams cannot be 0".to_string(),
        ));
    }

    if let Some(feed) = download.feeds.iter().find(|f| f.name.trim().is_empty()) {
        return Err(ConfigError::ValidationError(format!(
            "feed with channels {:?} has an empty name",
            feed.channels
        )));
    }

    Ok(())
}

/// Validate the `[policy]` section: base URL set, at least one target stream.
pub fn validate_policy(policy: &PolicyConfig) -> Result<(), ConfigError> {
    if policy.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "policy.base_url cannot be empty".to_string(),
        ));
    }

    if policy.target_streams.is_empty() {
        return Err(ConfigError::ValidationError(
            "policy.target_streams must name at least one stream".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_from_str, FeedConfig};

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[download]
base_url = "http://localhost:9005/xively/download"
user = "u"
key = "k"
from = "2013-03-01T00:00"
to = "2013-11-01T00:00"

[policy]
base_url = "https://localhost:8443/api"
username = "owner"
password = "secret"
target_streams = ["NESL_Veris__Current0"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_zero_stride_fails() {
        let mut config = valid_config();
        config.download.as_mut().unwrap().stride_days = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_inverted_range_fails() {
        let mut config = valid_config();
        let download = config.download.as_mut().unwrap();
        std::mem::swap(&mut download.from, &mut download.to);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("is after"));
    }

    #[test]
    fn test_validate_equal_bounds_ok() {
        let mut config = valid_config();
        let download = config.download.as_mut().unwrap();
        download.to = download.from;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_target_streams_fails() {
        let mut config = valid_config();
        config.policy.as_mut().unwrap().target_streams.clear();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let mut config = valid_config();
        config.download.as_mut().unwrap().max_concurrent_streams = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_unnamed_feed_fails() {
        let mut config = valid_config();
        config.download.as_mut().unwrap().feeds.push(FeedConfig {
            name: " ".to_string(),
            channels: vec!["Light".to_string()],
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_policy_url_fails() {
        let mut config = valid_config();
        config.policy.as_mut().unwrap().base_url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_policy_only_config() {
        let mut config = valid_config();
        config.download = None;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_download_ignores_broken_policy() {
        let mut config = valid_config();
        config.policy.as_mut().unwrap().target_streams.clear();

        assert!(validate_download(config.download().unwrap()).is_ok());
        assert!(validate_policy(config.policy().unwrap()).is_err());
    }

    #[test]
    fn test_validate_no_sections_fails() {
        let mut config = valid_config();
        config.download = None;
        config.policy = None;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("neither"));
    }
}
