use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Root configuration
///
/// The `download` and `policy` sections are independent; each command only
/// needs its own.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<DownloadConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyConfig>,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// The `[download]` section, or an error naming it when absent.
    pub fn download(&self) -> Result<&DownloadConfig, ConfigError> {
        self.download
            .as_ref()
            .ok_or(ConfigError::MissingSection("download"))
    }

    /// The `[policy]` section, or an error naming it when absent.
    pub fn policy(&self) -> Result<&PolicyConfig, ConfigError> {
        self.policy
            .as_ref()
            .ok_or(ConfigError::MissingSection("policy"))
    }
}

/// Bulk retrieval configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Download endpoint (e.g., "http://localhost:9005/xively/download")
    pub base_url: String,
    pub user: String,
    pub key: String,
    /// First window starts here.
    #[serde(with = "timestamp")]
    pub from: NaiveDateTime,
    /// Windows keep being emitted while their start is not after this.
    #[serde(with = "timestamp")]
    pub to: NaiveDateTime,
    /// Width of each request window in days (default: 7)
    #[serde(default = "default_stride_days")]
    pub stride_days: u32,
    /// Also download channels whose template has no range token (default: false)
    #[serde(default)]
    pub include_unpatterned_channels: bool,
    /// Directory the downloaded CSV files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Number of (feed, channel) streams downloaded at once (default: 1)
    #[serde(default = "default_max_concurrent_streams")]
    pub max_concurrent_streams: usize,
    /// Feed catalog, in download order
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

/// One feed and its channel-name templates.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FeedConfig {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<String>,
}

fn default_stride_days() -> u32 {
    7
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_concurrent_streams() -> usize {
    1
}

/// Guard rule service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// API base URL (e.g., "https://localhost:8443/api")
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Streams every generated rule applies to
    pub target_streams: Vec<String>,
    /// Anchor for time-window rules (default: 2013-03-01T00:00)
    #[serde(default = "default_origin", with = "timestamp")]
    pub origin: NaiveDateTime,
}

fn default_origin() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2013, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// HTTP client configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Skip TLS certificate validation. Only meant for self-signed test servers.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Per-request timeout in seconds. No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<SanitizedDownloadConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<SanitizedPolicyConfig>,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDownloadConfig {
    pub base_url: String,
    pub user: String,
    pub key_configured: bool,
    pub from: String,
    pub to: String,
    pub stride_days: u32,
    pub include_unpatterned_channels: bool,
    pub feed_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPolicyConfig {
    pub base_url: String,
    pub username: String,
    pub password_configured: bool,
    pub target_streams: Vec<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            download: config.download.as_ref().map(|download| SanitizedDownloadConfig {
                base_url: download.base_url.clone(),
                user: download.user.clone(),
                key_configured: !download.key.is_empty(),
                from: download.from.format(timestamp::FORMAT).to_string(),
                to: download.to.format(timestamp::FORMAT).to_string(),
                stride_days: download.stride_days,
                include_unpatterned_channels: download.include_unpatterned_channels,
                feed_count: download.feeds.len(),
            }),
            policy: config.policy.as_ref().map(|policy| SanitizedPolicyConfig {
                base_url: policy.base_url.clone(),
                username: policy.username.clone(),
                password_configured: !policy.password.is_empty(),
                target_streams: policy.target_streams.clone(),
            }),
            http: config.http.clone(),
        }
    }
}

/// Naive timestamps written as `YYYY-MM-DDThh:mm`, seconds optional.
pub(crate) mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M";
    const FORMAT_WITH_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn parse(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, FORMAT_WITH_SECONDS))
    }

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(FORMAT_WITH_SECONDS))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", s, e)))
    }
}
