//! Testing utilities and mock implementations.
//!
//! This module provides test doubles for the `HttpTransport` trait, so both
//! pipelines can be exercised without a download server or a policy service.
//!
//! # Example
//!
//! ```rust,ignore
//! use sensorsafe_testgen_core::testing::{MockPolicyServer, MockTransport};
//!
//! let server = Arc::new(MockPolicyServer::new(BasicCredentials::new("owner", "pw")));
//! let injector = PolicyInjector::new("https://host/api", creds, server.clone());
//! injector.run(&steps).await?;
//! assert_eq!(server.rules().await.len(), 4);
//! ```

mod mock_policy_server;
mod mock_transport;

pub use mock_policy_server::MockPolicyServer;
pub use mock_transport::{MockTransport, RecordedRequest};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::config::{DownloadConfig, FeedConfig, PolicyConfig};

    /// Midnight on the given date.
    pub fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid fixture date")
    }

    /// Create a feed entry.
    pub fn feed(name: &str, channels: &[&str]) -> FeedConfig {
        FeedConfig {
            name: name.to_string(),
            channels: channels.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// The sensor catalog the download tool was first used with.
    pub fn nesl_catalog() -> Vec<FeedConfig> {
        vec![
            feed("NESL_TempSensor", &["Temperature"]),
            feed("NESL_SmartSwitch", &["Energy", "Power"]),
            feed("NESL_Veris", &["Current[0-20]", "Power[0-20]", "PowerFactor[0-20]"]),
            feed("NESL_LightSensor", &["Light"]),
            feed("NESL_MotionSensor", &["Motion"]),
            feed(
                "NESL_Raritan",
                &[
                    "ActivePower[1-8]",
                    "ApparentPower[1-8]",
                    "Current[1-8]",
                    "PowerFactor[1-8]",
                    "Voltage[1-8]",
                ],
            ),
            feed("NESL_DoorSensor", &["Door"]),
            feed(
                "NESL_Eaton",
                &[
                    "Current[A-C]",
                    "Power[A-C]",
                    "PowerFactor[A-C]",
                    "VARs[A-C]",
                    "VAs[A-C]",
                    "Voltage[A-C]N",
                ],
            ),
            feed("NESL_Occupancy", &["Occupancy_count"]),
        ]
    }

    /// Download config over March-November 2013 in weekly windows.
    pub fn download_config(feeds: Vec<FeedConfig>) -> DownloadConfig {
        DownloadConfig {
            base_url: "http://localhost:9005/xively/download".to_string(),
            user: "nesl_test".to_string(),
            key: "test-key".to_string(),
            from: midnight(2013, 3, 1),
            to: midnight(2013, 11, 1),
            stride_days: 7,
            include_unpatterned_channels: false,
            output_dir: std::path::PathBuf::from("."),
            max_concurrent_streams: 1,
            feeds,
        }
    }

    /// Policy config targeting a single stream.
    pub fn policy_config() -> PolicyConfig {
        PolicyConfig {
            base_url: "https://localhost:8443/api".to_string(),
            username: "nesl_owner".to_string(),
            password: "test-password".to_string(),
            target_streams: vec!["NESL_Veris__Current0".to_string()],
            origin: midnight(2013, 3, 1),
        }
    }
}
