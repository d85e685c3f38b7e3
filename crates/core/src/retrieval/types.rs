//! Types for the retrieval pipeline.

use serde::Serialize;
use thiserror::Error;

use crate::pattern::PatternError;
use crate::transport::TransportError;
use crate::window::{TimeWindow, WindowError, WindowWalker};

/// Timestamp format used in request URLs.
pub const URL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Timestamp format used in output filenames (no colons).
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M";

/// One bulk download: a channel of a feed over one window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadRequest {
    pub feed: String,
    pub channel: String,
    pub window: TimeWindow,
}

impl DownloadRequest {
    /// Build the download URL.
    ///
    /// Free-text parameters are percent-encoded; timestamps only contain
    /// characters that are valid in a query string and are left as is.
    pub fn url(&self, base_url: &str, user: &str, key: &str) -> String {
        format!(
            "{}?user={}&key={}&feed={}&datastream={}&start={}&end={}",
            base_url,
            urlencoding::encode(user),
            urlencoding::encode(key),
            urlencoding::encode(&self.feed),
            urlencoding::encode(&self.channel),
            self.window.start.format(URL_TIMESTAMP_FORMAT),
            self.window.end.format(URL_TIMESTAMP_FORMAT),
        )
    }

    /// Output filename: `<feed>__<channel>__<start>_<end>.csv`.
    pub fn filename(&self) -> String {
        format!(
            "{}__{}__{}_{}.csv",
            self.feed,
            self.channel,
            self.window.start.format(FILE_TIMESTAMP_FORMAT),
            self.window.end.format(FILE_TIMESTAMP_FORMAT),
        )
    }
}

/// Every window of one concrete channel, downloaded in order.
#[derive(Debug, Clone)]
pub struct ChannelStream {
    pub feed: String,
    pub channel: String,
    pub(crate) windows: WindowWalker,
}

impl ChannelStream {
    /// The stream's requests, in window order.
    pub fn requests(&self) -> impl Iterator<Item = DownloadRequest> + '_ {
        self.windows.clone().map(move |window| DownloadRequest {
            feed: self.feed.clone(),
            channel: self.channel.clone(),
            window,
        })
    }
}

/// A stream that stopped early because a request failed.
#[derive(Debug, Clone, Serialize)]
pub struct StreamFailure {
    pub feed: String,
    pub channel: String,
    /// Output file of the request that failed.
    pub filename: String,
    pub error: String,
}

/// Outcome of a full retrieval run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievalSummary {
    /// Number of (feed, channel) streams walked.
    pub streams: usize,
    /// Requests that completed successfully.
    pub dispatched: usize,
    /// Streams aborted by a transport failure.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<StreamFailure>,
}

impl RetrievalSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Errors that can occur during retrieval.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Feed {feed}: cannot expand channel template '{template}': {source}")]
    Pattern {
        feed: String,
        template: String,
        #[source]
        source: PatternError,
    },

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("Download of {filename} failed: {source}")]
    Transport {
        filename: String,
        #[source]
        source: TransportError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn request() -> DownloadRequest {
        DownloadRequest {
            feed: "NESL_Veris".to_string(),
            channel: "Current0".to_string(),
            window: TimeWindow {
                start: ts(2013, 3, 1),
                end: ts(2013, 3, 1) + TimeDelta::days(7),
            },
        }
    }

    #[test]
    fn test_request_url() {
        let url = request().url("http://host:9005/xively/download", "nesl_test", "abc");
        assert_eq!(
            url,
            "http://host:9005/xively/download?user=nesl_test&key=abc&feed=NESL_Veris\
             &datastream=Current0&start=2013-03-01T00:00&end=2013-03-08T00:00"
        );
    }

    #[test]
    fn test_request_url_encodes_free_text() {
        let url = request().url("http://host/dl", "a b", "k&ey");
        assert!(url.contains("user=a%20b"));
        assert!(url.contains("key=k%26ey"));
    }

    #[test]
    fn test_request_filename() {
        assert_eq!(
            request().filename(),
            "NESL_Veris__Current0__2013-03-01T00-00_2013-03-08T00-00.csv"
        );
    }

    #[test]
    fn test_summary_success() {
        let mut summary = RetrievalSummary::default();
        assert!(summary.is_success());
        summary.failures.push(StreamFailure {
            feed: "f".to_string(),
            channel: "c".to_string(),
            filename: "f__c.csv".to_string(),
            error: "boom".to_string(),
        });
        assert!(!summary.is_success());
    }
}
