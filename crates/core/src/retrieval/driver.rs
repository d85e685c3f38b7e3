//! Retrieval driver: enumerates download requests and dispatches them.

use std::sync::Arc;

use chrono::TimeDelta;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::DownloadConfig;
use crate::pattern::{expand, find_range_token};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::window::walk;

use super::{ChannelStream, DownloadRequest, RetrievalError, RetrievalSummary, StreamFailure};

/// Drives bulk retrieval for a feed catalog.
pub struct RetrievalDriver {
    config: DownloadConfig,
    transport: Arc<dyn HttpTransport>,
}

impl RetrievalDriver {
    pub fn new(config: DownloadConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// One stream per (feed, concrete channel), in catalog order.
    ///
    /// Every template is expanded before anything is returned, so a malformed
    /// range fails the whole enumeration up front.
    pub fn enumerate_streams(&self) -> Result<Vec<ChannelStream>, RetrievalError> {
        let windows = walk(
            self.config.from,
            self.config.to,
            TimeDelta::days(i64::from(self.config.stride_days)),
        )?;

        let mut streams = Vec::new();
        for feed in &self.config.feeds {
            for template in &feed.channels {
                let pattern_error = |source| RetrievalError::Pattern {
                    feed: feed.name.clone(),
                    template: template.clone(),
                    source,
                };

                let has_token = find_range_token(template).map_err(pattern_error)?.is_some();
                if !has_token && !self.config.include_unpatterned_channels {
                    debug!(feed = %feed.name, channel = %template, "Skipping unpatterned channel");
                    continue;
                }

                for channel in expand(template).map_err(pattern_error)? {
                    streams.push(ChannelStream {
                        feed: feed.name.clone(),
                        channel,
                        windows: windows.clone(),
                    });
                }
            }
        }

        Ok(streams)
    }

    /// Every download request, in dispatch order.
    pub fn enumerate_requests(&self) -> Result<Vec<DownloadRequest>, RetrievalError> {
        Ok(self
            .enumerate_streams()?
            .iter()
            .flat_map(|s| s.requests().collect::<Vec<_>>())
            .collect())
    }

    /// Build the transport request for a download.
    pub fn build_request(&self, request: &DownloadRequest) -> HttpRequest {
        let url = request.url(&self.config.base_url, &self.config.user, &self.config.key);
        HttpRequest::get(url).with_output(self.config.output_dir.join(request.filename()))
    }

    /// Dispatch a single download.
    pub async fn dispatch(&self, request: &DownloadRequest) -> Result<HttpResponse, RetrievalError> {
        let filename = request.filename();
        info!("Processing: {} ...", filename);

        self.transport
            .send(self.build_request(request))
            .await
            .map_err(|source| RetrievalError::Transport { filename, source })
    }

    /// Walk one stream in order, stopping at the first failure.
    async fn run_stream(&self, stream: ChannelStream) -> (usize, Option<StreamFailure>) {
        let mut dispatched = 0;

        for request in stream.requests() {
            if let Err(e) = self.dispatch(&request).await {
                warn!(
                    feed = %stream.feed,
                    channel = %stream.channel,
                    error = %e,
                    "Aborting remaining windows for channel"
                );
                let failure = StreamFailure {
                    feed: stream.feed.clone(),
                    channel: stream.channel.clone(),
                    filename: request.filename(),
                    error: e.to_string(),
                };
                return (dispatched, Some(failure));
            }
            dispatched += 1;
        }

        (dispatched, None)
    }

    /// Enumerate and dispatch the whole catalog.
    ///
    /// Streams run one at a time unless `max_concurrent_streams` allows more.
    /// Within a stream, windows are always dispatched in order.
    pub async fn run(&self) -> Result<RetrievalSummary, RetrievalError> {
        let streams = self.enumerate_streams()?;
        let concurrency = self.config.max_concurrent_streams.max(1);

        info!(
            streams = streams.len(),
            concurrency,
            transport = self.transport.name(),
            "Starting retrieval"
        );

        let mut summary = RetrievalSummary {
            streams: streams.len(),
            ..Default::default()
        };

        let outcomes: Vec<_> = stream::iter(streams)
            .map(|s| self.run_stream(s))
            .buffered(concurrency)
            .collect()
            .await;

        for (dispatched, failure) in outcomes {
            summary.dispatched += dispatched;
            summary.failures.extend(failure);
        }

        info!(
            dispatched = summary.dispatched,
            failed_streams = summary.failures.len(),
            "Retrieval finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use crate::testing::MockTransport;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::path::PathBuf;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn config(feeds: Vec<FeedConfig>) -> DownloadConfig {
        DownloadConfig {
            base_url: "http://host/xively/download".to_string(),
            user: "nesl_test".to_string(),
            key: "key".to_string(),
            from: ts(2013, 3, 1),
            to: ts(2013, 3, 15),
            stride_days: 7,
            include_unpatterned_channels: false,
            output_dir: PathBuf::from("/data"),
            max_concurrent_streams: 1,
            feeds,
        }
    }

    fn feed(name: &str, channels: &[&str]) -> FeedConfig {
        FeedConfig {
            name: name.to_string(),
            channels: channels.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn driver(config: DownloadConfig) -> (RetrievalDriver, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let driver = RetrievalDriver::new(config, transport.clone());
        (driver, transport)
    }

    #[test]
    fn test_enumerate_skips_unpatterned_by_default() {
        let (driver, _) = driver(config(vec![
            feed("NESL_TempSensor", &["Temperature"]),
            feed("NESL_Eaton", &["Current[A-C]"]),
        ]));

        let streams = driver.enumerate_streams().unwrap();
        let channels: Vec<_> = streams.iter().map(|s| s.channel.as_str()).collect();
        assert_eq!(channels, vec!["CurrentA", "CurrentB", "CurrentC"]);
    }

    #[test]
    fn test_enumerate_includes_unpatterned_when_enabled() {
        let mut cfg = config(vec![feed("NESL_TempSensor", &["Temperature"])]);
        cfg.include_unpatterned_channels = true;
        let (driver, _) = driver(cfg);

        let streams = driver.enumerate_streams().unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].channel, "Temperature");
    }

    #[test]
    fn test_enumerate_requests_order() {
        let (driver, _) = driver(config(vec![feed("NESL_Raritan", &["Voltage[1-2]"])]));

        let requests = driver.enumerate_requests().unwrap();
        // Two channels, three windows each.
        assert_eq!(requests.len(), 6);
        assert_eq!(requests[0].channel, "Voltage1");
        assert_eq!(requests[2].channel, "Voltage1");
        assert_eq!(requests[3].channel, "Voltage2");
        assert_eq!(requests[3].window.start, ts(2013, 3, 1));
        assert_eq!(requests[5].window.start, ts(2013, 3, 15));
    }

    #[test]
    fn test_enumerate_malformed_template_fails() {
        let (driver, _) = driver(config(vec![
            feed("NESL_Veris", &["Current[0-20]"]),
            feed("Broken", &["Power[20-0]"]),
        ]));

        let err = driver.enumerate_streams().unwrap_err();
        match err {
            RetrievalError::Pattern { feed, template, .. } => {
                assert_eq!(feed, "Broken");
                assert_eq!(template, "Power[20-0]");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_build_request_targets_output_dir() {
        let (driver, _) = driver(config(vec![]));
        let request = DownloadRequest {
            feed: "NESL_Eaton".to_string(),
            channel: "VoltageAN".to_string(),
            window: crate::window::TimeWindow {
                start: ts(2013, 3, 1),
                end: ts(2013, 3, 8),
            },
        };

        let http = driver.build_request(&request);
        assert_eq!(http.method, crate::transport::HttpMethod::Get);
        assert!(http.credentials.is_none());
        assert_eq!(
            http.output.unwrap(),
            PathBuf::from("/data/NESL_Eaton__VoltageAN__2013-03-01T00-00_2013-03-08T00-00.csv")
        );
    }

    #[tokio::test]
    async fn test_run_dispatches_everything() {
        let (driver, transport) = driver(config(vec![feed("NESL_Eaton", &["Power[A-B]"])]));

        let summary = driver.run().await.unwrap();
        assert!(summary.is_success());
        assert_eq!(summary.streams, 2);
        assert_eq!(summary.dispatched, 6);
        assert_eq!(transport.request_count().await, 6);
    }

    #[tokio::test]
    async fn test_run_failure_aborts_only_that_stream() {
        let (driver, transport) = driver(config(vec![feed("NESL_Eaton", &["Power[A-B]"])]));
        transport
            .fail_when(|r| r.url.contains("datastream=PowerA") && r.url.contains("start=2013-03-08"))
            .await;

        let summary = driver.run().await.unwrap();
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].channel, "PowerA");
        assert_eq!(
            summary.failures[0].filename,
            "NESL_Eaton__PowerA__2013-03-08T00-00_2013-03-15T00-00.csv"
        );
        // PowerA: 1 ok then failure; PowerB: 3 ok.
        assert_eq!(summary.dispatched, 4);
        assert_eq!(transport.request_count().await, 5);
    }
}
