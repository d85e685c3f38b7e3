//! Generators for exercising the SensorSafe platform.
//!
//! Two pipelines share one shape: generate a finite, ordered sequence of
//! request descriptors, then dispatch each through an [`HttpTransport`].
//!
//! - [`retrieval`]: expands channel templates ([`pattern`]) across a date
//!   range ([`window`]) into bulk CSV downloads.
//! - [`policy`]: synthesizes guard rules and schedule macros and injects them
//!   into the rule service.

pub mod config;
pub mod pattern;
pub mod policy;
pub mod retrieval;
pub mod testing;
pub mod transport;
pub mod window;

pub use config::{
    load_config, load_config_from_str, validate_config, validate_download, validate_policy,
    Config, ConfigError, DownloadConfig, FeedConfig, HttpConfig, PolicyConfig, SanitizedConfig,
};
pub use pattern::{expand, PatternError, RangeKind, RangeToken};
pub use policy::{
    CalendarCursor, Macro, MacroSynthesizer, PolicyError, PolicyInjector, PolicyStep,
    PolicyWorkflow, Rule, RuleAction, RuleSynthesizer,
};
pub use retrieval::{
    ChannelStream, DownloadRequest, RetrievalDriver, RetrievalError, RetrievalSummary,
    StreamFailure,
};
pub use transport::{
    BasicCredentials, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport,
    TransportError,
};
pub use window::{walk, TimeWindow, WindowError, WindowWalker};
