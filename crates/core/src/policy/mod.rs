//! Guard rule and macro generation.
//!
//! This module synthesizes alternating allow/deny rules and recurring-schedule
//! macros, and injects them into the guard rule service through an
//! `HttpTransport`. Submission order is the rule precedence, so every step is
//! sent strictly in sequence.

mod injector;
mod macros;
mod rules;
mod types;
mod workflow;

pub use injector::PolicyInjector;
pub use macros::{CalendarCursor, MacroSynthesizer};
pub use rules::RuleSynthesizer;
pub use types::*;
pub use workflow::{PolicyStep, PolicyWorkflow};
