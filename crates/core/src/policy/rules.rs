use chrono::{NaiveDateTime, TimeDelta};

use super::macros::macro_name;
use super::{PolicyError, Rule, RuleAction};

/// Format of timestamps inside `timestamp BETWEEN` conditions.
///
/// Older generated rule sets used `%H:%M:%M`, repeating the minutes in the
/// seconds field. The two only agree for origins on a whole hour; an origin
/// of `08:30` renders `08:30:00` here where those sets had `08:30:30`.
pub const CONDITION_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset added to the lower bound of deny value rules.
///
/// Produces a near-empty range on purpose; the rule engine has to cope with
/// it.
pub const DENY_EPSILON: f64 = 0.0000001;

/// Width of the allow range in value rules.
const VALUE_ALLOW_WIDTH: u64 = 50;

/// Generates alternating allow/deny rules against a fixed set of streams.
#[derive(Debug, Clone)]
pub struct RuleSynthesizer {
    target_streams: Vec<String>,
    origin: NaiveDateTime,
    priority: Option<i32>,
}

impl RuleSynthesizer {
    pub fn new(target_streams: Vec<String>, origin: NaiveDateTime) -> Result<Self, PolicyError> {
        if target_streams.is_empty() {
            return Err(PolicyError::NoTargetStreams);
        }
        Ok(Self {
            target_streams,
            origin,
            priority: None,
        })
    }

    /// Attach an explicit priority to every generated rule.
    pub fn with_priority(mut self, priority: Option<i32>) -> Self {
        self.priority = priority;
        self
    }

    fn rule(&self, condition: String, action: RuleAction) -> Rule {
        Rule {
            target_streams: self.target_streams.clone(),
            condition,
            action,
            priority: self.priority,
        }
    }

    /// Time-window rules.
    ///
    /// Even `i`: allow `[origin + i days, +4 weeks)`.
    /// Odd `i`: deny `[origin + ceil((i+1)/2) weeks, +1 day)`.
    pub fn time_window_rules(&self, count: usize) -> Vec<Rule> {
        (0..count)
            .map(|i| {
                let action = RuleAction::alternating(i);
                let (start, width) = match action {
                    RuleAction::Allow => (self.origin + TimeDelta::days(i as i64), TimeDelta::weeks(4)),
                    RuleAction::Deny => (
                        self.origin + TimeDelta::weeks((i / 2 + 1) as i64),
                        TimeDelta::days(1),
                    ),
                };
                let condition = format!(
                    "timestamp BETWEEN \"{}\" AND \"{}\"",
                    start.format(CONDITION_TIMESTAMP_FORMAT),
                    (start + width).format(CONDITION_TIMESTAMP_FORMAT)
                );
                self.rule(condition, action)
            })
            .collect()
    }

    /// Value-threshold rules on `channel1`.
    ///
    /// Even `i`: allow `i..i+50`. Odd `i`: deny the degenerate range
    /// `i..i+DENY_EPSILON`.
    pub fn value_rules(&self, count: usize) -> Vec<Rule> {
        (0..count)
            .map(|i| {
                let action = RuleAction::alternating(i);
                let upper = match action {
                    RuleAction::Allow => (i as u64 + VALUE_ALLOW_WIDTH).to_string(),
                    RuleAction::Deny => format_decimal(i as f64 + DENY_EPSILON),
                };
                self.rule(format!("channel1 BETWEEN {} AND {}", i, upper), action)
            })
            .collect()
    }

    /// Rules whose condition is the macro `WORK_TIME_<i+1>`.
    pub fn macro_rules(&self, count: usize) -> Vec<Rule> {
        (0..count)
            .map(|i| self.rule(format!("$({})", macro_name(i)), RuleAction::alternating(i)))
            .collect()
    }
}

/// Render with at most 7 decimals, trailing zeros dropped.
fn format_decimal(value: f64) -> String {
    let s = format!("{:.7}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}
