use std::fmt;

use super::{Macro, MacroSynthesizer, Rule, RuleSynthesizer};

/// One request in a policy injection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyStep {
    ResetRules,
    ResetMacros,
    SubmitRule(Rule),
    SubmitMacro(Macro),
}

impl fmt::Display for PolicyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyStep::ResetRules => f.write_str("DELETE /rules"),
            PolicyStep::ResetMacros => f.write_str("DELETE /macros"),
            PolicyStep::SubmitRule(rule) => {
                write!(f, "POST /rules ({}: {})", rule.action, rule.condition)
            }
            PolicyStep::SubmitMacro(m) => write!(f, "POST /macros ({})", m.name),
        }
    }
}

impl PolicyStep {
    /// JSON body sent with this step, if any.
    pub fn json_body(&self) -> Result<Option<String>, serde_json::Error> {
        match self {
            PolicyStep::ResetRules | PolicyStep::ResetMacros => Ok(None),
            PolicyStep::SubmitRule(rule) => serde_json::to_string(rule).map(Some),
            PolicyStep::SubmitMacro(m) => serde_json::to_string(m).map(Some),
        }
    }
}

/// The generation runs the tool knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyWorkflow {
    /// Clear rules, then submit time-window rules.
    TimeWindow { count: usize },
    /// Clear rules, then submit value-threshold rules.
    Value { count: usize },
    /// Clear macros, submit schedule macros, clear rules, then submit rules
    /// referencing those macros.
    MacroSchedule { count: usize },
}

impl PolicyWorkflow {
    /// The ordered steps of this run.
    pub fn plan(&self, rules: &RuleSynthesizer) -> Vec<PolicyStep> {
        let mut steps = Vec::new();

        match *self {
            PolicyWorkflow::TimeWindow { count } => {
                steps.push(PolicyStep::ResetRules);
                steps.extend(rules.time_window_rules(count).into_iter().map(PolicyStep::SubmitRule));
            }
            PolicyWorkflow::Value { count } => {
                steps.push(PolicyStep::ResetRules);
                steps.extend(rules.value_rules(count).into_iter().map(PolicyStep::SubmitRule));
            }
            PolicyWorkflow::MacroSchedule { count } => {
                steps.push(PolicyStep::ResetMacros);
                steps.extend(
                    MacroSynthesizer::new()
                        .generate(count)
                        .into_iter()
                        .map(PolicyStep::SubmitMacro),
                );
                steps.push(PolicyStep::ResetRules);
                steps.extend(rules.macro_rules(count).into_iter().map(PolicyStep::SubmitRule));
            }
        }

        steps
    }
}
