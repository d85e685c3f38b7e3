use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sensorsafe_testgen_core::PolicyWorkflow;

/// Test-data and guard-rule generators for the SensorSafe platform.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "SENSORSAFE_CONFIG",
        default_value = "config.toml"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download every patterned channel of the catalog, one file per window
    Download {
        /// Print filenames and URLs without sending anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate and inject guard rules
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    /// Alternating allow/deny timestamp windows
    TimeWindow {
        #[arg(short = 'n', long, default_value_t = 4)]
        count: usize,
        #[arg(long)]
        dry_run: bool,
        /// Priority attached to every generated rule
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<i32>,
    },
    /// Alternating allow/deny value thresholds on channel1
    Value {
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,
        #[arg(long)]
        dry_run: bool,
        /// Priority attached to every generated rule
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<i32>,
    },
    /// Schedule macros plus rules referencing them
    Macro {
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,
        #[arg(long)]
        dry_run: bool,
        /// Priority attached to every generated rule
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<i32>,
    },
    /// Print the rules and macros currently on the server
    List,
}

impl RulesCommand {
    /// The generation run to perform, or `None` for `list`.
    pub fn workflow(&self) -> Option<PolicyWorkflow> {
        match *self {
            RulesCommand::TimeWindow { count, .. } => Some(PolicyWorkflow::TimeWindow { count }),
            RulesCommand::Value { count, .. } => Some(PolicyWorkflow::Value { count }),
            RulesCommand::Macro { count, .. } => Some(PolicyWorkflow::MacroSchedule { count }),
            RulesCommand::List => None,
        }
    }

    pub fn priority(&self) -> Option<i32> {
        match *self {
            RulesCommand::TimeWindow { priority, .. }
            | RulesCommand::Value { priority, .. }
            | RulesCommand::Macro { priority, .. } => priority,
            RulesCommand::List => None,
        }
    }

    pub fn dry_run(&self) -> bool {
        match *self {
            RulesCommand::TimeWindow { dry_run, .. }
            | RulesCommand::Value { dry_run, .. }
            | RulesCommand::Macro { dry_run, .. } => dry_run,
            RulesCommand::List => false,
        }
    }
}
