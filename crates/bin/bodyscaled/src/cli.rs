//! Command-line arguments.

use clap::{Parser, Subcommand};

use bodyscale_domain::id::{MeasurementId, ProfileId};

#[derive(Parser, Debug)]
#[command(name = "bodyscaled", version, about = "Body-composition scale daemon")]
pub struct Cli {
    /// Defaults to `run`
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Listen for the scale and record measurements until SIGINT/SIGTERM
    Run,
    /// List stored measurements no profile was attributed to
    Unassigned,
    /// Attribute a stored measurement to a profile and recompute its metrics
    Reassign {
        /// Measurement id as printed by `unassigned`
        measurement: MeasurementId,
        /// Profile id from the profile store
        profile: ProfileId,
    },
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }
}
