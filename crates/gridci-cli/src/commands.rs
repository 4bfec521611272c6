//! CLI command definitions.

use clap::{Args, Subcommand, ValueEnum};
use gridci_core::event::{Event, EventKind, RefKind};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a configuration file
    Validate {
        #[arg(long, default_value = "gridci.yml")]
        config: PathBuf,
    },
    /// Evaluate an event and print the expanded run without executing it
    Plan {
        #[arg(long, default_value = "gridci.yml")]
        config: PathBuf,
        #[command(flatten)]
        event: EventArgs,
    },
    /// Evaluate an event and execute the run with the local shell engine
    Run {
        #[arg(long, default_value = "gridci.yml")]
        config: PathBuf,
        #[command(flatten)]
        event: EventArgs,
        /// Per-job timeout in seconds
        #[arg(long)]
        timeout_seconds: Option<u64>,
    },
}

#[derive(Args)]
pub struct EventArgs {
    /// Event kind
    #[arg(long, value_enum)]
    pub event: EventKindArg,
    /// Branch or tag name
    #[arg(long)]
    pub ref_name: String,
    /// Whether the ref is a branch or a tag
    #[arg(long, value_enum, default_value = "branch")]
    pub ref_kind: RefKindArg,
}

impl EventArgs {
    pub fn to_event(&self) -> Event {
        Event::new(self.event.into(), self.ref_name.clone(), self.ref_kind.into())
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EventKindArg {
    Push,
    PullRequest,
}

impl From<EventKindArg> for EventKind {
    fn from(kind: EventKindArg) -> Self {
        match kind {
            EventKindArg::Push => EventKind::Push,
            EventKindArg::PullRequest => EventKind::PullRequest,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RefKindArg {
    Branch,
    Tag,
}

impl From<RefKindArg> for RefKind {
    fn from(kind: RefKindArg) -> Self {
        match kind {
            RefKindArg::Branch => RefKind::Branch,
            RefKindArg::Tag => RefKind::Tag,
        }
    }
}
