//! Matrix expansion: one job per target, in declared order.

use gridci_core::config::{OrchestratorConfig, TargetId};
use gridci_core::ids::JobId;
use gridci_core::run::Job;
use regex::Regex;

/// Expands the configured matrix axis into jobs.
pub struct JobExpander;

impl JobExpander {
    pub fn new() -> Self {
        Self
    }

    /// One job per matrix element, carrying the command template
    /// parameterized only by its target identifier. Expansion order is the
    /// matrix's declared order, so reporting stays reproducible.
    pub fn expand(&self, config: &OrchestratorConfig) -> Vec<Job> {
        config
            .matrix
            .iter()
            .enumerate()
            .map(|(index, target)| Job {
                id: JobId::new(),
                index,
                target: target.clone(),
                command: interpolate(&config.command, target),
            })
            .collect()
    }
}

impl Default for JobExpander {
    fn default() -> Self {
        Self::new()
    }
}

/// Substitute `{{ target }}` in the command template.
fn interpolate(template: &str, target: &TargetId) -> String {
    let re = Regex::new(r"\{\{\s*target\s*\}\}").unwrap();
    re.replace_all(template, target.as_str()).to_string()
}
