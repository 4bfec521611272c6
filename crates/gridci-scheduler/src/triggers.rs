//! Trigger matching and evaluation.

use crate::matrix::JobExpander;
use gridci_core::config::{OrchestratorConfig, RefPattern, TriggerRule};
use gridci_core::event::Event;
use gridci_core::run::{MatchedRule, Run};
use tracing::debug;

/// Decides, from a repository event, whether a run should be launched.
///
/// Evaluation has no side effects beyond the returned run descriptor; jobs
/// are never executed here.
pub struct TriggerEvaluator {
    expander: JobExpander,
}

impl TriggerEvaluator {
    pub fn new() -> Self {
        Self {
            expander: JobExpander::new(),
        }
    }

    /// Evaluate an event against the configuration.
    ///
    /// Returns `None` when no rule matches; otherwise a `Pending` run
    /// holding one job per matrix target. Evaluating the same event twice
    /// produces two independent runs with identical job sets.
    pub fn evaluate(&self, config: &OrchestratorConfig, event: &Event) -> Option<Run> {
        let (rule, pattern) = self.matching_rule(config, event)?;
        debug!(
            kind = %event.kind,
            ref_name = %event.ref_name,
            pattern = pattern.source(),
            "trigger rule matched"
        );
        let jobs = self.expander.expand(config);
        Some(Run::new(
            event.clone(),
            MatchedRule {
                event_kind: rule.event_kind,
                pattern: pattern.source().to_string(),
            },
            config.fail_fast,
            jobs,
        ))
    }

    /// First rule whose kind matches and whose pattern set accepts the ref.
    fn matching_rule<'a>(
        &self,
        config: &'a OrchestratorConfig,
        event: &Event,
    ) -> Option<(&'a TriggerRule, &'a RefPattern)> {
        for rule in &config.rules {
            if rule.event_kind != event.kind {
                continue;
            }
            if let Some(pattern) = rule.patterns.iter().find(|p| p.matches(&event.ref_name)) {
                return Some((rule, pattern));
            }
        }
        None
    }
}

impl Default for TriggerEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
