// Rule detectors over the resolved usage summaries

mod uninstantiated_classes;
mod unused_members;
mod unused_types;

pub use uninstantiated_classes::UninstantiatedClassDetector;
pub use unused_members::UnusedMemberDetector;
pub use unused_types::UnusedTypeDetector;

use crate::analysis::{sort_findings, Finding, RuleId, UsageResolution};
use crate::config::Config;
use crate::graph::{Declaration, Graph};

/// Contract shared by every rule: inspect the graph and resolved usage,
/// return findings. Peripheral rules plug in here.
pub trait Detector {
    fn rule(&self) -> RuleId;

    fn detect(&self, graph: &Graph, resolution: &UsageResolution, config: &Config) -> Vec<Finding>;
}

/// Run every enabled detector and return sorted findings
pub fn run_all(graph: &Graph, resolution: &UsageResolution, config: &Config) -> Vec<Finding> {
    let detectors: Vec<Box<dyn Detector>> = vec![
        Box::new(UnusedTypeDetector::new()),
        Box::new(UninstantiatedClassDetector::new()),
        Box::new(UnusedMemberDetector::new()),
    ];

    let mut findings = Vec::new();
    for detector in detectors {
        if config.rule_enabled(detector.rule().code()) {
            findings.extend(detector.detect(graph, resolution, config));
        }
    }

    sort_findings(&mut findings);
    findings
}

/// Whether any enclosing type of this declaration is itself reported dead.
/// Members and nested types of a dead type are subsumed by the type's own
/// diagnostic: one finding per dead subtree root.
pub(crate) fn inside_dead_type(
    graph: &Graph,
    resolution: &UsageResolution,
    decl: &Declaration,
) -> bool {
    let mut current = decl.parent.clone();
    while let Some(parent_id) = current {
        let Some(parent) = graph.get_declaration(&parent_id) else {
            break;
        };
        if parent.kind.is_type() && resolution.is_dead(&parent.id) {
            return true;
        }
        current = parent.parent.clone();
    }
    false
}
