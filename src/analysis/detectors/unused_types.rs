// Unused internal type detection (DS001)

use super::{inside_dead_type, Detector};
use crate::analysis::{Finding, RuleId, UsageResolution};
use crate::config::Config;
use crate::graph::Graph;

/// Reports non-public types with zero external usage
pub struct UnusedTypeDetector;

impl UnusedTypeDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for UnusedTypeDetector {
    fn rule(&self) -> RuleId {
        RuleId::UnusedType
    }

    fn detect(&self, graph: &Graph, resolution: &UsageResolution, _config: &Config) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (id, _summary) in resolution.iter() {
            let Some(decl) = graph.get_declaration(id) else {
                continue;
            };
            if !decl.kind.is_type() {
                continue;
            }
            if !resolution.is_dead(id) {
                continue;
            }
            // A nested type inside a dead type is subsumed by its root
            if inside_dead_type(graph, resolution, decl) {
                continue;
            }

            findings.push(Finding::for_symbol(
                RuleId::UnusedType,
                decl,
                format!(
                    "{} {} '{}' is never used",
                    decl.accessibility.as_str(),
                    decl.kind.display_name(),
                    decl.name
                ),
            ));
        }

        findings
    }
}

impl Default for UnusedTypeDetector {
    fn default() -> Self {
        Self::new()
    }
}
