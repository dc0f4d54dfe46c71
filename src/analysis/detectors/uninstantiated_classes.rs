// Uninstantiated internal class detection (DS002)
//
// Fires for concrete non-public classes/structs that are referenced
// somewhere (so DS001 stays quiet) yet carry no instantiation evidence:
// no object creation, no typeof/reflection, no attribute usage, no
// derived type, and no constructor-preserving flags.

use super::Detector;
use crate::analysis::{Finding, RuleId, UsageResolution};
use crate::config::Config;
use crate::graph::{Declaration, Graph};

pub struct UninstantiatedClassDetector;

impl UninstantiatedClassDetector {
    pub fn new() -> Self {
        Self
    }

    fn eligible(decl: &Declaration) -> bool {
        if !decl.kind.is_instantiable_type() {
            return false;
        }
        // Static classes cannot be instantiated, abstract ones only via
        // derived types
        if decl.is_static || decl.is_abstract {
            return false;
        }
        if decl.modifiers.iter().any(|m| m == "static" || m == "abstract") {
            return false;
        }
        // Attribute types are constructed by attribute usage
        if decl.name.ends_with("Attribute") {
            return false;
        }
        if decl
            .super_types
            .iter()
            .any(|s| s.ends_with("Attribute") || s == "Attribute")
        {
            return false;
        }
        true
    }
}

impl Detector for UninstantiatedClassDetector {
    fn rule(&self) -> RuleId {
        RuleId::UninstantiatedClass
    }

    fn detect(&self, graph: &Graph, resolution: &UsageResolution, _config: &Config) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (id, summary) in resolution.iter() {
            let Some(decl) = graph.get_declaration(id) else {
                continue;
            };
            if !Self::eligible(decl) {
                continue;
            }
            if is_static_holder(graph, decl) {
                continue;
            }
            // A constructor exempted by attribute (serializer entry points
            // and the like) implies reflective construction
            if has_exempt_constructor(graph, resolution, decl) {
                continue;
            }
            // Completely unused types belong to DS001
            if !summary.used || summary.exempt.is_some() {
                continue;
            }
            if summary.instantiated {
                continue;
            }

            findings.push(Finding::for_symbol(
                RuleId::UninstantiatedClass,
                decl,
                format!(
                    "{} {} '{}' is never instantiated",
                    decl.accessibility.as_str(),
                    decl.kind.display_name(),
                    decl.name
                ),
            ));
        }

        findings
    }
}

impl Default for UninstantiatedClassDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn has_exempt_constructor(
    graph: &Graph,
    resolution: &UsageResolution,
    decl: &Declaration,
) -> bool {
    graph.get_children(&decl.id).iter().any(|id| {
        graph
            .get_declaration(id)
            .map(|d| d.kind == crate::graph::DeclarationKind::Constructor)
            .unwrap_or(false)
            && resolution
                .summary(id)
                .map(|s| s.exempt.is_some())
                .unwrap_or(false)
    })
}

/// A type whose members are all static is a utility holder; instantiation
/// is beside the point even without the `static` modifier
fn is_static_holder(graph: &Graph, decl: &Declaration) -> bool {
    let members: Vec<&Declaration> = graph
        .get_children(&decl.id)
        .iter()
        .filter_map(|id| graph.get_declaration(id))
        .filter(|d| d.kind.is_member())
        .collect();

    !members.is_empty()
        && members
            .iter()
            .all(|m| m.is_static || m.kind == crate::graph::DeclarationKind::Constructor)
}
