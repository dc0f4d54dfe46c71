// Unused non-public member detection (DS003)
//
// Reports each independently-reportable sub-unit once: a property with one
// dead accessor anchors the diagnostic at that accessor's span, not the
// whole property. Members of a type already reported by DS001 are subsumed.

use super::{inside_dead_type, Detector};
use crate::analysis::{Finding, RuleId, UsageResolution};
use crate::config::{Config, RULE_UNUSED_MEMBER};
use crate::graph::{Declaration, DeclarationId, DeclarationKind, Graph};

pub struct UnusedMemberDetector;

impl UnusedMemberDetector {
    pub fn new() -> Self {
        Self
    }

    fn accessor_children<'g>(
        graph: &'g Graph,
        property: &DeclarationId,
    ) -> (Option<&'g Declaration>, Option<&'g Declaration>) {
        let mut getter = None;
        let mut setter = None;
        for child_id in graph.get_children(property) {
            if let Some(child) = graph.get_declaration(child_id) {
                match child.kind {
                    DeclarationKind::Getter => getter = Some(child),
                    DeclarationKind::Setter => setter = Some(child),
                    _ => {}
                }
            }
        }
        (getter, setter)
    }

    fn report_property(
        &self,
        graph: &Graph,
        resolution: &UsageResolution,
        decl: &Declaration,
        report_accessors: bool,
        findings: &mut Vec<Finding>,
    ) {
        let Some(summary) = resolution.summary(&decl.id) else {
            return;
        };
        if summary.exempt.is_some() {
            return;
        }

        if !summary.used {
            // Nothing touches the property at all: one diagnostic for the
            // whole declaration
            findings.push(Finding::for_symbol(
                RuleId::UnusedMember,
                decl,
                format!(
                    "{} {} '{}' is never used",
                    decl.accessibility.as_str(),
                    decl.kind.display_name(),
                    decl.name
                ),
            ));
            return;
        }

        if !report_accessors {
            return;
        }

        let (getter, setter) = Self::accessor_children(graph, &decl.id);

        // Split accessors are independently markable: reads feed the
        // getter, writes feed the setter
        if summary.reads > 0 && summary.writes == 0 {
            if let Some(setter) = setter {
                findings.push(Finding::anchored(
                    RuleId::UnusedMember,
                    decl,
                    &setter.location,
                    format!("set accessor of '{}' is never used", decl.name),
                ));
            }
        } else if summary.writes > 0 && summary.reads == 0 {
            if let Some(getter) = getter {
                findings.push(Finding::anchored(
                    RuleId::UnusedMember,
                    decl,
                    &getter.location,
                    format!("get accessor of '{}' is never used", decl.name),
                ));
            }
        }
    }

    /// Accessors that are candidates on their own (a `private set` inside
    /// an otherwise visible property)
    fn report_standalone_accessor(
        &self,
        graph: &Graph,
        resolution: &UsageResolution,
        decl: &Declaration,
        findings: &mut Vec<Finding>,
    ) {
        let Some(parent) = decl.parent.as_ref().and_then(|p| graph.get_declaration(p)) else {
            return;
        };
        // When the whole property is a candidate the property path reports
        if resolution.summary(&parent.id).is_some() {
            return;
        }
        if !resolution.is_dead(&decl.id) {
            return;
        }

        let accessor = match decl.kind {
            DeclarationKind::Getter => "get",
            _ => "set",
        };
        findings.push(Finding::anchored(
            RuleId::UnusedMember,
            decl,
            &decl.location,
            format!("{} accessor of '{}' is never used", accessor, parent.name),
        ));
    }
}

impl Detector for UnusedMemberDetector {
    fn rule(&self) -> RuleId {
        RuleId::UnusedMember
    }

    fn detect(&self, graph: &Graph, resolution: &UsageResolution, config: &Config) -> Vec<Finding> {
        let report_accessors = config.rule(RULE_UNUSED_MEMBER).report_accessors;
        let mut findings = Vec::new();

        for (id, _summary) in resolution.iter() {
            let Some(decl) = graph.get_declaration(id) else {
                continue;
            };

            if inside_dead_type(graph, resolution, decl) {
                continue;
            }

            match decl.kind {
                DeclarationKind::Property | DeclarationKind::Indexer => {
                    self.report_property(graph, resolution, decl, report_accessors, &mut findings);
                }
                DeclarationKind::Getter | DeclarationKind::Setter => {
                    if report_accessors {
                        self.report_standalone_accessor(graph, resolution, decl, &mut findings);
                    }
                }
                kind if kind.is_member() => {
                    if resolution.is_dead(id) {
                        findings.push(Finding::for_symbol(
                            RuleId::UnusedMember,
                            decl,
                            format!(
                                "{} {} '{}' is never used",
                                decl.accessibility.as_str(),
                                decl.kind.display_name(),
                                decl.name
                            ),
                        ));
                    }
                }
                _ => {}
            }
        }

        findings
    }
}

impl Default for UnusedMemberDetector {
    fn default() -> Self {
        Self::new()
    }
}
