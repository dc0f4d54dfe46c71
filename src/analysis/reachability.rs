// Reachability resolution: self-reference-aware usage fixpoint
//
// Usage edges whose site is lexically inside the target's own declaring
// spans never count. The candidate-to-candidate usage graph is condensed
// into strongly connected components; a component is externally used iff
// any member has an inbound counting edge originating outside it. This
// reports recursive-only and mutually-recursive-only cycles whole, without
// recursion-specific special cases. Conditional interface-dispatch edges
// are then propagated to a fixpoint.

use super::candidates::CandidateSet;
use super::escapes::{EscapeScanner, ExemptReason};
use super::preserve::{AccessCategories, PreservationIndex};
use crate::config::{Config, RULE_UNINSTANTIATED_CLASS};
use crate::graph::{Declaration, DeclarationId, DeclarationKind, Graph, ReferenceKind};
use crate::parser::ScanFacts;
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Resolved usage state of one candidate
#[derive(Debug, Clone)]
pub struct UsageSummary {
    /// Externally used: a counting edge from outside the candidate's own
    /// spans and outside its recursion cycle, or dispatch from a live
    /// contract member
    pub used: bool,

    /// Why the candidate is not reportable even without usage
    pub exempt: Option<ExemptReason>,

    /// For types: evidence the type is actually constructed
    pub instantiated: bool,

    /// For properties/indexers: external read-like edges
    pub reads: usize,

    /// For properties/indexers: external write edges
    pub writes: usize,
}

/// Output of the resolver: one summary per candidate
#[derive(Debug, Default)]
pub struct UsageResolution {
    summaries: HashMap<DeclarationId, UsageSummary>,
}

impl UsageResolution {
    pub fn summary(&self, id: &DeclarationId) -> Option<&UsageSummary> {
        self.summaries.get(id)
    }

    /// A candidate with no usage and no exemption
    pub fn is_dead(&self, id: &DeclarationId) -> bool {
        self.summaries
            .get(id)
            .map(|s| !s.used && s.exempt.is_none())
            .unwrap_or(false)
    }

    pub fn candidate_count(&self) -> usize {
        self.summaries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeclarationId, &UsageSummary)> {
        self.summaries.iter()
    }
}

/// Combines candidates, usage edges, and escape exemptions into the
/// reported set
pub struct UsageResolver<'a> {
    config: &'a Config,
}

impl<'a> UsageResolver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn resolve(
        &self,
        graph: &Graph,
        candidates: &CandidateSet,
        facts: &ScanFacts,
    ) -> UsageResolution {
        let preservation = PreservationIndex::build(graph, facts);
        let escapes = EscapeScanner::new(self.config);

        // Phase 1: structural usage via SCC condensation
        let (external, inter_edges) = self.collect_edges(graph, candidates);
        let used = self.scc_usage(candidates, &external, &inter_edges);

        // Phase 2: type exemptions (members consult type liveness)
        let mut exempt: HashMap<DeclarationId, ExemptReason> = HashMap::new();
        for id in candidates.ids() {
            let Some(decl) = graph.get_declaration(id) else {
                continue;
            };
            if decl.kind.is_type() {
                if let Some(reason) = escapes.type_exemption(graph, &preservation, decl) {
                    exempt.insert(id.clone(), reason);
                }
            }
        }

        let type_live = |id: &DeclarationId| -> bool {
            if !candidates.contains(id) {
                return true;
            }
            used.contains(id) || exempt.contains_key(id)
        };

        // Phase 3: member exemptions
        let mut member_exemptions: Vec<(DeclarationId, ExemptReason)> = Vec::new();
        for id in candidates.ids() {
            let Some(decl) = graph.get_declaration(id) else {
                continue;
            };
            if !decl.kind.is_member() && !decl.kind.is_accessor() {
                continue;
            }
            let subject = if decl.kind.is_accessor() {
                decl.parent.as_ref().and_then(|p| graph.get_declaration(p))
            } else {
                Some(decl)
            };
            let Some(subject) = subject else {
                continue;
            };
            let live = nearest_type_ancestor(graph, subject)
                .map(|t| type_live(&t.id))
                .unwrap_or(true);
            if let Some(reason) =
                escapes.member_exemption(graph, &preservation, &facts.demands, subject, live)
            {
                member_exemptions.push((id.clone(), reason));
            }
        }
        exempt.extend(member_exemptions);

        // Phase 4: conditional dispatch fixpoint — a live contract member
        // makes its implementations live
        let dispatch = escapes.dispatch_edges(graph, candidates);
        let mut used = used;
        loop {
            let mut changed = false;
            for (contract, implementation) in &dispatch {
                let contract_live = if candidates.contains(contract) {
                    used.contains(contract) || exempt.contains_key(contract)
                } else {
                    true
                };
                if contract_live && !used.contains(implementation) {
                    used.insert(implementation.clone());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // Phase 5: assemble summaries
        let skip_type_arguments = self
            .config
            .rule(RULE_UNINSTANTIATED_CLASS)
            .skip_type_arguments;

        let mut summaries = HashMap::new();
        for id in candidates.ids() {
            let Some(decl) = graph.get_declaration(id) else {
                continue;
            };

            let (reads, writes) = match decl.kind {
                DeclarationKind::Property | DeclarationKind::Indexer => {
                    property_counts(graph, decl)
                }
                DeclarationKind::Getter | DeclarationKind::Setter => decl
                    .parent
                    .as_ref()
                    .and_then(|p| graph.get_declaration(p))
                    .map(|p| property_counts(graph, p))
                    .unwrap_or((0, 0)),
                _ => (0, 0),
            };

            let is_used = match decl.kind {
                DeclarationKind::Getter => reads > 0,
                DeclarationKind::Setter => writes > 0,
                _ => used.contains(id),
            };

            let instantiated = decl.kind.is_type()
                && (has_instantiation_evidence(graph, decl, skip_type_arguments)
                    || preservation
                        .flags_for(&decl.name)
                        .intersects(AccessCategories(0x7)));

            summaries.insert(
                id.clone(),
                UsageSummary {
                    used: is_used,
                    exempt: exempt.get(id).cloned(),
                    instantiated,
                    reads,
                    writes,
                },
            );
        }

        debug!(
            "{} candidates resolved, {} used, {} exempt",
            summaries.len(),
            summaries.values().filter(|s| s.used).count(),
            summaries.values().filter(|s| s.exempt.is_some()).count(),
        );

        UsageResolution { summaries }
    }

    /// Counting inbound edges, split into external evidence and
    /// candidate-to-candidate edges. Lexically self-contained sites are
    /// dropped here. A usage edge into a member also counts toward every
    /// enclosing candidate type (a member cannot be reached without its
    /// type), subject to the same self-containment test against the
    /// enclosing type's own spans — so cross-member calls inside a dead
    /// type never revive it, while extension-style calls that never name
    /// the containing type still do.
    fn collect_edges(
        &self,
        graph: &Graph,
        candidates: &CandidateSet,
    ) -> (HashSet<DeclarationId>, Vec<(DeclarationId, DeclarationId)>) {
        let mut external = HashSet::new();
        let mut inter_edges = Vec::new();

        for id in candidates.ids() {
            let Some(decl) = graph.get_declaration(id) else {
                continue;
            };

            // The member itself, then every enclosing candidate type
            let mut targets: Vec<&Declaration> = vec![decl];
            let mut current = decl.parent.clone();
            while let Some(parent_id) = current {
                let Some(parent) = graph.get_declaration(&parent_id) else {
                    break;
                };
                if parent.kind.is_type() && candidates.contains(&parent.id) {
                    targets.push(parent);
                }
                current = parent.parent.clone();
            }

            for (source, reference) in graph.incoming_usages(id) {
                if !reference.kind.counts_as_usage() {
                    continue;
                }
                if decl.kind == DeclarationKind::Constructor
                    && !constructor_counting_kind(reference.kind)
                {
                    continue;
                }

                for target in &targets {
                    if target.contains_site(&reference.location) {
                        continue;
                    }

                    match source {
                        None => {
                            external.insert(target.id.clone());
                        }
                        Some(source_decl) => {
                            let source_id = graph.canonical(&source_decl.id);
                            if candidates.contains(&source_id) {
                                inter_edges.push((source_id, target.id.clone()));
                            } else {
                                external.insert(target.id.clone());
                            }
                        }
                    }
                }
            }
        }

        (external, inter_edges)
    }

    /// Condense the candidate usage graph and test each component against
    /// the external-inbound-edge predicate
    fn scc_usage(
        &self,
        candidates: &CandidateSet,
        external: &HashSet<DeclarationId>,
        inter_edges: &[(DeclarationId, DeclarationId)],
    ) -> HashSet<DeclarationId> {
        let mut scc_graph: DiGraph<DeclarationId, ()> = DiGraph::new();
        let mut node_of = HashMap::new();
        for id in candidates.ids() {
            node_of.insert(id.clone(), scc_graph.add_node(id.clone()));
        }
        for (source, target) in inter_edges {
            if let (Some(&s), Some(&t)) = (node_of.get(source), node_of.get(target)) {
                scc_graph.add_edge(s, t, ());
            }
        }

        let mut used = HashSet::new();
        for scc in tarjan_scc(&scc_graph) {
            let members: HashSet<DeclarationId> = scc
                .iter()
                .filter_map(|&idx| scc_graph.node_weight(idx).cloned())
                .collect();

            let has_external = members.iter().any(|m| external.contains(m))
                || inter_edges
                    .iter()
                    .any(|(s, t)| members.contains(t) && !members.contains(s));

            if has_external {
                used.extend(members);
            }
        }
        used
    }
}

/// Counting kinds for constructors: only evidence the type is constructed
/// (or reflected over) marks a constructor, so mere type mentions do not
/// revive a dead one
fn constructor_counting_kind(kind: ReferenceKind) -> bool {
    matches!(
        kind,
        ReferenceKind::Instantiation
            | ReferenceKind::TypeOf
            | ReferenceKind::AttributeUsage
            | ReferenceKind::Reflection
            | ReferenceKind::TypeArgument
            | ReferenceKind::Invocation
    )
}

fn has_instantiation_evidence(graph: &Graph, decl: &Declaration, type_arguments_count: bool) -> bool {
    graph.incoming_usages(&decl.id).iter().any(|(_, r)| {
        if decl.contains_site(&r.location) {
            return false;
        }
        r.kind.is_instantiation()
            || r.kind == ReferenceKind::Reflection
            || r.kind == ReferenceKind::Inheritance
            || (type_arguments_count && r.kind == ReferenceKind::TypeArgument)
    })
}

/// External read/write edge counts for a property or indexer
fn property_counts(graph: &Graph, decl: &Declaration) -> (usize, usize) {
    let mut reads = 0;
    let mut writes = 0;
    for (_, reference) in graph.incoming_usages(&decl.id) {
        if !reference.kind.counts_as_usage() || decl.contains_site(&reference.location) {
            continue;
        }
        if reference.kind.is_write() {
            writes += 1;
        }
        if reference.kind.is_read() || reference.kind == ReferenceKind::TypeOf {
            reads += 1;
        }
        // Reflective access can go either way
        if reference.kind == ReferenceKind::Reflection {
            writes += 1;
        }
    }
    (reads, writes)
}

/// The nearest enclosing type declaration
pub fn nearest_type_ancestor<'g>(graph: &'g Graph, decl: &Declaration) -> Option<&'g Declaration> {
    let mut current = decl.parent.clone();
    while let Some(parent_id) = current {
        let parent = graph.get_declaration(&parent_id)?;
        if parent.kind.is_type() {
            return Some(parent);
        }
        current = parent.parent.clone();
    }
    None
}
