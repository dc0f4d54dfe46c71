// Candidate extraction: which declarations are eligible for reporting
//
// A candidate is a declaration whose effective accessibility, considering
// the whole nesting chain, is below externally-visible. Structural
// exclusions (abstract class members, static constructors, explicit
// implementations of external contracts, entry points, generated files,
// retained names) are applied here, before any usage is considered.

use crate::config::Config;
use crate::graph::{Declaration, DeclarationId, DeclarationKind, Graph};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// The set of declarations eligible for dead-symbol reporting
#[derive(Debug, Default)]
pub struct CandidateSet {
    ids: HashSet<DeclarationId>,
}

impl CandidateSet {
    pub fn contains(&self, id: &DeclarationId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &DeclarationId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Extracts candidate symbols from the graph
pub struct CandidateExtractor<'a> {
    config: &'a Config,
    generated_files: &'a HashSet<PathBuf>,
}

impl<'a> CandidateExtractor<'a> {
    pub fn new(config: &'a Config, generated_files: &'a HashSet<PathBuf>) -> Self {
        Self {
            config,
            generated_files,
        }
    }

    pub fn extract(&self, graph: &Graph) -> CandidateSet {
        let mut ids = HashSet::new();

        for decl in graph.declarations() {
            if self.is_candidate(graph, decl) {
                ids.insert(decl.id.clone());
            }
        }

        debug!("{} candidate symbols", ids.len());
        CandidateSet { ids }
    }

    fn is_candidate(&self, graph: &Graph, decl: &Declaration) -> bool {
        if effective_externally_visible(graph, decl) {
            return false;
        }

        // Symbols in generated files are never actionable
        if self.generated_files.contains(&decl.location.file) {
            return false;
        }

        // Abstract class members cannot be "unused" in the actionable
        // sense; interface members stay in (they anchor the
        // interface-satisfaction analysis)
        if decl.is_abstract && !self.is_interface_member(graph, decl) {
            return false;
        }

        // Static constructors run implicitly
        if decl.kind == DeclarationKind::Constructor && decl.is_static {
            return false;
        }

        // Explicit implementations of an external/public contract: the
        // contract member, not the implementation, is the usage surface
        if let Some(iface) = &decl.explicit_interface {
            if !resolves_to_internal_interface(graph, iface) {
                return false;
            }
        }

        // Application entry points
        if decl.kind == DeclarationKind::Method && decl.name == "Main" && decl.is_static {
            return false;
        }

        if self.config.should_retain(&decl.name) {
            return false;
        }
        if self
            .config
            .entry_points
            .iter()
            .any(|e| decl.matches_pattern(e))
        {
            return false;
        }

        true
    }

    fn is_interface_member(&self, graph: &Graph, decl: &Declaration) -> bool {
        let Some(parent) = &decl.parent else {
            return false;
        };
        graph
            .get_declaration(parent)
            .map(|p| p.kind == DeclarationKind::Interface)
            .unwrap_or(false)
    }
}

/// Whether a declaration is visible outside the assembly, considering its
/// own accessibility and every enclosing declaration's
pub fn effective_externally_visible(graph: &Graph, decl: &Declaration) -> bool {
    if !decl.accessibility.is_externally_visible() {
        return false;
    }

    let mut current = decl.parent.clone();
    while let Some(parent_id) = current {
        let Some(parent) = graph.get_declaration(&parent_id) else {
            break;
        };
        if !parent.accessibility.is_externally_visible() {
            return false;
        }
        current = parent.parent.clone();
    }

    true
}

/// Whether an interface name resolves to a non-public interface declared
/// in the analyzed sources
pub fn resolves_to_internal_interface(graph: &Graph, name: &str) -> bool {
    let simple = name.rsplit('.').next().unwrap_or(name);
    let simple = simple.split('<').next().unwrap_or(simple);
    graph
        .find_by_name(simple)
        .into_iter()
        .any(|d| d.kind == DeclarationKind::Interface && !effective_externally_visible(graph, d))
}
