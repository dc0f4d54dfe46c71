// Symbol graph module

mod builder;
mod declaration;
mod parallel_builder;
pub mod reference;

pub use builder::GraphBuilder;
pub use declaration::{attribute_name, Accessibility, Declaration, DeclarationId, DeclarationKind, Location};
pub use parallel_builder::ParallelGraphBuilder;
pub use reference::{Reference, ReferenceCollector, ReferenceKind, UnresolvedReference};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// The symbol arena: every declaration in the analyzed source set plus the
/// usage edges between them. Nodes are `DeclarationId`s, edges are resolved
/// `Reference`s. References made from file scope (top-level statements,
/// using directives) have no source node and live in a separate bucket.
#[derive(Debug, Default)]
pub struct Graph {
    /// The underlying directed graph
    inner: DiGraph<DeclarationId, Reference>,

    /// Map from DeclarationId to node index
    node_map: HashMap<DeclarationId, NodeIndex>,

    /// Map from DeclarationId to Declaration details
    declarations: HashMap<DeclarationId, Declaration>,

    /// Map from simple name to possible declarations (for resolution).
    /// Accessors are deliberately not indexed; their liveness is derived
    /// from the owning property's read/write edges.
    name_index: HashMap<String, Vec<DeclarationId>>,

    /// Map from fully qualified name to declaration
    fqn_index: HashMap<String, DeclarationId>,

    /// Map from parent to children (members, nested types, accessors)
    children_index: HashMap<DeclarationId, Vec<DeclarationId>>,

    /// Partial declarations merged into a canonical symbol: span -> canonical
    aliases: HashMap<DeclarationId, DeclarationId>,

    /// References whose site is file scope (no enclosing declaration)
    external_refs: HashMap<DeclarationId, Vec<Reference>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a possibly-merged partial span to its canonical symbol id
    pub fn canonical(&self, id: &DeclarationId) -> DeclarationId {
        self.aliases.get(id).cloned().unwrap_or_else(|| id.clone())
    }

    /// Add a declaration to the graph. A `partial` declaration whose
    /// fully qualified name and kind match an already-registered partial is
    /// merged into that symbol instead of creating a second node.
    pub fn add_declaration(&mut self, mut decl: Declaration) -> DeclarationId {
        if let Some(parent) = decl.parent.take() {
            decl.parent = Some(self.canonical(&parent));
        }

        if decl.is_partial {
            if let Some(fqn) = &decl.fully_qualified_name {
                if let Some(existing_id) = self.fqn_index.get(fqn).cloned() {
                    let merged = self
                        .declarations
                        .get_mut(&existing_id)
                        .filter(|d| d.kind == decl.kind && d.is_partial);
                    if let Some(existing) = merged {
                        existing.extra_spans.push(decl.id.clone());
                        existing.attributes.extend(decl.attributes.iter().cloned());
                        let new_super_types: Vec<_> = decl
                            .super_types
                            .iter()
                            .filter(|s| !existing.super_types.contains(s))
                            .cloned()
                            .collect();
                        existing.super_types.extend(new_super_types);
                        self.aliases.insert(decl.id.clone(), existing_id.clone());
                        return existing_id;
                    }
                }
            }
        }

        let id = decl.id.clone();

        let node_idx = self.inner.add_node(id.clone());
        self.node_map.insert(id.clone(), node_idx);

        if !decl.kind.is_accessor() {
            self.name_index
                .entry(decl.name.clone())
                .or_default()
                .push(id.clone());

            if let Some(fqn) = &decl.fully_qualified_name {
                self.fqn_index.insert(fqn.clone(), id.clone());
            }
        }

        if let Some(parent_id) = &decl.parent {
            self.children_index
                .entry(parent_id.clone())
                .or_default()
                .push(id.clone());
        }

        self.declarations.insert(id.clone(), decl);

        id
    }

    /// Add a usage edge between two declarations
    pub fn add_reference(&mut self, from: &DeclarationId, to: &DeclarationId, reference: Reference) {
        let from = self.canonical(from);
        let to = self.canonical(to);
        if let (Some(&from_idx), Some(&to_idx)) = (self.node_map.get(&from), self.node_map.get(&to)) {
            self.inner.add_edge(from_idx, to_idx, reference);
        }
    }

    /// Add a usage edge whose site has no enclosing declaration
    /// (top-level statements). Always external evidence.
    pub fn add_external_reference(&mut self, to: &DeclarationId, reference: Reference) {
        let to = self.canonical(to);
        self.external_refs.entry(to).or_default().push(reference);
    }

    pub fn get_declaration(&self, id: &DeclarationId) -> Option<&Declaration> {
        self.declarations.get(&self.canonical(id))
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values()
    }

    pub fn declaration_ids(&self) -> impl Iterator<Item = &DeclarationId> {
        self.declarations.keys()
    }

    pub fn find_by_name(&self, name: &str) -> Vec<&Declaration> {
        self.name_index
            .get(name)
            .map(|ids| ids.iter().filter_map(|id| self.declarations.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn find_by_fqn(&self, fqn: &str) -> Option<&Declaration> {
        self.fqn_index.get(fqn).and_then(|id| self.declarations.get(id))
    }

    /// All usage edges into `id`: `(source declaration, reference)` for edges
    /// between declarations, `(None, reference)` for file-scope sites.
    pub fn incoming_usages(&self, id: &DeclarationId) -> Vec<(Option<&Declaration>, &Reference)> {
        let id = self.canonical(id);
        let mut result: Vec<(Option<&Declaration>, &Reference)> = Vec::new();

        if let Some(&node_idx) = self.node_map.get(&id) {
            for edge in self.inner.edges_directed(node_idx, petgraph::Direction::Incoming) {
                if let Some(source_id) = self.inner.node_weight(edge.source()) {
                    result.push((self.declarations.get(source_id), edge.weight()));
                }
            }
        }

        if let Some(refs) = self.external_refs.get(&id) {
            for r in refs {
                result.push((None, r));
            }
        }

        result
    }

    /// All declarations this declaration references
    pub fn outgoing_usages(&self, id: &DeclarationId) -> Vec<(&Declaration, &Reference)> {
        let id = self.canonical(id);
        let Some(&node_idx) = self.node_map.get(&id) else {
            return Vec::new();
        };

        self.inner
            .edges_directed(node_idx, petgraph::Direction::Outgoing)
            .filter_map(|edge| {
                let target_id = self.inner.node_weight(edge.target())?;
                let decl = self.declarations.get(target_id)?;
                Some((decl, edge.weight()))
            })
            .collect()
    }

    /// Check if any counting usage edge points at this declaration
    pub fn is_referenced(&self, id: &DeclarationId) -> bool {
        self.incoming_usages(id)
            .iter()
            .any(|(_, r)| r.kind.counts_as_usage())
    }

    /// Count read-like references to a declaration, excluding sites inside
    /// the declaration's own spans
    pub fn count_reads(&self, id: &DeclarationId) -> usize {
        self.count_external(id, |k| k.is_read() || matches!(k, ReferenceKind::TypeOf))
    }

    /// Count write references to a declaration, excluding sites inside the
    /// declaration's own spans
    pub fn count_writes(&self, id: &DeclarationId) -> usize {
        self.count_external(id, |k| k.is_write())
    }

    fn count_external(&self, id: &DeclarationId, pred: impl Fn(ReferenceKind) -> bool) -> usize {
        let Some(decl) = self.get_declaration(id) else {
            return 0;
        };
        self.incoming_usages(id)
            .iter()
            .filter(|(_, r)| pred(r.kind) && !decl.contains_site(&r.location))
            .count()
    }

    pub fn get_children(&self, id: &DeclarationId) -> Vec<&DeclarationId> {
        self.children_index
            .get(&self.canonical(id))
            .map(|children| children.iter().collect())
            .unwrap_or_default()
    }

    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    pub fn reference_count(&self) -> usize {
        self.inner.edge_count() + self.external_refs.values().map(Vec::len).sum::<usize>()
    }

    /// The underlying petgraph for SCC computation
    pub fn inner(&self) -> &DiGraph<DeclarationId, Reference> {
        &self.inner
    }

    pub fn node_index(&self, id: &DeclarationId) -> Option<NodeIndex> {
        self.node_map.get(&self.canonical(id)).copied()
    }
}
