use super::{Declaration, DeclarationId, Graph, Location, Reference, ReferenceKind};
use crate::discovery::SourceFile;
use crate::parser::{CSharpParser, Parser as SourceParser, ScanFacts};
use miette::Result;
use tracing::debug;

/// Builder for constructing the symbol graph from source files
pub struct GraphBuilder {
    graph: Graph,
    parser: CSharpParser,
    facts: ScanFacts,
    pending: Vec<PendingReference>,
}

/// A reference attributed to its enclosing declaration (or file scope),
/// awaiting name resolution once every file is parsed
pub(crate) struct PendingReference {
    /// Innermost enclosing declaration of the reference site; None for
    /// file scope (top-level statements)
    pub from: Option<DeclarationId>,
    pub name: String,
    pub qualified_name: Option<String>,
    pub kind: ReferenceKind,
    pub location: Location,
    pub usings: Vec<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            parser: CSharpParser::new(),
            facts: ScanFacts::default(),
            pending: Vec::new(),
        }
    }

    /// Parse a source file and add its declarations to the graph
    pub fn process_file(&mut self, file: &SourceFile) -> Result<()> {
        let contents = file.read_contents()?;
        debug!("Parsing C# file: {}", file.path.display());

        let parse_result = self.parser.parse(&file.path, &contents)?;

        self.pending.extend(attribute_references(
            &parse_result.declarations,
            parse_result.references,
        ));

        for decl in parse_result.declarations {
            self.graph.add_declaration(decl);
        }

        self.facts.merge(parse_result.facts);

        Ok(())
    }

    /// Build the final graph, resolving all references
    pub fn build(mut self) -> (Graph, ScanFacts) {
        let pending = std::mem::take(&mut self.pending);
        resolve_all(&mut self.graph, pending);
        (self.graph, self.facts)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Attribute each reference to the innermost declaration containing its
/// site. References outside every declaration (top-level statements) stay
/// unattributed and count as file-scope — external by construction.
pub(crate) fn attribute_references(
    declarations: &[Declaration],
    references: Vec<crate::graph::UnresolvedReference>,
) -> Vec<PendingReference> {
    references
        .into_iter()
        .map(|unresolved| {
            let ref_byte = unresolved.location.start_byte;

            let from = declarations
                .iter()
                .filter(|d| {
                    d.location.file == unresolved.location.file
                        && d.id.start <= ref_byte
                        && d.id.end >= ref_byte
                })
                .min_by_key(|d| d.id.end - d.id.start)
                .map(|d| d.id.clone());

            PendingReference {
                from,
                name: unresolved.name,
                qualified_name: unresolved.qualified_name,
                kind: unresolved.kind,
                location: unresolved.location,
                usings: unresolved.usings,
            }
        })
        .collect()
}

/// Resolve all pending references and add the resulting edges
pub(crate) fn resolve_all(graph: &mut Graph, pending: Vec<PendingReference>) {
    for unresolved in pending {
        let resolved_ids = resolve_reference(graph, &unresolved);
        for to_id in resolved_ids {
            // A declaration's own name inside its own span never counts;
            // the resolver re-checks containment for the general case
            if unresolved.from.as_ref() == Some(&to_id) {
                continue;
            }

            let reference = Reference::new(
                unresolved.kind,
                unresolved.location.clone(),
                unresolved.name.clone(),
            );

            match &unresolved.from {
                Some(from) => graph.add_reference(from, &to_id, reference),
                None => graph.add_external_reference(&to_id, reference),
            }
        }
    }
}

/// Resolve a reference to declarations. Returns every plausible target:
/// ambiguity (overloads, same-named members) conservatively marks them all.
fn resolve_reference(graph: &Graph, unresolved: &PendingReference) -> Vec<DeclarationId> {
    // Fully qualified form first
    if let Some(fqn) = &unresolved.qualified_name {
        if let Some(decl) = graph.find_by_fqn(fqn) {
            return vec![decl.id.clone()];
        }
    }

    // Using directives
    for using in &unresolved.usings {
        if let Some((path, alias)) = using.split_once(" as ") {
            if alias == unresolved.name {
                if let Some(decl) = graph.find_by_fqn(path) {
                    return vec![decl.id.clone()];
                }
            }
        } else if let Some(path) = using.strip_prefix("static ") {
            let fqn = format!("{}.{}", path, unresolved.name);
            if let Some(decl) = graph.find_by_fqn(&fqn) {
                return vec![decl.id.clone()];
            }
        } else {
            let fqn = format!("{}.{}", using, unresolved.name);
            if let Some(decl) = graph.find_by_fqn(&fqn) {
                return vec![decl.id.clone()];
            }
        }
    }

    // Simple name fan-out: mark every candidate with the same name
    graph
        .find_by_name(&unresolved.name)
        .iter()
        .map(|c| c.id.clone())
        .collect()
}
