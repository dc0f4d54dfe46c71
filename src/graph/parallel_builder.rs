// Parallel graph builder using rayon

use super::builder::{attribute_references, resolve_all, PendingReference};
use super::{Declaration, Graph};
use crate::discovery::SourceFile;
use crate::parser::{CSharpParser, Parser as SourceParser, ScanFacts};
use miette::Result;
use rayon::prelude::*;
use tracing::{debug, info};

/// Parsed file result
struct ParsedFile {
    declarations: Vec<Declaration>,
    pending: Vec<PendingReference>,
    facts: ScanFacts,
}

/// Parallel graph builder for faster processing of large source trees
pub struct ParallelGraphBuilder;

impl ParallelGraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the graph from source files using parallel parsing
    pub fn build_from_files(&self, files: &[SourceFile]) -> Result<(Graph, ScanFacts)> {
        info!("Parsing {} files in parallel...", files.len());

        let results: Vec<Result<ParsedFile>> = files
            .par_iter()
            .map(|file| self.parse_file(file))
            .collect();

        let mut all_declarations = Vec::new();
        let mut all_pending = Vec::new();
        let mut facts = ScanFacts::default();

        for result in results {
            match result {
                Ok(parsed) => {
                    all_declarations.extend(parsed.declarations);
                    all_pending.extend(parsed.pending);
                    facts.merge(parsed.facts);
                }
                Err(e) => {
                    // Unparsable files are skipped, never fatal
                    debug!("Parse error (continuing): {}", e);
                }
            }
        }

        info!(
            "Parsed {} declarations, {} pending references",
            all_declarations.len(),
            all_pending.len()
        );

        let mut graph = Graph::new();
        for decl in all_declarations {
            graph.add_declaration(decl);
        }

        info!("Resolving references...");
        resolve_all(&mut graph, all_pending);

        Ok((graph, facts))
    }

    fn parse_file(&self, file: &SourceFile) -> Result<ParsedFile> {
        let contents = file.read_contents()?;
        let parser = CSharpParser::new();
        let result = parser.parse(&file.path, &contents)?;

        let pending = attribute_references(&result.declarations, result.references);

        Ok(ParsedFile {
            declarations: result.declarations,
            pending,
            facts: result.facts,
        })
    }
}

impl Default for ParallelGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
