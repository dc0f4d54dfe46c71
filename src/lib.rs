//! deadsharp - Fast unused-symbol detection for C# projects
//!
//! This library provides whole-program static analysis to detect unused
//! non-public symbols (types, members, accessors) in C# source trees.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **File Discovery** - Find all .cs files, flagging generated code
//! 2. **Parsing** - Parse source files using tree-sitter
//! 3. **Graph Building** - Build the symbol arena and usage edges
//! 4. **Candidate Extraction** - Select non-public declarations
//! 5. **Escape Scanning** - Apply attribute/protocol/reflection exemptions
//! 6. **Reachability Resolution** - Self-reference-aware usage fixpoint
//! 7. **Detection & Reporting** - Run the rules, output results

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod graph;
pub mod parser;
pub mod report;

pub use analysis::{CandidateExtractor, Finding, RuleId, Severity, UsageResolver};
pub use config::Config;
pub use discovery::FileFinder;
pub use graph::{Declaration, DeclarationKind, Graph, GraphBuilder, ParallelGraphBuilder};
pub use report::{ReportFormat, Reporter};

use miette::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Outcome of a full analysis run
pub struct AnalysisOutcome {
    pub findings: Vec<Finding>,
    pub files_analyzed: usize,
    pub declarations: usize,
    pub candidates: usize,
}

/// Run the full pipeline over a project root
pub fn analyze(root: &Path, config: &Config, parallel: bool) -> Result<AnalysisOutcome> {
    let finder = FileFinder::new(config);
    let files = finder.find_files(root)?;
    info!("Analyzing {} files", files.len());

    let (graph, facts) = if parallel {
        ParallelGraphBuilder::new().build_from_files(&files)?
    } else {
        let mut builder = GraphBuilder::new();
        for file in &files {
            if let Err(e) = builder.process_file(file) {
                tracing::debug!("Parse error (continuing): {}", e);
            }
        }
        builder.build()
    };

    let generated: HashSet<_> = files
        .iter()
        .filter(|f| f.generated)
        .map(|f| f.path.clone())
        .collect();

    let candidates = CandidateExtractor::new(config, &generated).extract(&graph);
    let resolution = UsageResolver::new(config).resolve(&graph, &candidates, &facts);
    let findings = analysis::detectors::run_all(&graph, &resolution, config);

    Ok(AnalysisOutcome {
        files_analyzed: files.len(),
        declarations: graph.declaration_count(),
        candidates: candidates.len(),
        findings,
    })
}
