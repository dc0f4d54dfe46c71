// Parser utilities shared by the C# front end

use crate::graph::{Declaration, Location, UnresolvedReference};
use miette::Result;
use std::collections::HashSet;
use std::path::Path;

/// Result of parsing a source file
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Declarations found in the file
    pub declarations: Vec<Declaration>,

    /// Unresolved references that need to be resolved against other files
    pub references: Vec<UnresolvedReference>,

    /// Namespace of the file (file-scoped or first block namespace)
    pub namespace: Option<String>,

    /// Using directives. Plain paths ("Acme.Orders"), aliases encoded as
    /// "Acme.Orders.Validator as V", static imports as "static Acme.Math".
    pub usings: Vec<String>,

    /// Syntax facts consumed by the escape analysis
    pub facts: ScanFacts,
}

impl ParseResult {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compilation-wide syntax facts gathered while scanning: which protocol
/// consumption constructs exist anywhere, which declarations are annotated
/// reflection sinks, and which `typeof` expressions flow where.
#[derive(Debug, Default, Clone)]
pub struct ScanFacts {
    pub demands: ProtocolDemands,
    pub sinks: Vec<PreserveSink>,
    pub flows: Vec<TypeOfFlow>,
}

impl ScanFacts {
    pub fn merge(&mut self, other: ScanFacts) {
        self.demands.merge(&other.demands);
        self.sinks.extend(other.sinks);
        self.flows.extend(other.flows);
    }
}

/// Presence of the syntax constructs that consume protocol/convention
/// methods. Without a semantic model the scanner cannot type the consuming
/// expression, so demand is tracked per construct for the whole source set.
#[derive(Debug, Default, Clone)]
pub struct ProtocolDemands {
    pub has_foreach: bool,
    pub has_await_foreach: bool,
    pub has_await: bool,
    pub has_using: bool,
    pub has_await_using: bool,
    pub has_deconstruction: bool,
    pub has_collection_initializer: bool,
    pub has_element_access: bool,
    /// Operator tokens appearing in expressions ("+", "==", "!", ...)
    pub operator_tokens: HashSet<String>,
}

impl ProtocolDemands {
    pub fn merge(&mut self, other: &ProtocolDemands) {
        self.has_foreach |= other.has_foreach;
        self.has_await_foreach |= other.has_await_foreach;
        self.has_await |= other.has_await;
        self.has_using |= other.has_using;
        self.has_await_using |= other.has_await_using;
        self.has_deconstruction |= other.has_deconstruction;
        self.has_collection_initializer |= other.has_collection_initializer;
        self.has_element_access |= other.has_element_access;
        self.operator_tokens.extend(other.operator_tokens.iter().cloned());
    }
}

/// Where a preservation-flags attribute sits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    /// Nth parameter of a method
    Parameter(usize),
    /// Method return value (`[return: ...]`)
    Return,
    /// A `System.Type`-typed field or property
    Member,
    /// Nth type parameter of a method or type
    TypeParameter(usize),
}

/// A `System.Type`-typed location annotated with preservation flags
/// (`DynamicallyAccessedMembers`). `typeof(X)` values flowing here preserve
/// the flagged member categories of X.
#[derive(Debug, Clone)]
pub struct PreserveSink {
    /// Simple name of the owning method/field/property/type
    pub owner: String,
    pub kind: SinkKind,
    /// Raw flags argument text, parsed by the preservation analysis
    pub flags_expr: String,
}

/// Where a `typeof` expression flowed, syntactically
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowSite {
    /// `M(typeof(X))` — argument `index` of an invocation of `callee`
    Argument { callee: String, index: usize },
    /// `f = typeof(X)` or `var f = typeof(X)` — assignment to `target`
    Assignment { target: String },
    /// `return typeof(X);` inside `method`
    Return { method: String },
    /// `M<X>()` or `new W<X>()` — explicit generic argument `index` of `owner`
    GenericArgument { owner: String, index: usize },
}

/// One bounded, syntactic `typeof` flow fact
#[derive(Debug, Clone)]
pub struct TypeOfFlow {
    /// Simple name of the type inside `typeof(...)`
    pub type_name: String,
    pub site: FlowSite,
}

/// Trait for language parsers (the plugin seam shared with any future
/// front end)
pub trait Parser {
    /// Parse a source file and extract declarations, references, and facts
    fn parse(&self, path: &Path, contents: &str) -> Result<ParseResult>;
}

/// Helper to convert tree-sitter positions to a Location
pub fn node_location(file: &Path, node: tree_sitter::Node) -> Location {
    let start = node.start_position();
    Location::new(
        file.to_path_buf(),
        start.row + 1,
        start.column + 1,
        node.start_byte(),
        node.end_byte(),
    )
}

/// Extract text from a node
pub fn node_text<'a>(node: tree_sitter::Node<'a>, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Rightmost identifier segment of a possibly-qualified, possibly-generic
/// type or member text ("Acme.Orders.Validator<T>" -> "Validator").
pub fn simple_type_name(text: &str) -> &str {
    let text = text.trim();
    let text = text.split('<').next().unwrap_or(text);
    let text = text.trim_end_matches(['?', '*', ' ']);
    let text = text.split('[').next().unwrap_or(text);
    text.rsplit('.').next().unwrap_or(text).trim()
}
