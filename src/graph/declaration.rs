// Declaration types for the C# symbol arena

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclarationId {
    /// File path
    pub file: PathBuf,
    /// Starting byte offset in file
    pub start: usize,
    /// Ending byte offset in file
    pub end: usize,
}

impl DeclarationId {
    pub fn new(file: PathBuf, start: usize, end: usize) -> Self {
        Self { file, start, end }
    }
}

impl std::fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.start, self.end)
    }
}

/// Kind of declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    // Types
    Class,
    Struct,
    Record,
    RecordStruct,
    Interface,
    Enum,
    Delegate,

    // Members
    Method,
    Constructor,
    Field,
    Property,
    Getter,
    Setter,
    Event,
    Indexer,
    Operator,
    ConversionOperator,
}

impl DeclarationKind {
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Class
                | DeclarationKind::Struct
                | DeclarationKind::Record
                | DeclarationKind::RecordStruct
                | DeclarationKind::Interface
                | DeclarationKind::Enum
                | DeclarationKind::Delegate
        )
    }

    /// Types that can be instantiated with `new`
    pub fn is_instantiable_type(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Class
                | DeclarationKind::Struct
                | DeclarationKind::Record
                | DeclarationKind::RecordStruct
        )
    }

    pub fn is_member(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Method
                | DeclarationKind::Constructor
                | DeclarationKind::Field
                | DeclarationKind::Property
                | DeclarationKind::Event
                | DeclarationKind::Indexer
                | DeclarationKind::Operator
                | DeclarationKind::ConversionOperator
        )
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, DeclarationKind::Getter | DeclarationKind::Setter)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Struct => "struct",
            DeclarationKind::Record => "record",
            DeclarationKind::RecordStruct => "record struct",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Enum => "enum",
            DeclarationKind::Delegate => "delegate",
            DeclarationKind::Method => "method",
            DeclarationKind::Constructor => "constructor",
            DeclarationKind::Field => "field",
            DeclarationKind::Property => "property",
            DeclarationKind::Getter => "get accessor",
            DeclarationKind::Setter => "set accessor",
            DeclarationKind::Event => "event",
            DeclarationKind::Indexer => "indexer",
            DeclarationKind::Operator => "operator",
            DeclarationKind::ConversionOperator => "conversion operator",
        }
    }
}

/// Declared accessibility of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accessibility {
    Public,
    ProtectedInternal,
    Protected,
    Internal,
    PrivateProtected,
    Private,
}

impl Accessibility {
    /// Parse from the modifier keywords present on a declaration.
    /// `default` supplies the context default (internal for top-level types,
    /// private for class/struct members, public for interface members).
    pub fn from_modifiers(modifiers: &[String], default: Accessibility) -> Self {
        let has = |m: &str| modifiers.iter().any(|x| x == m);
        if has("public") {
            Accessibility::Public
        } else if has("private") && has("protected") {
            Accessibility::PrivateProtected
        } else if has("protected") && has("internal") {
            Accessibility::ProtectedInternal
        } else if has("private") {
            Accessibility::Private
        } else if has("protected") {
            Accessibility::Protected
        } else if has("internal") {
            Accessibility::Internal
        } else {
            default
        }
    }

    /// Whether this accessibility, on its own, is visible outside the
    /// assembly. `protected` and `protected internal` members are reachable
    /// from external subclasses, so they count as externally visible.
    pub fn is_externally_visible(&self) -> bool {
        matches!(
            self,
            Accessibility::Public | Accessibility::Protected | Accessibility::ProtectedInternal
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Accessibility::Public => "public",
            Accessibility::ProtectedInternal => "protected internal",
            Accessibility::Protected => "protected",
            Accessibility::Internal => "internal",
            Accessibility::PrivateProtected => "private protected",
            Accessibility::Private => "private",
        }
    }
}

/// Location in source code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Starting byte offset
    pub start_byte: usize,
    /// Ending byte offset
    pub end_byte: usize,
}

impl Location {
    pub fn new(file: PathBuf, line: usize, column: usize, start_byte: usize, end_byte: usize) -> Self {
        Self {
            file,
            line,
            column,
            start_byte,
            end_byte,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// A declaration in the source code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    /// Unique identifier (primary declaring span)
    pub id: DeclarationId,

    /// Simple name (e.g., "OrderValidator"; operators use "operator +")
    pub name: String,

    /// Fully qualified name (e.g., "Acme.Orders.OrderValidator")
    pub fully_qualified_name: Option<String>,

    /// Kind of declaration
    pub kind: DeclarationKind,

    /// Declared accessibility
    pub accessibility: Accessibility,

    /// Location in source code
    pub location: Location,

    /// Parent declaration (containing type for a member or nested type,
    /// property for an accessor)
    pub parent: Option<DeclarationId>,

    /// Whether this is a static member
    pub is_static: bool,

    /// Whether this is an abstract member
    pub is_abstract: bool,

    /// Whether this declaration carries the `partial` modifier
    pub is_partial: bool,

    /// Additional declaring spans merged from partial declarations
    pub extra_spans: Vec<DeclarationId>,

    /// Raw attribute texts on this declaration (e.g., "Fact",
    /// "DynamicallyAccessedMembers(DynamicallyAccessedMemberTypes.PublicMethods)")
    pub attributes: Vec<String>,

    /// Base list (base class and implemented interfaces, for types)
    pub super_types: Vec<String>,

    /// Modifier keywords
    pub modifiers: Vec<String>,

    /// Parameter type texts (for methods, constructors, operators, indexers)
    pub parameters: Vec<String>,

    /// Return/member type text
    pub return_type: Option<String>,

    /// Interface name for explicit interface implementations
    /// (`void IService.Run()` stores "IService")
    pub explicit_interface: Option<String>,
}

impl Declaration {
    pub fn new(
        id: DeclarationId,
        name: String,
        kind: DeclarationKind,
        accessibility: Accessibility,
        location: Location,
    ) -> Self {
        Self {
            id,
            name,
            fully_qualified_name: None,
            kind,
            accessibility,
            location,
            parent: None,
            is_static: false,
            is_abstract: false,
            is_partial: false,
            extra_spans: Vec::new(),
            attributes: Vec::new(),
            super_types: Vec::new(),
            modifiers: Vec::new(),
            parameters: Vec::new(),
            return_type: None,
            explicit_interface: None,
        }
    }

    /// Whether a source location falls lexically within any declaring span
    /// of this symbol (primary or merged partial spans).
    pub fn contains_site(&self, site: &Location) -> bool {
        let within = |span: &DeclarationId| {
            span.file == site.file && span.start <= site.start_byte && site.end_byte <= span.end
        };
        within(&self.id) || self.extra_spans.iter().any(within)
    }

    /// Whether any attribute on this declaration matches the given simple
    /// name, with or without the `Attribute` suffix.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| {
            let head = attribute_name(a);
            head == name || head == format!("{name}Attribute") || format!("{head}Attribute") == name
        })
    }

    /// Whether a configured pattern matches this declaration's simple or
    /// fully qualified name. Supports leading/trailing `*` wildcards.
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        if let Some(suffix) = pattern.strip_prefix('*') {
            self.name.ends_with(suffix)
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            self.name.starts_with(prefix)
        } else {
            self.name == pattern
                || self
                    .fully_qualified_name
                    .as_deref()
                    .map(|fqn| fqn == pattern)
                    .unwrap_or(false)
        }
    }

    /// Display string for messages
    pub fn display(&self) -> String {
        format!("{} {} ({})", self.kind.display_name(), self.name, self.location)
    }
}

/// Simple name of an attribute usage text ("Fact", "Theory(...)" -> "Theory").
pub fn attribute_name(raw: &str) -> &str {
    let raw = raw.trim_start_matches('[').trim();
    // Strip an attribute target specifier such as "return:"
    let raw = match raw.find(':') {
        Some(idx) if raw[..idx].chars().all(|c| c.is_alphanumeric() || c == '_') => {
            raw[idx + 1..].trim_start()
        }
        _ => raw,
    };
    let end = raw
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(raw.len());
    let head = &raw[..end];
    // Qualified attribute names keep only the last segment
    head.rsplit('.').next().unwrap_or(head)
}
