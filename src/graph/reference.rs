// Reference types for the usage graph

use super::Location;
use serde::{Deserialize, Serialize};

/// Kind of reference between declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Calling a method
    Invocation,

    /// Reading a field/property value (or taking a method group)
    Read,

    /// Writing to a field/property (assignment, object initializer)
    Write,

    /// Object/record construction (`new X(...)`)
    Instantiation,

    /// Type appearing in a type position (variable, parameter, return,
    /// array element, constraint)
    TypeUsage,

    /// Generic type argument (`List<X>`)
    TypeArgument,

    /// Base class or implemented interface in a base list
    Inheritance,

    /// Cast, `as`/`is` check, or pattern-matching type test
    Cast,

    /// Attribute usage (`[X]`)
    AttributeUsage,

    /// `typeof(X)` expression
    TypeOf,

    /// `nameof(X)` argument. Deliberately not counted as usage so the
    /// symbol can still be reported dead, unlike `typeof`.
    NameOf,

    /// Reflection lookup by string literal (`GetMethod("X")`)
    Reflection,
}

impl ReferenceKind {
    /// Check if this is a read-like reference
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            ReferenceKind::Read
                | ReferenceKind::Invocation
                | ReferenceKind::Reflection
        )
    }

    /// Check if this is a write reference
    pub fn is_write(&self) -> bool {
        matches!(self, ReferenceKind::Write)
    }

    /// Whether an instantiation-style reference: evidence the target type is
    /// actually constructed, not merely mentioned.
    pub fn is_instantiation(&self) -> bool {
        matches!(
            self,
            ReferenceKind::Instantiation
                | ReferenceKind::TypeOf
                | ReferenceKind::AttributeUsage
        )
    }

    /// Check if this reference counts as "usage" for dead symbol detection.
    /// `nameof` is the one kind that never does.
    pub fn counts_as_usage(&self) -> bool {
        !matches!(self, ReferenceKind::NameOf)
    }
}

/// A resolved reference from one declaration (or file scope) to another
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    /// Kind of reference
    pub kind: ReferenceKind,

    /// Location of the actual reference site (kept precise so the resolver
    /// can test lexical self-containment)
    pub location: Location,

    /// The name/identifier used in the reference
    pub name: String,
}

impl Reference {
    pub fn new(kind: ReferenceKind, location: Location, name: String) -> Self {
        Self { kind, location, name }
    }
}

/// A reference that hasn't been resolved to a specific declaration yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnresolvedReference {
    /// The simple name being referenced
    pub name: String,

    /// Fully qualified name if the reference was written qualified
    pub qualified_name: Option<String>,

    /// Kind of reference
    pub kind: ReferenceKind,

    /// Location of the reference site
    pub location: Location,

    /// Using directives in scope (for resolution)
    pub usings: Vec<String>,
}

/// Collector for references found while walking a syntax tree
#[derive(Debug, Default)]
pub struct ReferenceCollector {
    pub references: Vec<UnresolvedReference>,
}

impl ReferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reference to be resolved later. Dotted names are split into a
    /// simple name plus qualified form.
    pub fn add(&mut self, name: &str, kind: ReferenceKind, location: Location, usings: &[String]) {
        let (simple, qualified) = match name.rsplit_once('.') {
            Some((_, last)) => (last.to_string(), Some(name.to_string())),
            None => (name.to_string(), None),
        };

        self.references.push(UnresolvedReference {
            name: simple,
            qualified_name: qualified,
            kind,
            location,
            usings: usings.to_vec(),
        });
    }

    pub fn drain(&mut self) -> Vec<UnresolvedReference> {
        std::mem::take(&mut self.references)
    }
}
