// Reflection-preservation flags and their bounded flow analysis
//
// Models DynamicallyAccessedMemberTypes as an explicit bitset with a
// name-to-bit parse table. A type acquires flags from an attribute placed
// directly on it, or from a `typeof(TheType)` expression flowing into an
// annotated parameter/field/property/return/type-parameter sink. The flow
// join is one syntactic, name-keyed hop; no interprocedural dataflow.

use crate::graph::{attribute_name, Declaration, DeclarationKind, Graph};
use crate::parser::{FlowSite, ScanFacts, SinkKind};
use std::collections::HashMap;
use tracing::debug;

/// Bitset of member categories reachable via reflection.
/// Bit values mirror System.Diagnostics.CodeAnalysis.DynamicallyAccessedMemberTypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessCategories(pub u32);

impl AccessCategories {
    pub const NONE: AccessCategories = AccessCategories(0);
    pub const PUBLIC_PARAMETERLESS_CONSTRUCTOR: AccessCategories = AccessCategories(0x0001);
    pub const PUBLIC_CONSTRUCTORS: AccessCategories = AccessCategories(0x0003);
    pub const NON_PUBLIC_CONSTRUCTORS: AccessCategories = AccessCategories(0x0004);
    pub const PUBLIC_METHODS: AccessCategories = AccessCategories(0x0008);
    pub const NON_PUBLIC_METHODS: AccessCategories = AccessCategories(0x0010);
    pub const PUBLIC_FIELDS: AccessCategories = AccessCategories(0x0020);
    pub const NON_PUBLIC_FIELDS: AccessCategories = AccessCategories(0x0040);
    pub const PUBLIC_NESTED_TYPES: AccessCategories = AccessCategories(0x0080);
    pub const NON_PUBLIC_NESTED_TYPES: AccessCategories = AccessCategories(0x0100);
    pub const PUBLIC_PROPERTIES: AccessCategories = AccessCategories(0x0200);
    pub const NON_PUBLIC_PROPERTIES: AccessCategories = AccessCategories(0x0400);
    pub const PUBLIC_EVENTS: AccessCategories = AccessCategories(0x0800);
    pub const NON_PUBLIC_EVENTS: AccessCategories = AccessCategories(0x1000);
    pub const INTERFACES: AccessCategories = AccessCategories(0x2000);
    pub const ALL: AccessCategories = AccessCategories(u32::MAX);

    pub fn union(self, other: AccessCategories) -> AccessCategories {
        AccessCategories(self.0 | other.0)
    }

    pub fn intersects(self, other: AccessCategories) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parse a category name into its bit(s). Unknown names are treated as
    /// All: if the flags cannot be understood, everything must survive.
    pub fn from_name(name: &str) -> AccessCategories {
        match name {
            "None" => Self::NONE,
            "PublicParameterlessConstructor" => Self::PUBLIC_PARAMETERLESS_CONSTRUCTOR,
            "PublicConstructors" => Self::PUBLIC_CONSTRUCTORS,
            "NonPublicConstructors" => Self::NON_PUBLIC_CONSTRUCTORS,
            "PublicMethods" => Self::PUBLIC_METHODS,
            "NonPublicMethods" => Self::NON_PUBLIC_METHODS,
            "PublicFields" => Self::PUBLIC_FIELDS,
            "NonPublicFields" => Self::NON_PUBLIC_FIELDS,
            "PublicNestedTypes" => Self::PUBLIC_NESTED_TYPES,
            "NonPublicNestedTypes" => Self::NON_PUBLIC_NESTED_TYPES,
            "PublicProperties" => Self::PUBLIC_PROPERTIES,
            "NonPublicProperties" => Self::NON_PUBLIC_PROPERTIES,
            "PublicEvents" => Self::PUBLIC_EVENTS,
            "NonPublicEvents" => Self::NON_PUBLIC_EVENTS,
            "Interfaces" => Self::INTERFACES,
            "All" => Self::ALL,
            _ => Self::ALL,
        }
    }

    /// Parse a flags expression ("DynamicallyAccessedMemberTypes.PublicMethods |
    /// DynamicallyAccessedMemberTypes.NonPublicFields")
    pub fn parse_expr(expr: &str) -> AccessCategories {
        let mut result = Self::NONE;
        for part in expr.split('|') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let name = part.rsplit('.').next().unwrap_or(part);
            result = result.union(Self::from_name(name));
        }
        result
    }

    /// The category a member falls into, by kind and declared accessibility
    pub fn member_category(decl: &Declaration) -> AccessCategories {
        let public = decl.accessibility.is_externally_visible();
        match decl.kind {
            DeclarationKind::Constructor => {
                if public {
                    if decl.parameters.is_empty() {
                        Self::PUBLIC_CONSTRUCTORS
                    } else {
                        AccessCategories(Self::PUBLIC_CONSTRUCTORS.0 & !Self::PUBLIC_PARAMETERLESS_CONSTRUCTOR.0)
                    }
                } else {
                    Self::NON_PUBLIC_CONSTRUCTORS
                }
            }
            DeclarationKind::Method
            | DeclarationKind::Operator
            | DeclarationKind::ConversionOperator => {
                if public {
                    Self::PUBLIC_METHODS
                } else {
                    Self::NON_PUBLIC_METHODS
                }
            }
            DeclarationKind::Field => {
                if public {
                    Self::PUBLIC_FIELDS
                } else {
                    Self::NON_PUBLIC_FIELDS
                }
            }
            DeclarationKind::Property | DeclarationKind::Indexer => {
                if public {
                    Self::PUBLIC_PROPERTIES
                } else {
                    Self::NON_PUBLIC_PROPERTIES
                }
            }
            DeclarationKind::Event => {
                if public {
                    Self::PUBLIC_EVENTS
                } else {
                    Self::NON_PUBLIC_EVENTS
                }
            }
            kind if kind.is_type() => {
                if public {
                    Self::PUBLIC_NESTED_TYPES
                } else {
                    Self::NON_PUBLIC_NESTED_TYPES
                }
            }
            _ => Self::NONE,
        }
    }
}

/// Per-type preservation flags accumulated from direct attributes and from
/// `typeof` flows into annotated sinks. Keyed by simple type name.
#[derive(Debug, Default)]
pub struct PreservationIndex {
    by_type: HashMap<String, AccessCategories>,
}

impl PreservationIndex {
    pub fn build(graph: &Graph, facts: &ScanFacts) -> Self {
        let mut by_type: HashMap<String, AccessCategories> = HashMap::new();

        // Flags placed directly on a type
        for decl in graph.declarations() {
            if !decl.kind.is_type() {
                continue;
            }
            for attr in &decl.attributes {
                if attribute_name(attr) == "DynamicallyAccessedMembers"
                    || attribute_name(attr) == "DynamicallyAccessedMembersAttribute"
                {
                    if let Some(args) = attr_args(attr) {
                        let flags = AccessCategories::parse_expr(&args);
                        merge(&mut by_type, &decl.name, flags);
                    }
                }
            }
        }

        // Flags reached by a typeof flow into an annotated sink
        for flow in &facts.flows {
            for sink in &facts.sinks {
                let matched = match (&flow.site, &sink.kind) {
                    (FlowSite::Argument { callee, index }, SinkKind::Parameter(sink_index)) => {
                        callee == &sink.owner && index == sink_index
                    }
                    (FlowSite::Assignment { target }, SinkKind::Member) => target == &sink.owner,
                    (FlowSite::Return { method }, SinkKind::Return) => method == &sink.owner,
                    (
                        FlowSite::GenericArgument { owner, index },
                        SinkKind::TypeParameter(sink_index),
                    ) => owner == &sink.owner && index == sink_index,
                    _ => false,
                };
                if matched {
                    let flags = AccessCategories::parse_expr(&sink.flags_expr);
                    debug!(
                        "typeof({}) flows into annotated sink on '{}'",
                        flow.type_name, sink.owner
                    );
                    merge(&mut by_type, &flow.type_name, flags);
                }
            }
        }

        Self { by_type }
    }

    /// Flags in effect for a type, by simple name
    pub fn flags_for(&self, type_name: &str) -> AccessCategories {
        self.by_type
            .get(type_name)
            .copied()
            .unwrap_or(AccessCategories::NONE)
    }

    /// Whether the flags on `type_name` preserve this member
    pub fn preserves_member(&self, type_name: &str, member: &Declaration) -> bool {
        let flags = self.flags_for(type_name);
        if flags.is_empty() {
            return false;
        }
        flags.intersects(AccessCategories::member_category(member))
    }
}

fn merge(map: &mut HashMap<String, AccessCategories>, name: &str, flags: AccessCategories) {
    let entry = map.entry(name.to_string()).or_insert(AccessCategories::NONE);
    *entry = entry.union(flags);
}

fn attr_args(attr: &str) -> Option<String> {
    let open = attr.find('(')?;
    let close = attr.rfind(')')?;
    (close > open).then(|| attr[open + 1..close].to_string())
}
