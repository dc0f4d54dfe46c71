// Escape analysis: constructs that imply usage without a direct reference
//
// Covers attribute-driven exemptions (test frameworks, interop,
// serializers), the ShouldSerializeX/ResetX designer convention, protocol
// methods consumed by language constructs, interface satisfaction, and
// reflection preservation flags. Anything that cannot be conclusively
// ruled out is treated as used.

use super::candidates::{effective_externally_visible, CandidateSet};
use super::preserve::PreservationIndex;
use crate::config::Config;
use crate::graph::{Declaration, DeclarationId, DeclarationKind, Graph};
use crate::parser::ProtocolDemands;
use tracing::debug;

/// Why a candidate is not reportable despite having no usage edges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExemptReason {
    /// Carries an attribute that implies external invocation
    Attribute(String),
    /// ShouldSerializeX/ResetX designer pairing
    DesignerConvention,
    /// Protocol method consumed by a language construct
    Protocol,
    /// Satisfies a contract outside the analyzed sources
    ExternalContract,
    /// Preserved by reflection-access flags
    Preserved,
}

impl std::fmt::Display for ExemptReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExemptReason::Attribute(name) => write!(f, "attribute [{name}]"),
            ExemptReason::DesignerConvention => write!(f, "designer convention"),
            ExemptReason::Protocol => write!(f, "protocol method"),
            ExemptReason::ExternalContract => write!(f, "external contract"),
            ExemptReason::Preserved => write!(f, "reflection preservation"),
        }
    }
}

/// Attributes that mark a member as invoked by a framework
const TEST_MEMBER_ATTRIBUTES: &[&str] = &[
    // xUnit
    "Fact",
    "Theory",
    // NUnit
    "Test",
    "TestCase",
    "TestCaseSource",
    "SetUp",
    "TearDown",
    "OneTimeSetUp",
    "OneTimeTearDown",
    // MSTest
    "TestMethod",
    "DataTestMethod",
    "DataRow",
    "TestInitialize",
    "TestCleanup",
    "ClassInitialize",
    "ClassCleanup",
    "AssemblyInitialize",
    "AssemblyCleanup",
    // BenchmarkDotNet
    "Benchmark",
    "GlobalSetup",
    "GlobalCleanup",
    "IterationSetup",
    "IterationCleanup",
];

const TEST_TYPE_ATTRIBUTES: &[&str] = &["TestClass", "TestFixture", "TestFixtureSource"];

const INTEROP_ATTRIBUTES: &[&str] = &[
    "UnmanagedCallersOnly",
    "DllImport",
    "LibraryImport",
    "ComVisible",
    "ComImport",
    "ComRegisterFunction",
    "ComUnregisterFunction",
    "MonoPInvokeCallback",
];

const SERIALIZATION_MEMBER_ATTRIBUTES: &[&str] = &[
    // System.Text.Json
    "JsonPropertyName",
    "JsonInclude",
    "JsonConstructor",
    "JsonExtensionData",
    // Newtonsoft.Json
    "JsonProperty",
    // Data contracts
    "DataMember",
    "EnumMember",
    // XML serialization
    "XmlElement",
    "XmlAttribute",
    "XmlArray",
    "XmlArrayItem",
    "XmlText",
    "XmlAnyElement",
    // protobuf-net
    "ProtoMember",
    // MongoDB
    "BsonElement",
    "BsonId",
    "BsonConstructor",
    // YamlDotNet
    "YamlMember",
    // MessagePack
    "Key",
    // Serialization callbacks
    "OnSerializing",
    "OnSerialized",
    "OnDeserializing",
    "OnDeserialized",
];

/// Type-level attributes whose presence exempts field members
const SERIALIZATION_FIELD_TYPE_ATTRIBUTES: &[&str] = &["Serializable"];

const MISC_ATTRIBUTES: &[&str] = &[
    "ModuleInitializer",
    "DynamicDependency",
    "Preserve",
    "UsedImplicitly",
];

/// Protocol methods and the construct that consumes them
#[derive(Debug, Clone, PartialEq, Eq)]
enum ProtocolKind {
    Foreach,
    AsyncForeach,
    Await,
    Using,
    AsyncUsing,
    Deconstruct,
    CollectionAdd,
    ElementAccess,
    Operator(String),
    Conversion,
}

/// Scanner for escape-hatch exemptions
pub struct EscapeScanner<'a> {
    config: &'a Config,
}

impl<'a> EscapeScanner<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Exemption check for candidate types
    pub fn type_exemption(
        &self,
        graph: &Graph,
        preservation: &PreservationIndex,
        decl: &Declaration,
    ) -> Option<ExemptReason> {
        if let Some(attr) = self.exempting_attribute(decl) {
            return Some(ExemptReason::Attribute(attr));
        }

        for attr in TEST_TYPE_ATTRIBUTES {
            if decl.has_attribute(attr) {
                return Some(ExemptReason::Attribute((*attr).to_string()));
            }
        }

        // A type with preservation flags is fed to reflection somewhere
        if !preservation.flags_for(&decl.name).is_empty() {
            return Some(ExemptReason::Preserved);
        }

        // A nested type may be preserved by its parent's flags
        if let Some(parent) = decl.parent.as_ref().and_then(|p| graph.get_declaration(p)) {
            if preservation.preserves_member(&parent.name, decl) {
                return Some(ExemptReason::Preserved);
            }
        }

        None
    }

    /// Exemption check for candidate members. `type_live` is whether the
    /// containing type has any external usage or exemption — protocol
    /// members can only be consumed through a used type.
    pub fn member_exemption(
        &self,
        graph: &Graph,
        preservation: &PreservationIndex,
        demands: &ProtocolDemands,
        decl: &Declaration,
        type_live: bool,
    ) -> Option<ExemptReason> {
        if let Some(attr) = self.exempting_attribute(decl) {
            return Some(ExemptReason::Attribute(attr));
        }

        let parent = decl.parent.as_ref().and_then(|p| graph.get_declaration(p));

        if let Some(parent) = parent {
            // [Serializable] preserves fields for binary serialization
            if decl.kind == DeclarationKind::Field {
                for attr in SERIALIZATION_FIELD_TYPE_ATTRIBUTES {
                    if parent.has_attribute(attr) {
                        return Some(ExemptReason::Attribute((*attr).to_string()));
                    }
                }
            }

            // Members of test fixtures are driven by the framework
            for attr in TEST_TYPE_ATTRIBUTES {
                if parent.has_attribute(attr) {
                    return Some(ExemptReason::Attribute((*attr).to_string()));
                }
            }

            if preservation.preserves_member(&parent.name, decl) {
                return Some(ExemptReason::Preserved);
            }

            if self.is_designer_convention(graph, decl, parent) {
                return Some(ExemptReason::DesignerConvention);
            }

            if self.satisfies_external_contract(graph, decl, parent) {
                return Some(ExemptReason::ExternalContract);
            }

            // Constructors of a type used as a base class run through
            // derived construction
            if decl.kind == DeclarationKind::Constructor
                && decl.accessibility != crate::graph::Accessibility::Private
                && is_used_as_base(graph, parent)
            {
                return Some(ExemptReason::ExternalContract);
            }
        }

        if let Some(protocol) = protocol_requirement(decl) {
            let satisfied = match &protocol {
                ProtocolKind::Conversion => type_live,
                other => type_live && demand_met(other, demands),
            };
            if satisfied {
                return Some(ExemptReason::Protocol);
            }
        }

        None
    }

    /// Conditional dispatch edges: (contract member, implementation). The
    /// implementation is used only if the contract member is.
    pub fn dispatch_edges(
        &self,
        graph: &Graph,
        candidates: &CandidateSet,
    ) -> Vec<(DeclarationId, DeclarationId)> {
        let mut edges = Vec::new();

        for decl in graph.declarations() {
            if !decl.kind.is_instantiable_type() || !candidates.contains(&decl.id) {
                continue;
            }

            for super_name in &decl.super_types {
                let simple = simple_super_name(super_name);
                for base in graph.find_by_name(simple) {
                    let internal_contract = !effective_externally_visible(graph, base);
                    if !internal_contract {
                        continue;
                    }
                    match base.kind {
                        DeclarationKind::Interface => {
                            self.link_members(graph, base, decl, &mut edges, false);
                        }
                        k if k.is_instantiable_type() => {
                            // override members tied to their base virtual
                            self.link_members(graph, base, decl, &mut edges, true);
                        }
                        _ => {}
                    }
                }
            }
        }

        debug!("{} dispatch edges", edges.len());
        edges
    }

    fn link_members(
        &self,
        graph: &Graph,
        contract: &Declaration,
        implementor: &Declaration,
        edges: &mut Vec<(DeclarationId, DeclarationId)>,
        overrides_only: bool,
    ) {
        let contract_members: Vec<&Declaration> = graph
            .get_children(&contract.id)
            .iter()
            .filter_map(|id| graph.get_declaration(id))
            .filter(|d| d.kind.is_member())
            .collect();

        for impl_id in graph.get_children(&implementor.id) {
            let Some(impl_member) = graph.get_declaration(impl_id) else {
                continue;
            };
            if !impl_member.kind.is_member() {
                continue;
            }
            if overrides_only && !impl_member.modifiers.iter().any(|m| m == "override") {
                continue;
            }
            for contract_member in &contract_members {
                if contract_member.name == impl_member.name
                    && kinds_compatible(contract_member.kind, impl_member.kind)
                {
                    edges.push((contract_member.id.clone(), impl_member.id.clone()));
                }
            }
        }
    }

    fn exempting_attribute(&self, decl: &Declaration) -> Option<String> {
        for table in [
            TEST_MEMBER_ATTRIBUTES,
            INTEROP_ATTRIBUTES,
            SERIALIZATION_MEMBER_ATTRIBUTES,
            MISC_ATTRIBUTES,
        ] {
            for attr in table {
                if decl.has_attribute(attr) {
                    return Some((*attr).to_string());
                }
            }
        }
        for attr in &self.config.preserve_attributes {
            if decl.has_attribute(attr) {
                return Some(attr.clone());
            }
        }
        None
    }

    /// ShouldSerializeX/ResetX: parameterless instance method whose suffix
    /// exactly matches an instance property on the same type. Any mismatch
    /// (case, parameters, static, field-not-property) voids the exemption.
    fn is_designer_convention(
        &self,
        graph: &Graph,
        decl: &Declaration,
        parent: &Declaration,
    ) -> bool {
        if decl.kind != DeclarationKind::Method || decl.is_static || !decl.parameters.is_empty() {
            return false;
        }

        let suffix = if let Some(s) = decl.name.strip_prefix("ShouldSerialize") {
            let returns_bool = decl
                .return_type
                .as_deref()
                .map(|t| t == "bool" || t == "Boolean" || t == "System.Boolean")
                .unwrap_or(false);
            if !returns_bool {
                return false;
            }
            s
        } else if let Some(s) = decl.name.strip_prefix("Reset") {
            s
        } else {
            return false;
        };

        if suffix.is_empty() {
            return false;
        }

        graph.get_children(&parent.id).iter().any(|id| {
            graph
                .get_declaration(id)
                .map(|sibling| {
                    sibling.kind == DeclarationKind::Property
                        && !sibling.is_static
                        && sibling.name == suffix
                })
                .unwrap_or(false)
        })
    }

    /// Whether the member plausibly satisfies a contract we cannot see:
    /// an override of an unresolved base, an implementation of a public
    /// interface, or a public member of a type with unresolved supers.
    fn satisfies_external_contract(
        &self,
        graph: &Graph,
        decl: &Declaration,
        parent: &Declaration,
    ) -> bool {
        if parent.super_types.is_empty() {
            return false;
        }

        let is_override = decl.modifiers.iter().any(|m| m == "override");
        let mut any_unresolved = false;
        let mut override_resolved_internally = false;

        for super_name in &parent.super_types {
            let simple = simple_super_name(super_name);
            let matches = graph.find_by_name(simple);
            if matches.is_empty() {
                any_unresolved = true;
                continue;
            }
            for base in matches {
                if !base.kind.is_type() {
                    continue;
                }
                let member_match = graph.get_children(&base.id).iter().any(|id| {
                    graph
                        .get_declaration(id)
                        .map(|m| m.name == decl.name && kinds_compatible(m.kind, decl.kind))
                        .unwrap_or(false)
                });
                if !member_match {
                    continue;
                }
                if effective_externally_visible(graph, base) {
                    // Implements/overrides a publicly visible contract
                    return true;
                }
                override_resolved_internally = true;
            }
        }

        if is_override && !override_resolved_internally && any_unresolved {
            return true;
        }

        // A public member of a type deriving from something we cannot see
        // may implement an invisible contract
        if any_unresolved && decl.accessibility.is_externally_visible() {
            return true;
        }

        false
    }
}

/// Whether any other type lists this one in its base list
fn is_used_as_base(graph: &Graph, decl: &Declaration) -> bool {
    graph
        .incoming_usages(&decl.id)
        .iter()
        .any(|(_, r)| r.kind == crate::graph::ReferenceKind::Inheritance)
}

fn kinds_compatible(a: DeclarationKind, b: DeclarationKind) -> bool {
    a == b
        || (a == DeclarationKind::Method && b == DeclarationKind::Method)
        || (a == DeclarationKind::Property && b == DeclarationKind::Property)
}

fn simple_super_name(name: &str) -> &str {
    let name = name.split('<').next().unwrap_or(name);
    name.rsplit('.').next().unwrap_or(name).trim()
}

/// The consuming construct required for a protocol member, if any
fn protocol_requirement(decl: &Declaration) -> Option<ProtocolKind> {
    match decl.kind {
        DeclarationKind::Indexer => return Some(ProtocolKind::ElementAccess),
        DeclarationKind::ConversionOperator => return Some(ProtocolKind::Conversion),
        DeclarationKind::Operator => {
            let token = decl.name.strip_prefix("operator ").unwrap_or("");
            if token.is_empty() {
                return None;
            }
            return Some(ProtocolKind::Operator(token.to_string()));
        }
        _ => {}
    }

    match (decl.name.as_str(), decl.kind) {
        ("GetEnumerator", DeclarationKind::Method) if decl.parameters.is_empty() => {
            Some(ProtocolKind::Foreach)
        }
        ("GetAsyncEnumerator", DeclarationKind::Method) => Some(ProtocolKind::AsyncForeach),
        ("GetAwaiter", DeclarationKind::Method) if decl.parameters.is_empty() => {
            Some(ProtocolKind::Await)
        }
        ("MoveNext", DeclarationKind::Method) if decl.parameters.is_empty() => {
            Some(ProtocolKind::Foreach)
        }
        ("Current", DeclarationKind::Property) => Some(ProtocolKind::Foreach),
        ("Dispose", DeclarationKind::Method) if decl.parameters.is_empty() => {
            Some(ProtocolKind::Using)
        }
        ("DisposeAsync", DeclarationKind::Method) if decl.parameters.is_empty() => {
            Some(ProtocolKind::AsyncUsing)
        }
        ("Deconstruct", DeclarationKind::Method) => Some(ProtocolKind::Deconstruct),
        ("Add", DeclarationKind::Method) => Some(ProtocolKind::CollectionAdd),
        _ => None,
    }
}

fn demand_met(protocol: &ProtocolKind, demands: &ProtocolDemands) -> bool {
    match protocol {
        ProtocolKind::Foreach => demands.has_foreach || demands.has_await_foreach,
        ProtocolKind::AsyncForeach => demands.has_await_foreach,
        ProtocolKind::Await => demands.has_await,
        // foreach disposes enumerators implicitly
        ProtocolKind::Using => {
            demands.has_using || demands.has_await_using || demands.has_foreach
        }
        ProtocolKind::AsyncUsing => demands.has_await_using || demands.has_await_foreach,
        ProtocolKind::Deconstruct => demands.has_deconstruction,
        ProtocolKind::CollectionAdd => demands.has_collection_initializer,
        ProtocolKind::ElementAccess => demands.has_element_access,
        ProtocolKind::Operator(token) => demands.operator_tokens.contains(token),
        ProtocolKind::Conversion => true,
    }
}
