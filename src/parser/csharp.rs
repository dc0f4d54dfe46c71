// C# parser built on tree-sitter
//
// Two passes over each file: declaration extraction (types, members,
// accessors, annotated reflection sinks) and reference extraction
// (usage edges, protocol consumption sites, typeof flows).

use super::common::{
    node_location, node_text, simple_type_name, FlowSite, ParseResult, Parser, PreserveSink,
    ScanFacts, SinkKind, TypeOfFlow,
};
use crate::graph::{
    Accessibility, Declaration, DeclarationId, DeclarationKind, Location, ReferenceCollector,
    ReferenceKind,
};
use miette::Result;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser as TsParser};

/// Reflection lookup methods whose string-literal argument names a member
const REFLECTION_LOOKUPS: &[&str] = &[
    "GetMethod",
    "GetField",
    "GetProperty",
    "GetMember",
    "GetNestedType",
    "GetConstructor",
    "GetEvent",
];

/// C# source code parser
pub struct CSharpParser;

impl CSharpParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_internal(&self, path: &Path, contents: &str) -> Result<ParseResult> {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_c_sharp::language())
            .map_err(|e| miette::miette!("Failed to load C# grammar: {e}"))?;

        let tree = parser
            .parse(contents, None)
            .ok_or_else(|| miette::miette!("Failed to parse C# file"))?;

        let root = tree.root_node();
        let mut result = ParseResult::new();

        result.usings = self.extract_usings(root, contents);
        result.namespace = self.extract_namespace(root, contents);

        // Same-namespace names resolve without a using directive
        let mut usings = result.usings.clone();
        if let Some(ns) = &result.namespace {
            usings.push(ns.clone());
        }

        let mut decls = DeclWalker {
            path,
            source: contents,
            declarations: Vec::new(),
            sinks: Vec::new(),
        };
        decls.walk(root, &DeclContext::default());
        result.declarations = decls.declarations;
        result.facts.sinks = decls.sinks;

        let mut refs = RefWalker {
            path,
            source: contents,
            usings: &usings,
            refs: ReferenceCollector::new(),
            facts: &mut result.facts,
            method_stack: Vec::new(),
            type_stack: Vec::new(),
        };
        refs.scan(root);
        result.references = refs.refs.drain();

        debug!(
            "{}: {} declarations, {} references",
            path.display(),
            result.declarations.len(),
            result.references.len()
        );

        Ok(result)
    }

    fn extract_usings(&self, root: Node, source: &str) -> Vec<String> {
        let mut usings = Vec::new();
        collect_usings(root, source, &mut usings);
        usings
    }

    fn extract_namespace(&self, root: Node, source: &str) -> Option<String> {
        find_namespace(root, source)
    }
}

impl Default for CSharpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for CSharpParser {
    fn parse(&self, path: &Path, contents: &str) -> Result<ParseResult> {
        self.parse_internal(path, contents)
    }
}

fn collect_usings(node: Node, source: &str, usings: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "using_directive" => {
                let mut is_static = false;
                let mut alias: Option<String> = None;
                let mut path_text: Option<String> = None;

                let mut uc = child.walk();
                for part in child.children(&mut uc) {
                    match part.kind() {
                        "static" => is_static = true,
                        "name_equals" => {
                            let text = node_text(part, source);
                            alias = Some(text.trim_end_matches('=').trim().to_string());
                        }
                        "identifier" | "qualified_name" => {
                            path_text = Some(node_text(part, source).to_string());
                        }
                        _ => {}
                    }
                }

                if let Some(path) = path_text {
                    if let Some(alias) = alias {
                        usings.push(format!("{path} as {alias}"));
                    } else if is_static {
                        usings.push(format!("static {path}"));
                    } else {
                        usings.push(path);
                    }
                }
            }
            "namespace_declaration" | "file_scoped_namespace_declaration" => {
                collect_usings(child, source, usings);
            }
            _ => {}
        }
    }
}

fn find_namespace(node: Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(
            child.kind(),
            "namespace_declaration" | "file_scoped_namespace_declaration"
        ) {
            if let Some(name) = child.child_by_field_name("name") {
                return Some(node_text(name, source).to_string());
            }
        }
    }
    None
}

/// Context while walking declarations
#[derive(Default, Clone)]
struct DeclContext {
    namespace: Option<String>,
    parent: Option<DeclarationId>,
    parent_kind: Option<DeclarationKind>,
    fqn_prefix: Option<String>,
}

impl DeclContext {
    fn member_default_accessibility(&self) -> Accessibility {
        match self.parent_kind {
            Some(DeclarationKind::Interface) => Accessibility::Public,
            Some(_) => Accessibility::Private,
            // Top-level types default to internal
            None => Accessibility::Internal,
        }
    }

    fn fqn_for(&self, name: &str) -> String {
        match &self.fqn_prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.to_string(),
        }
    }
}

/// Declaration extraction walker
struct DeclWalker<'a> {
    path: &'a Path,
    source: &'a str,
    declarations: Vec<Declaration>,
    sinks: Vec<PreserveSink>,
}

impl<'a> DeclWalker<'a> {
    fn walk(&mut self, node: Node, ctx: &DeclContext) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "namespace_declaration" | "file_scoped_namespace_declaration" => {
                    let ns = child
                        .child_by_field_name("name")
                        .map(|n| node_text(n, self.source).to_string());
                    let nested = DeclContext {
                        namespace: match (&ctx.namespace, &ns) {
                            (Some(outer), Some(inner)) => Some(format!("{outer}.{inner}")),
                            (None, Some(inner)) => Some(inner.clone()),
                            _ => ctx.namespace.clone(),
                        },
                        parent: None,
                        parent_kind: None,
                        fqn_prefix: match (&ctx.fqn_prefix, &ns) {
                            (Some(outer), Some(inner)) => Some(format!("{outer}.{inner}")),
                            (None, Some(inner)) => Some(inner.clone()),
                            _ => ctx.fqn_prefix.clone(),
                        },
                    };
                    self.walk(child, &nested);
                }
                "class_declaration" => self.extract_type(child, DeclarationKind::Class, ctx),
                "struct_declaration" => self.extract_type(child, DeclarationKind::Struct, ctx),
                "interface_declaration" => self.extract_type(child, DeclarationKind::Interface, ctx),
                "record_declaration" => {
                    let kind = if has_child_token(child, "struct") {
                        DeclarationKind::RecordStruct
                    } else {
                        DeclarationKind::Record
                    };
                    self.extract_type(child, kind, ctx);
                }
                "record_struct_declaration" => {
                    self.extract_type(child, DeclarationKind::RecordStruct, ctx)
                }
                "enum_declaration" => self.extract_type(child, DeclarationKind::Enum, ctx),
                "delegate_declaration" => self.extract_type(child, DeclarationKind::Delegate, ctx),
                "method_declaration" => self.extract_method(child, ctx),
                "constructor_declaration" => self.extract_constructor(child, ctx),
                "operator_declaration" => self.extract_operator(child, ctx),
                "conversion_operator_declaration" => self.extract_conversion_operator(child, ctx),
                "field_declaration" => self.extract_field(child, ctx, DeclarationKind::Field),
                "event_field_declaration" => self.extract_field(child, ctx, DeclarationKind::Event),
                "property_declaration" => self.extract_property(child, ctx),
                "indexer_declaration" => self.extract_indexer(child, ctx),
                "event_declaration" => self.extract_event(child, ctx),
                // Finalizers are not tracked: never candidates, never referenced
                "destructor_declaration" => {}
                _ => {
                    // declaration_list and other wrappers
                    self.walk(child, ctx);
                }
            }
        }
    }

    fn extract_type(&mut self, node: Node, kind: DeclarationKind, ctx: &DeclContext) {
        let Some(name) = type_name(node, self.source) else {
            return;
        };

        let modifiers = collect_modifiers(node, self.source);
        let default = ctx.member_default_accessibility();
        // Nested types default to private inside class/struct bodies
        let default = if ctx.parent.is_some() { Accessibility::Private } else { default };

        let mut decl = Declaration::new(
            DeclarationId::new(self.path.to_path_buf(), node.start_byte(), node.end_byte()),
            name.clone(),
            kind,
            Accessibility::from_modifiers(&modifiers, default),
            node_location(self.path, node),
        );
        decl.parent = ctx.parent.clone();
        decl.is_static = modifiers.iter().any(|m| m == "static");
        decl.is_abstract = modifiers.iter().any(|m| m == "abstract");
        decl.is_partial = modifiers.iter().any(|m| m == "partial");
        decl.modifiers = modifiers;
        decl.attributes = collect_attributes(node, self.source);
        decl.super_types = collect_base_list(node, self.source);
        decl.fully_qualified_name = Some(ctx.fqn_for(&name));

        self.collect_type_parameter_sinks(node, &name);

        let id = decl.id.clone();
        let fqn = decl.fully_qualified_name.clone();
        self.declarations.push(decl);

        if kind == DeclarationKind::Enum || kind == DeclarationKind::Delegate {
            // Enum members and delegate signatures carry no reportable members
            return;
        }

        let nested = DeclContext {
            namespace: ctx.namespace.clone(),
            parent: Some(id),
            parent_kind: Some(kind),
            fqn_prefix: fqn,
        };
        if let Some(body) = node.child_by_field_name("body") {
            self.walk(body, &nested);
        }
    }

    fn extract_method(&mut self, node: Node, ctx: &DeclContext) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();

        let modifiers = collect_modifiers(node, self.source);
        let mut decl = Declaration::new(
            DeclarationId::new(self.path.to_path_buf(), node.start_byte(), node.end_byte()),
            name.clone(),
            DeclarationKind::Method,
            Accessibility::from_modifiers(&modifiers, ctx.member_default_accessibility()),
            node_location(self.path, node),
        );
        decl.parent = ctx.parent.clone();
        decl.is_static = modifiers.iter().any(|m| m == "static");
        decl.is_abstract = modifiers.iter().any(|m| m == "abstract")
            || (ctx.parent_kind == Some(DeclarationKind::Interface)
                && node.child_by_field_name("body").is_none()
                && !has_arrow_body(node));
        decl.is_partial = modifiers.iter().any(|m| m == "partial");
        decl.modifiers = modifiers;
        decl.attributes = collect_attributes(node, self.source);
        decl.return_type = node
            .child_by_field_name("type")
            .or_else(|| node.child_by_field_name("returns"))
            .map(|t| node_text(t, self.source).to_string());
        decl.parameters = parameter_types(node, self.source);
        decl.explicit_interface = explicit_interface(node, self.source);
        decl.fully_qualified_name = Some(ctx.fqn_for(&name));

        self.collect_method_sinks(node, &name);
        self.collect_type_parameter_sinks(node, &name);

        self.declarations.push(decl);
    }

    fn extract_constructor(&mut self, node: Node, ctx: &DeclContext) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();

        let modifiers = collect_modifiers(node, self.source);
        let mut decl = Declaration::new(
            DeclarationId::new(self.path.to_path_buf(), node.start_byte(), node.end_byte()),
            name.clone(),
            DeclarationKind::Constructor,
            Accessibility::from_modifiers(&modifiers, Accessibility::Private),
            node_location(self.path, node),
        );
        decl.parent = ctx.parent.clone();
        decl.is_static = modifiers.iter().any(|m| m == "static");
        decl.modifiers = modifiers;
        decl.attributes = collect_attributes(node, self.source);
        decl.parameters = parameter_types(node, self.source);
        decl.fully_qualified_name = Some(ctx.fqn_for(&name));

        self.collect_method_sinks(node, &name);

        self.declarations.push(decl);
    }

    fn extract_operator(&mut self, node: Node, ctx: &DeclContext) {
        // The operator token is the child right after the `operator` keyword
        let mut token = None;
        let mut saw_keyword = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "operator" {
                saw_keyword = true;
                continue;
            }
            if saw_keyword && child.kind() != "parameter_list" {
                token = Some(node_text(child, self.source).to_string());
                break;
            }
            if saw_keyword {
                break;
            }
        }
        let Some(token) = token else { return };

        let modifiers = collect_modifiers(node, self.source);
        let name = format!("operator {token}");
        let mut decl = Declaration::new(
            DeclarationId::new(self.path.to_path_buf(), node.start_byte(), node.end_byte()),
            name.clone(),
            DeclarationKind::Operator,
            Accessibility::from_modifiers(&modifiers, Accessibility::Private),
            node_location(self.path, node),
        );
        decl.parent = ctx.parent.clone();
        decl.is_static = true;
        decl.modifiers = modifiers;
        decl.attributes = collect_attributes(node, self.source);
        decl.parameters = parameter_types(node, self.source);
        decl.return_type = node
            .child_by_field_name("type")
            .map(|t| node_text(t, self.source).to_string());
        decl.fully_qualified_name = Some(ctx.fqn_for(&name));
        self.declarations.push(decl);
    }

    fn extract_conversion_operator(&mut self, node: Node, ctx: &DeclContext) {
        let target = node
            .child_by_field_name("type")
            .map(|t| node_text(t, self.source).to_string())
            .unwrap_or_default();
        let keyword = if has_child_token(node, "implicit") {
            "implicit"
        } else {
            "explicit"
        };

        let modifiers = collect_modifiers(node, self.source);
        let name = format!("{keyword} operator {target}");
        let mut decl = Declaration::new(
            DeclarationId::new(self.path.to_path_buf(), node.start_byte(), node.end_byte()),
            name.clone(),
            DeclarationKind::ConversionOperator,
            Accessibility::from_modifiers(&modifiers, Accessibility::Private),
            node_location(self.path, node),
        );
        decl.parent = ctx.parent.clone();
        decl.is_static = true;
        decl.modifiers = modifiers;
        decl.attributes = collect_attributes(node, self.source);
        decl.parameters = parameter_types(node, self.source);
        decl.return_type = Some(target);
        decl.fully_qualified_name = Some(ctx.fqn_for(&name));
        self.declarations.push(decl);
    }

    fn extract_field(&mut self, node: Node, ctx: &DeclContext, kind: DeclarationKind) {
        let modifiers = collect_modifiers(node, self.source);
        let attributes = collect_attributes(node, self.source);
        let default = if kind == DeclarationKind::Event {
            ctx.member_default_accessibility()
        } else {
            Accessibility::Private
        };
        let accessibility = Accessibility::from_modifiers(&modifiers, default);

        let Some(var_decl) = first_child_of_kind(node, "variable_declaration") else {
            return;
        };
        let type_text = var_decl
            .child_by_field_name("type")
            .map(|t| node_text(t, self.source).to_string());

        for declarator in children_of_kind_vec(var_decl, "variable_declarator") {
            let Some(name_node) = declarator
                .child_by_field_name("name")
                .or_else(|| first_child_of_kind(declarator, "identifier"))
            else {
                continue;
            };
            let name = node_text(name_node, self.source).to_string();

            let mut decl = Declaration::new(
                DeclarationId::new(
                    self.path.to_path_buf(),
                    declarator.start_byte(),
                    declarator.end_byte(),
                ),
                name.clone(),
                kind,
                accessibility,
                node_location(self.path, declarator),
            );
            decl.parent = ctx.parent.clone();
            decl.is_static = modifiers.iter().any(|m| m == "static" || m == "const");
            decl.modifiers = modifiers.clone();
            decl.attributes = attributes.clone();
            decl.return_type = type_text.clone();
            decl.fully_qualified_name = Some(ctx.fqn_for(&name));

            if kind == DeclarationKind::Field {
                self.collect_member_sink(&decl);
            }

            self.declarations.push(decl);
        }
    }

    fn extract_property(&mut self, node: Node, ctx: &DeclContext) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();

        let modifiers = collect_modifiers(node, self.source);
        let accessibility =
            Accessibility::from_modifiers(&modifiers, ctx.member_default_accessibility());
        let mut decl = Declaration::new(
            DeclarationId::new(self.path.to_path_buf(), node.start_byte(), node.end_byte()),
            name.clone(),
            DeclarationKind::Property,
            accessibility,
            node_location(self.path, node),
        );
        decl.parent = ctx.parent.clone();
        decl.is_static = modifiers.iter().any(|m| m == "static");
        decl.is_abstract = modifiers.iter().any(|m| m == "abstract")
            || ctx.parent_kind == Some(DeclarationKind::Interface);
        decl.modifiers = modifiers;
        decl.attributes = collect_attributes(node, self.source);
        decl.return_type = node
            .child_by_field_name("type")
            .map(|t| node_text(t, self.source).to_string());
        decl.explicit_interface = explicit_interface(node, self.source);
        decl.fully_qualified_name = Some(ctx.fqn_for(&name));

        self.collect_member_sink(&decl);

        let prop_id = decl.id.clone();
        let prop_abstract = decl.is_abstract;
        self.declarations.push(decl);

        self.extract_accessors(node, &name, &prop_id, accessibility, prop_abstract);
    }

    fn extract_indexer(&mut self, node: Node, ctx: &DeclContext) {
        let modifiers = collect_modifiers(node, self.source);
        let accessibility =
            Accessibility::from_modifiers(&modifiers, ctx.member_default_accessibility());
        let name = "this[]".to_string();
        let mut decl = Declaration::new(
            DeclarationId::new(self.path.to_path_buf(), node.start_byte(), node.end_byte()),
            name.clone(),
            DeclarationKind::Indexer,
            accessibility,
            node_location(self.path, node),
        );
        decl.parent = ctx.parent.clone();
        decl.is_abstract = modifiers.iter().any(|m| m == "abstract")
            || ctx.parent_kind == Some(DeclarationKind::Interface);
        decl.modifiers = modifiers;
        decl.attributes = collect_attributes(node, self.source);
        decl.parameters = parameter_types(node, self.source);
        decl.return_type = node
            .child_by_field_name("type")
            .map(|t| node_text(t, self.source).to_string());
        decl.explicit_interface = explicit_interface(node, self.source);
        decl.fully_qualified_name = Some(ctx.fqn_for(&name));

        let indexer_id = decl.id.clone();
        let is_abstract = decl.is_abstract;
        self.declarations.push(decl);

        self.extract_accessors(node, &name, &indexer_id, accessibility, is_abstract);
    }

    fn extract_event(&mut self, node: Node, ctx: &DeclContext) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();

        let modifiers = collect_modifiers(node, self.source);
        let mut decl = Declaration::new(
            DeclarationId::new(self.path.to_path_buf(), node.start_byte(), node.end_byte()),
            name.clone(),
            DeclarationKind::Event,
            Accessibility::from_modifiers(&modifiers, ctx.member_default_accessibility()),
            node_location(self.path, node),
        );
        decl.parent = ctx.parent.clone();
        decl.is_static = modifiers.iter().any(|m| m == "static");
        decl.modifiers = modifiers;
        decl.attributes = collect_attributes(node, self.source);
        decl.explicit_interface = explicit_interface(node, self.source);
        decl.fully_qualified_name = Some(ctx.fqn_for(&name));
        self.declarations.push(decl);
    }

    /// Create accessor declarations for a property or indexer. An
    /// expression-bodied member (`=> expr`) is a lone getter.
    fn extract_accessors(
        &mut self,
        node: Node,
        owner_name: &str,
        owner_id: &DeclarationId,
        owner_accessibility: Accessibility,
        owner_abstract: bool,
    ) {
        let push_accessor = |walker: &mut Self, span: Node, kind: DeclarationKind, mods: Vec<String>| {
            let accessibility = Accessibility::from_modifiers(&mods, owner_accessibility);
            let mut decl = Declaration::new(
                DeclarationId::new(walker.path.to_path_buf(), span.start_byte(), span.end_byte()),
                owner_name.to_string(),
                kind,
                accessibility,
                node_location(walker.path, span),
            );
            decl.parent = Some(owner_id.clone());
            decl.is_abstract = owner_abstract;
            decl.modifiers = mods;
            walker.declarations.push(decl);
        };

        if let Some(accessors) = node
            .child_by_field_name("accessors")
            .or_else(|| first_child_of_kind(node, "accessor_list"))
        {
            for accessor in children_of_kind_vec(accessors, "accessor_declaration") {
                let mods = collect_modifiers(accessor, self.source);
                if has_child_token(accessor, "get") {
                    push_accessor(self, accessor, DeclarationKind::Getter, mods);
                } else if has_child_token(accessor, "set") || has_child_token(accessor, "init") {
                    push_accessor(self, accessor, DeclarationKind::Setter, mods);
                }
            }
        } else if let Some(arrow) = first_child_of_kind(node, "arrow_expression_clause") {
            push_accessor(self, arrow, DeclarationKind::Getter, Vec::new());
        }
    }

    /// Record DynamicallyAccessedMembers sinks on parameters and returns
    fn collect_method_sinks(&mut self, node: Node, method_name: &str) {
        if let Some(params) = node.child_by_field_name("parameters") {
            for (index, param) in children_of_kind_vec(params, "parameter").iter().enumerate() {
                for attr in collect_attributes(*param, self.source) {
                    if let Some(flags) = preserve_flags_expr(&attr) {
                        self.sinks.push(PreserveSink {
                            owner: method_name.to_string(),
                            kind: SinkKind::Parameter(index),
                            flags_expr: flags,
                        });
                    }
                }
            }
        }

        // `[return: DynamicallyAccessedMembers(...)]`
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "attribute_list" {
                continue;
            }
            let text = node_text(child, self.source);
            if !text.trim_start_matches('[').trim_start().starts_with("return") {
                continue;
            }
            for attr in children_of_kind_vec(child, "attribute") {
                let attr_text = node_text(attr, self.source);
                if let Some(flags) = preserve_flags_expr(attr_text) {
                    self.sinks.push(PreserveSink {
                        owner: method_name.to_string(),
                        kind: SinkKind::Return,
                        flags_expr: flags,
                    });
                }
            }
        }
    }

    /// Record DynamicallyAccessedMembers sinks on Type-typed fields/properties
    fn collect_member_sink(&mut self, decl: &Declaration) {
        let is_type_typed = decl
            .return_type
            .as_deref()
            .map(|t| {
                let t = simple_type_name(t);
                t == "Type"
            })
            .unwrap_or(false);
        if !is_type_typed {
            return;
        }
        for attr in &decl.attributes {
            if let Some(flags) = preserve_flags_expr(attr) {
                self.sinks.push(PreserveSink {
                    owner: decl.name.clone(),
                    kind: SinkKind::Member,
                    flags_expr: flags,
                });
            }
        }
    }

    /// Record DynamicallyAccessedMembers sinks on type parameters
    fn collect_type_parameter_sinks(&mut self, node: Node, owner: &str) {
        let Some(type_params) = node
            .child_by_field_name("type_parameters")
            .or_else(|| first_child_of_kind(node, "type_parameter_list"))
        else {
            return;
        };
        for (index, tp) in children_of_kind_vec(type_params, "type_parameter")
            .iter()
            .enumerate()
        {
            for attr in collect_attributes(*tp, self.source) {
                if let Some(flags) = preserve_flags_expr(&attr) {
                    self.sinks.push(PreserveSink {
                        owner: owner.to_string(),
                        kind: SinkKind::TypeParameter(index),
                        flags_expr: flags,
                    });
                }
            }
        }
    }
}

/// Reference extraction walker
struct RefWalker<'a> {
    path: &'a Path,
    source: &'a str,
    usings: &'a [String],
    refs: ReferenceCollector,
    facts: &'a mut ScanFacts,
    method_stack: Vec<String>,
    type_stack: Vec<String>,
}

impl<'a> RefWalker<'a> {
    fn loc(&self, node: Node) -> Location {
        node_location(self.path, node)
    }

    fn emit(&mut self, name: &str, kind: ReferenceKind, node: Node) {
        if name.is_empty() || name == "var" {
            return;
        }
        self.refs.add(name, kind, self.loc(node), self.usings);
    }

    fn scan(&mut self, node: Node) {
        match node.kind() {
            "using_directive" => {}

            // Declarations: skip names, walk types and bodies
            "class_declaration" | "struct_declaration" | "interface_declaration"
            | "record_declaration" | "record_struct_declaration" => {
                self.scan_attributes(node);
                self.scan_base_list(node);
                self.scan_constraints(node);
                if let Some(params) = node.child_by_field_name("parameters") {
                    self.scan_parameter_list(params);
                }
                let name = node
                    .child_by_field_name("name")
                    .map(|n| node_text(n, self.source).to_string())
                    .unwrap_or_default();
                self.type_stack.push(name);
                if let Some(body) = node.child_by_field_name("body") {
                    self.scan_children(body);
                }
                self.type_stack.pop();
            }
            "enum_declaration" => {
                self.scan_attributes(node);
                self.scan_base_list(node);
                if let Some(body) = node.child_by_field_name("body") {
                    // Enum member initializers may reference other symbols
                    for member in children_of_kind_vec(body, "enum_member_declaration") {
                        if let Some(value) = member.child_by_field_name("value") {
                            self.scan(value);
                        }
                    }
                }
            }
            "delegate_declaration" => {
                self.scan_attributes(node);
                self.scan_return_type(node);
                if let Some(params) = node.child_by_field_name("parameters") {
                    self.scan_parameter_list(params);
                }
            }
            "method_declaration" | "local_function_statement" => {
                self.scan_attributes(node);
                self.scan_return_type(node);
                self.scan_constraints(node);
                if let Some(params) = node.child_by_field_name("parameters") {
                    self.scan_parameter_list(params);
                }
                let name = node
                    .child_by_field_name("name")
                    .map(|n| node_text(n, self.source).to_string())
                    .unwrap_or_default();
                self.method_stack.push(name);
                self.scan_body(node);
                self.method_stack.pop();
            }
            "constructor_declaration" => {
                self.scan_attributes(node);
                if let Some(params) = node.child_by_field_name("parameters") {
                    self.scan_parameter_list(params);
                }
                if let Some(init) = first_child_of_kind(node, "constructor_initializer") {
                    // `: this(...)` chains to a sibling constructor
                    if has_child_token(init, "this") {
                        if let Some(type_name) = self.type_stack.last().cloned() {
                            self.emit(&type_name, ReferenceKind::Invocation, init);
                        }
                    }
                    if let Some(args) = first_child_of_kind(init, "argument_list") {
                        self.scan_children(args);
                    }
                }
                self.scan_body(node);
            }
            "operator_declaration" | "conversion_operator_declaration" => {
                self.scan_attributes(node);
                self.scan_return_type(node);
                if let Some(params) = node.child_by_field_name("parameters") {
                    self.scan_parameter_list(params);
                }
                self.scan_body(node);
            }
            "destructor_declaration" => {
                self.scan_body(node);
            }
            "field_declaration" | "event_field_declaration" => {
                self.scan_attributes(node);
                if let Some(var_decl) = first_child_of_kind(node, "variable_declaration") {
                    self.scan_variable_declaration(var_decl);
                }
            }
            "property_declaration" | "indexer_declaration" => {
                self.scan_attributes(node);
                self.scan_return_type(node);
                if node.kind() == "indexer_declaration" {
                    if let Some(params) = node.child_by_field_name("parameters") {
                        self.scan_parameter_list(params);
                    }
                }
                if let Some(accessors) = node
                    .child_by_field_name("accessors")
                    .or_else(|| first_child_of_kind(node, "accessor_list"))
                {
                    for accessor in children_of_kind_vec(accessors, "accessor_declaration") {
                        self.scan_body(accessor);
                    }
                }
                if let Some(arrow) = first_child_of_kind(node, "arrow_expression_clause") {
                    self.scan(arrow);
                }
                // Property initializer `{ get; } = expr;`
                if let Some(init) = first_child_of_kind(node, "equals_value_clause") {
                    self.scan_children(init);
                }
            }
            "event_declaration" => {
                self.scan_attributes(node);
                self.scan_return_type(node);
                if let Some(accessors) = first_child_of_kind(node, "accessor_list") {
                    for accessor in children_of_kind_vec(accessors, "accessor_declaration") {
                        self.scan_body(accessor);
                    }
                }
            }

            // Expressions
            "invocation_expression" => self.scan_invocation(node),
            "object_creation_expression" => self.scan_object_creation(node),
            "implicit_object_creation_expression" => {
                if let Some(args) = node.child_by_field_name("arguments") {
                    self.scan_children(args);
                }
                if let Some(init) = node.child_by_field_name("initializer") {
                    self.scan_initializer(init);
                }
            }
            "typeof_expression" => self.scan_typeof(node),
            "member_access_expression" => {
                if let Some(expr) = node.child_by_field_name("expression") {
                    self.scan(expr);
                }
                if let Some(name) = node.child_by_field_name("name") {
                    self.scan_name_node(name, ReferenceKind::Read);
                }
            }
            "member_binding_expression" => {
                // `?.Name`
                if let Some(name) = node.child_by_field_name("name") {
                    self.scan_name_node(name, ReferenceKind::Read);
                }
            }
            "assignment_expression" => self.scan_assignment(node),
            "prefix_unary_expression" | "postfix_unary_expression" => {
                let op = operator_token(node, self.source);
                let incdec = matches!(op.as_deref(), Some("++") | Some("--"));
                if let Some(op) = &op {
                    self.facts.demands.operator_tokens.insert(op.clone());
                }
                if incdec {
                    // `x++` reads and writes; walk the receiver chain but
                    // not the written name again
                    if let Some((name, site)) = assignment_target(node, self.source) {
                        self.emit(&name, ReferenceKind::Read, site);
                        self.emit(&name, ReferenceKind::Write, site);
                    }
                    let mut cursor = node.walk();
                    for child in node.children(&mut cursor) {
                        if child.kind() == "member_access_expression" {
                            if let Some(expr) = child.child_by_field_name("expression") {
                                self.scan(expr);
                            }
                        } else if child.is_named() && child.kind() != "identifier" {
                            self.scan(child);
                        }
                    }
                } else {
                    self.scan_children(node);
                }
            }
            "binary_expression" => {
                if let Some(op) = operator_token(node, self.source) {
                    if op == "as" || op == "is" {
                        if let Some(left) = node.child_by_field_name("left") {
                            self.scan(left);
                        }
                        if let Some(right) = node.child_by_field_name("right") {
                            self.scan_type_refs(right, ReferenceKind::Cast);
                        }
                        return;
                    }
                    self.facts.demands.operator_tokens.insert(op);
                }
                if let Some(left) = node.child_by_field_name("left") {
                    self.scan(left);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.scan(right);
                }
            }
            "cast_expression" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    self.scan_type_refs(ty, ReferenceKind::Cast);
                }
                if let Some(value) = node.child_by_field_name("value") {
                    self.scan(value);
                }
            }
            "is_pattern_expression" => {
                if let Some(expr) = node.child_by_field_name("expression") {
                    self.scan(expr);
                }
                if let Some(pattern) = node.child_by_field_name("pattern") {
                    self.scan_pattern(pattern);
                }
            }
            "declaration_pattern" | "type_pattern" | "recursive_pattern" | "switch_expression_arm"
            | "case_pattern_switch_label" => {
                self.scan_pattern(node);
            }
            "await_expression" => {
                self.facts.demands.has_await = true;
                self.scan_children(node);
            }
            "foreach_statement" => {
                if has_child_token(node, "await") {
                    self.facts.demands.has_await_foreach = true;
                } else {
                    self.facts.demands.has_foreach = true;
                }
                if let Some(ty) = node.child_by_field_name("type") {
                    self.scan_type_refs(ty, ReferenceKind::TypeUsage);
                }
                if let Some(left) = node.child_by_field_name("left") {
                    if left.kind() == "tuple_pattern" || left.kind() == "tuple_expression" {
                        self.facts.demands.has_deconstruction = true;
                    }
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.scan(right);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.scan(body);
                }
            }
            "using_statement" => {
                if has_child_token(node, "await") {
                    self.facts.demands.has_await_using = true;
                } else {
                    self.facts.demands.has_using = true;
                }
                self.scan_children(node);
            }
            "local_declaration_statement" => {
                if has_child_token(node, "using") {
                    if has_child_token(node, "await") {
                        self.facts.demands.has_await_using = true;
                    } else {
                        self.facts.demands.has_using = true;
                    }
                }
                self.scan_children(node);
            }
            "variable_declaration" => {
                self.scan_variable_declaration(node);
            }
            "element_access_expression" => {
                self.facts.demands.has_element_access = true;
                self.scan_children(node);
            }
            "collection_expression" => {
                // `[1, 2, 3]` builds through Add like a collection initializer
                self.facts.demands.has_collection_initializer = true;
                self.scan_children(node);
            }
            "attribute_list" => {
                self.scan_attribute_list(node);
            }
            "generic_name" => {
                // Closed generic in expression position: `Helper<Widget>.Run()`
                if let Some(ident) = first_child_of_kind(node, "identifier") {
                    self.emit(node_text(ident, self.source), ReferenceKind::Read, ident);
                }
                self.scan_type_arguments(node, None);
            }
            "identifier" => {
                self.emit(node_text(node, self.source), ReferenceKind::Read, node);
            }
            "return_statement" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "typeof_expression" {
                        if let Some(method) = self.method_stack.last().cloned() {
                            self.record_typeof_flow(child, FlowSite::Return { method });
                        }
                    }
                    if child.is_named() {
                        self.scan(child);
                    }
                }
            }
            "arrow_expression_clause" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "typeof_expression" {
                        if let Some(method) = self.method_stack.last().cloned() {
                            self.record_typeof_flow(child, FlowSite::Return { method });
                        }
                    }
                    if child.is_named() {
                        self.scan(child);
                    }
                }
            }
            _ => self.scan_children(node),
        }
    }

    fn scan_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.is_named() {
                self.scan(child);
            }
        }
    }

    fn scan_body(&mut self, node: Node) {
        if let Some(body) = node.child_by_field_name("body") {
            self.scan(body);
        }
        if let Some(arrow) = first_child_of_kind(node, "arrow_expression_clause") {
            self.scan(arrow);
        }
    }

    fn scan_return_type(&mut self, node: Node) {
        if let Some(ty) = node
            .child_by_field_name("type")
            .or_else(|| node.child_by_field_name("returns"))
        {
            self.scan_type_refs(ty, ReferenceKind::TypeUsage);
        }
    }

    fn scan_parameter_list(&mut self, params: Node) {
        let mut cursor = params.walk();
        for param in params.children(&mut cursor) {
            if param.kind() != "parameter" {
                continue;
            }
            self.scan_attributes(param);
            if let Some(ty) = param.child_by_field_name("type") {
                self.scan_type_refs(ty, ReferenceKind::TypeUsage);
            }
            // Default values may reference constants
            if let Some(default) = first_child_of_kind(param, "equals_value_clause") {
                self.scan_children(default);
            }
        }
    }

    fn scan_variable_declaration(&mut self, node: Node) {
        if let Some(ty) = node.child_by_field_name("type") {
            self.scan_type_refs(ty, ReferenceKind::TypeUsage);
        }
        for declarator in children_of_kind_vec(node, "variable_declarator") {
            let name = declarator
                .child_by_field_name("name")
                .map(|n| node_text(n, self.source).to_string());
            if let Some(init) = first_child_of_kind(declarator, "equals_value_clause") {
                let mut cursor = init.walk();
                for child in init.children(&mut cursor) {
                    if child.kind() == "typeof_expression" {
                        if let Some(target) = &name {
                            self.record_typeof_flow(
                                child,
                                FlowSite::Assignment {
                                    target: target.clone(),
                                },
                            );
                        }
                    }
                    if child.is_named() {
                        self.scan(child);
                    }
                }
            }
        }
    }

    fn scan_base_list(&mut self, node: Node) {
        let base_list = node
            .child_by_field_name("bases")
            .or_else(|| first_child_of_kind(node, "base_list"));
        if let Some(bases) = base_list {
            let mut cursor = bases.walk();
            for base in bases.children(&mut cursor) {
                if base.is_named() {
                    self.scan_type_refs(base, ReferenceKind::Inheritance);
                }
            }
        }
    }

    fn scan_constraints(&mut self, node: Node) {
        for clause in children_of_kind_vec(node, "type_parameter_constraints_clause") {
            for constraint in children_of_kind_vec(clause, "type_parameter_constraint") {
                let mut cursor = constraint.walk();
                for child in constraint.children(&mut cursor) {
                    if child.is_named() {
                        self.scan_type_refs(child, ReferenceKind::TypeUsage);
                    }
                }
            }
        }
    }

    fn scan_attributes(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "attribute_list" {
                self.scan_attribute_list(child);
            }
        }
    }

    fn scan_attribute_list(&mut self, node: Node) {
        for attr in children_of_kind_vec(node, "attribute") {
            if let Some(name) = attr.child_by_field_name("name") {
                let text = node_text(name, self.source);
                self.emit(text, ReferenceKind::AttributeUsage, name);
                // `[Preserve]` may refer to class PreserveAttribute
                let simple = simple_type_name(text);
                if !simple.ends_with("Attribute") {
                    self.emit(&format!("{simple}Attribute"), ReferenceKind::AttributeUsage, name);
                }
            }
            if let Some(args) = first_child_of_kind(attr, "attribute_argument_list") {
                self.scan_children(args);
            }
        }
    }

    fn scan_invocation(&mut self, node: Node) {
        let Some(function) = node.child_by_field_name("function") else {
            self.scan_children(node);
            return;
        };

        // nameof is the one construct that must not produce usage edges
        if node_text(function, self.source) == "nameof" {
            if let Some(args) = node.child_by_field_name("arguments") {
                self.emit_nameof_refs(args);
            }
            return;
        }

        let callee = match function.kind() {
            "identifier" => {
                let name = node_text(function, self.source).to_string();
                self.emit(&name, ReferenceKind::Invocation, function);
                Some(name)
            }
            "generic_name" => {
                let name = first_child_of_kind(function, "identifier")
                    .map(|n| node_text(n, self.source).to_string());
                if let Some(n) = &name {
                    self.emit(n, ReferenceKind::Invocation, function);
                }
                self.scan_type_arguments(function, name.as_deref());
                name
            }
            "member_access_expression" => {
                if let Some(expr) = function.child_by_field_name("expression") {
                    self.scan(expr);
                }
                match function.child_by_field_name("name") {
                    Some(name) if name.kind() == "generic_name" => {
                        let simple = first_child_of_kind(name, "identifier")
                            .map(|n| node_text(n, self.source).to_string());
                        if let Some(n) = &simple {
                            self.emit(n, ReferenceKind::Invocation, name);
                        }
                        self.scan_type_arguments(name, simple.as_deref());
                        simple
                    }
                    Some(name) => {
                        let n = node_text(name, self.source).to_string();
                        self.emit(&n, ReferenceKind::Invocation, name);
                        Some(n)
                    }
                    None => None,
                }
            }
            "member_binding_expression" => {
                let name = function
                    .child_by_field_name("name")
                    .map(|n| node_text(n, self.source).to_string());
                if let Some(n) = &name {
                    self.emit(n, ReferenceKind::Invocation, function);
                }
                name
            }
            _ => {
                self.scan(function);
                None
            }
        };

        // Reflection lookups by string literal name the member they reach
        if let (Some(callee_name), Some(args)) = (&callee, node.child_by_field_name("arguments")) {
            if REFLECTION_LOOKUPS.contains(&callee_name.as_str()) {
                if let Some(literal) = first_string_literal(args, self.source) {
                    self.emit(&literal, ReferenceKind::Reflection, args);
                }
            }
        }

        if let Some(args) = node.child_by_field_name("arguments") {
            let mut index = 0usize;
            let mut cursor = args.walk();
            for arg in args.children(&mut cursor) {
                if arg.kind() != "argument" {
                    continue;
                }
                let expr = last_named_child(arg);
                if let (Some(expr), Some(callee_name)) = (expr, &callee) {
                    if expr.kind() == "typeof_expression" {
                        self.record_typeof_flow(
                            expr,
                            FlowSite::Argument {
                                callee: callee_name.clone(),
                                index,
                            },
                        );
                    }
                }
                self.scan_children(arg);
                index += 1;
            }
        }
    }

    fn scan_object_creation(&mut self, node: Node) {
        if let Some(ty) = node.child_by_field_name("type") {
            let simple = simple_type_name(node_text(ty, self.source));
            self.emit(simple, ReferenceKind::Instantiation, ty);
            if ty.kind() == "generic_name" {
                self.scan_type_arguments(ty, Some(simple));
            } else if ty.kind() == "qualified_name" {
                if let Some(name) = ty.child_by_field_name("name") {
                    if name.kind() == "generic_name" {
                        self.scan_type_arguments(name, Some(simple));
                    }
                }
            }
        }
        if let Some(args) = node.child_by_field_name("arguments") {
            self.scan_children(args);
        }
        if let Some(init) = node.child_by_field_name("initializer") {
            self.scan_initializer(init);
        }
    }

    fn scan_initializer(&mut self, node: Node) {
        let assignments = children_of_kind_vec(node, "assignment_expression");
        if assignments.is_empty() {
            // `new C { a, b }` — collection initializer, satisfied by Add
            let mut has_elements = false;
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.is_named() {
                    has_elements = true;
                    self.scan(child);
                }
            }
            if has_elements {
                self.facts.demands.has_collection_initializer = true;
            }
        } else {
            // `new C { Prop = x }` — object initializer writes
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == "assignment_expression" {
                    if let Some(left) = child.child_by_field_name("left") {
                        if left.kind() == "identifier" {
                            self.emit(node_text(left, self.source), ReferenceKind::Write, left);
                        } else {
                            self.scan(left);
                        }
                    }
                    if let Some(right) = child.child_by_field_name("right") {
                        self.scan(right);
                    }
                } else if child.is_named() {
                    self.scan(child);
                }
            }
        }
    }

    fn scan_assignment(&mut self, node: Node) {
        let op = operator_token(node, self.source).unwrap_or_else(|| "=".to_string());
        let compound = op != "=";
        if compound {
            // `a += b` consumes the underlying binary operator
            let base_op = op.trim_end_matches('=');
            if !base_op.is_empty() {
                self.facts.demands.operator_tokens.insert(base_op.to_string());
            }
        }

        if let Some(left) = node.child_by_field_name("left") {
            match left.kind() {
                "identifier" => {
                    let name = node_text(left, self.source).to_string();
                    if compound {
                        self.emit(&name, ReferenceKind::Read, left);
                    }
                    self.emit(&name, ReferenceKind::Write, left);
                }
                "member_access_expression" => {
                    if let Some(expr) = left.child_by_field_name("expression") {
                        self.scan(expr);
                    }
                    if let Some(name) = left.child_by_field_name("name") {
                        let n = node_text(name, self.source).to_string();
                        if compound {
                            self.emit(&n, ReferenceKind::Read, name);
                        }
                        self.emit(&n, ReferenceKind::Write, name);
                    }
                }
                "tuple_expression" | "tuple_pattern" => {
                    // `(a, b) = expr` — deconstruction
                    self.facts.demands.has_deconstruction = true;
                    self.scan_children(left);
                }
                "element_access_expression" => {
                    self.facts.demands.has_element_access = true;
                    self.scan_children(left);
                }
                "declaration_expression" => {
                    // `var (x, y) = expr`
                    self.facts.demands.has_deconstruction = true;
                }
                _ => self.scan(left),
            }
        }

        if let Some(right) = node.child_by_field_name("right") {
            if right.kind() == "typeof_expression" {
                if let Some(left) = node.child_by_field_name("left") {
                    let target = match left.kind() {
                        "identifier" => Some(node_text(left, self.source).to_string()),
                        "member_access_expression" => left
                            .child_by_field_name("name")
                            .map(|n| node_text(n, self.source).to_string()),
                        _ => None,
                    };
                    if let Some(target) = target {
                        self.record_typeof_flow(right, FlowSite::Assignment { target });
                    }
                }
            }
            self.scan(right);
        }
    }

    fn scan_typeof(&mut self, node: Node) {
        if let Some(ty) = node.child_by_field_name("type") {
            let simple = simple_type_name(node_text(ty, self.source));
            self.emit(simple, ReferenceKind::TypeOf, ty);
            if ty.kind() == "generic_name" {
                self.scan_type_arguments(ty, None);
            }
        }
    }

    fn scan_pattern(&mut self, node: Node) {
        match node.kind() {
            "declaration_pattern" | "type_pattern" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    self.scan_type_refs(ty, ReferenceKind::Cast);
                }
            }
            "recursive_pattern" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    self.scan_type_refs(ty, ReferenceKind::Cast);
                }
                if first_child_of_kind(node, "positional_pattern_clause").is_some() {
                    self.facts.demands.has_deconstruction = true;
                }
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.is_named() && child.kind() != "type" {
                        self.scan_pattern(child);
                    }
                }
            }
            "constant_pattern" | "property_pattern_clause" | "positional_pattern_clause"
            | "subpattern" | "case_pattern_switch_label" | "switch_expression_arm" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.is_named() {
                        self.scan_pattern(child);
                    }
                }
            }
            _ => self.scan(node),
        }
    }

    /// Emit NameOf references for every identifier under a nameof argument
    fn emit_nameof_refs(&mut self, node: Node) {
        if node.kind() == "identifier" {
            self.emit(node_text(node, self.source), ReferenceKind::NameOf, node);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.emit_nameof_refs(child);
        }
    }

    fn scan_type_arguments(&mut self, generic_name: Node, owner: Option<&str>) {
        let Some(args) = first_child_of_kind(generic_name, "type_argument_list") else {
            return;
        };
        let mut index = 0usize;
        let mut cursor = args.walk();
        for arg in args.children(&mut cursor) {
            if !arg.is_named() {
                continue;
            }
            self.scan_type_refs(arg, ReferenceKind::TypeArgument);
            if let Some(owner) = owner {
                let simple = simple_type_name(node_text(arg, self.source));
                if !simple.is_empty() && simple != "var" {
                    self.facts.flows.push(TypeOfFlow {
                        type_name: simple.to_string(),
                        site: FlowSite::GenericArgument {
                            owner: owner.to_string(),
                            index,
                        },
                    });
                }
            }
            index += 1;
        }
    }

    /// Emit references for a type syntax node, unwrapping arrays, nullables,
    /// pointers, tuples, and generics
    fn scan_type_refs(&mut self, node: Node, kind: ReferenceKind) {
        match node.kind() {
            "identifier" | "type_identifier" => {
                self.emit(node_text(node, self.source), kind, node);
            }
            "qualified_name" => {
                self.emit(node_text(node, self.source), kind, node);
                if let Some(name) = node.child_by_field_name("name") {
                    if name.kind() == "generic_name" {
                        self.scan_type_arguments(name, None);
                    }
                }
            }
            "generic_name" => {
                if let Some(ident) = first_child_of_kind(node, "identifier") {
                    self.emit(node_text(ident, self.source), kind, ident);
                }
                self.scan_type_arguments(node, None);
            }
            "array_type" | "nullable_type" | "pointer_type" | "ref_type" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    self.scan_type_refs(ty, kind);
                } else {
                    let mut cursor = node.walk();
                    for child in node.children(&mut cursor) {
                        if child.is_named() {
                            self.scan_type_refs(child, kind);
                        }
                    }
                }
            }
            "tuple_type" => {
                for element in children_of_kind_vec(node, "tuple_element") {
                    if let Some(ty) = element.child_by_field_name("type") {
                        self.scan_type_refs(ty, kind);
                    }
                }
            }
            "predefined_type" => {}
            "primary_constructor_base_type" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    self.scan_type_refs(ty, ReferenceKind::Inheritance);
                } else if let Some(ident) = first_child_of_kind(node, "identifier") {
                    self.emit(node_text(ident, self.source), ReferenceKind::Inheritance, ident);
                }
                if let Some(args) = first_child_of_kind(node, "argument_list") {
                    self.scan_children(args);
                }
            }
            _ => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.is_named() {
                        self.scan_type_refs(child, kind);
                    }
                }
            }
        }
    }

    fn scan_name_node(&mut self, name: Node, kind: ReferenceKind) {
        if name.kind() == "generic_name" {
            if let Some(ident) = first_child_of_kind(name, "identifier") {
                self.emit(node_text(ident, self.source), kind, ident);
            }
            self.scan_type_arguments(name, None);
        } else {
            self.emit(node_text(name, self.source), kind, name);
        }
    }

    fn record_typeof_flow(&mut self, typeof_node: Node, site: FlowSite) {
        if let Some(ty) = typeof_node.child_by_field_name("type") {
            let simple = simple_type_name(node_text(ty, self.source));
            if !simple.is_empty() {
                self.facts.flows.push(TypeOfFlow {
                    type_name: simple.to_string(),
                    site,
                });
            }
        }
    }
}

// ---- shared node helpers ----

fn has_child_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == token);
    found
}

fn first_child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

fn children_of_kind_vec<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).filter(|c| c.kind() == kind).collect()
}

fn last_named_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let mut last = None;
    for child in node.children(&mut cursor) {
        if child.is_named() {
            last = Some(child);
        }
    }
    last
}

fn type_name(node: Node, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
}

fn has_arrow_body(node: Node) -> bool {
    first_child_of_kind(node, "arrow_expression_clause").is_some()
}

fn collect_modifiers(node: Node, source: &str) -> Vec<String> {
    let mut modifiers = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifier" {
            modifiers.push(node_text(child, source).to_string());
        }
    }
    modifiers
}

fn collect_attributes(node: Node, source: &str) -> Vec<String> {
    let mut attributes = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "attribute_list" {
            continue;
        }
        let mut ac = child.walk();
        for attr in child.children(&mut ac) {
            if attr.kind() == "attribute" {
                attributes.push(node_text(attr, source).to_string());
            }
        }
    }
    attributes
}

fn collect_base_list(node: Node, source: &str) -> Vec<String> {
    let base_list = node
        .child_by_field_name("bases")
        .or_else(|| first_child_of_kind(node, "base_list"));
    let Some(bases) = base_list else {
        return Vec::new();
    };
    let mut result = Vec::new();
    let mut cursor = bases.walk();
    for base in bases.children(&mut cursor) {
        if base.is_named() {
            let text = node_text(base, source);
            // Primary-constructor bases carry arguments; keep the type only
            let type_part = text.split('(').next().unwrap_or(text).trim();
            if !type_part.is_empty() {
                result.push(type_part.to_string());
            }
        }
    }
    result
}

fn parameter_types(node: Node, source: &str) -> Vec<String> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    children_of_kind_vec(params, "parameter")
        .iter()
        .map(|p| {
            p.child_by_field_name("type")
                .map(|t| node_text(t, source).to_string())
                .unwrap_or_default()
        })
        .collect()
}

fn explicit_interface(node: Node, source: &str) -> Option<String> {
    first_child_of_kind(node, "explicit_interface_specifier").map(|spec| {
        node_text(spec, source)
            .trim_end_matches('.')
            .trim()
            .to_string()
    })
}

fn operator_token(node: Node, source: &str) -> Option<String> {
    if let Some(op) = node.child_by_field_name("operator") {
        return Some(node_text(op, source).to_string());
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if !child.is_named() {
            let text = node_text(child, source);
            if !text.is_empty() && !text.chars().any(|c| c.is_alphanumeric()) {
                return Some(text.to_string());
            }
        }
    }
    None
}

fn assignment_target<'t>(node: Node<'t>, source: &str) -> Option<(String, Node<'t>)> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => return Some((node_text(child, source).to_string(), child)),
            "member_access_expression" => {
                if let Some(name) = child.child_by_field_name("name") {
                    return Some((node_text(name, source).to_string(), name));
                }
            }
            _ => {}
        }
    }
    None
}

fn first_string_literal(args: Node, source: &str) -> Option<String> {
    let mut cursor = args.walk();
    for arg in args.children(&mut cursor) {
        if arg.kind() != "argument" {
            continue;
        }
        let mut ac = arg.walk();
        for child in arg.children(&mut ac) {
            if child.kind() == "string_literal" || child.kind() == "verbatim_string_literal" {
                let text = node_text(child, source);
                return Some(text.trim_matches(|c| c == '"' || c == '@').to_string());
            }
        }
        break;
    }
    None
}

/// Flags expression of a DynamicallyAccessedMembers attribute text, if any
fn preserve_flags_expr(attr_text: &str) -> Option<String> {
    let name_end = attr_text.find('(').unwrap_or(attr_text.len());
    let name = attr_text[..name_end].trim();
    let simple = name.rsplit('.').next().unwrap_or(name);
    if simple != "DynamicallyAccessedMembers" && simple != "DynamicallyAccessedMembersAttribute" {
        return None;
    }
    let open = attr_text.find('(')?;
    let close = attr_text.rfind(')')?;
    if close <= open {
        return None;
    }
    Some(attr_text[open + 1..close].trim().to_string())
}
