// Analysis pipeline: candidate extraction, escape scanning, reachability
// resolution, and the rule detectors built on top of them

pub mod candidates;
pub mod detectors;
pub mod escapes;
pub mod preserve;
mod reachability;

pub use candidates::{CandidateExtractor, CandidateSet};
pub use escapes::ExemptReason;
pub use reachability::{UsageResolution, UsageResolver, UsageSummary};

use crate::config::ConfigDiagnostic;
use crate::graph::{Declaration, Location};
use std::path::PathBuf;

/// The rules this analysis implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleId {
    /// A non-public type with zero external usage
    UnusedType,
    /// A non-public class that is referenced but never instantiated
    UninstantiatedClass,
    /// A non-public member with zero external usage
    UnusedMember,
    /// A malformed configuration entry
    InvalidConfig,
}

impl RuleId {
    pub fn code(&self) -> &'static str {
        match self {
            RuleId::UnusedType => crate::config::RULE_UNUSED_TYPE,
            RuleId::UninstantiatedClass => crate::config::RULE_UNINSTANTIATED_CLASS,
            RuleId::UnusedMember => crate::config::RULE_UNUSED_MEMBER,
            RuleId::InvalidConfig => crate::config::RULE_INVALID_CONFIG,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleId::UnusedType => "unused-internal-type",
            RuleId::UninstantiatedClass => "uninstantiated-internal-class",
            RuleId::UnusedMember => "unused-nonpublic-member",
            RuleId::InvalidConfig => "invalid-configuration",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            RuleId::UnusedType => Severity::Warning,
            RuleId::UninstantiatedClass => Severity::Warning,
            RuleId::UnusedMember => Severity::Warning,
            RuleId::InvalidConfig => Severity::Error,
        }
    }
}

/// Severity levels for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single diagnostic produced by a rule
#[derive(Debug, Clone)]
pub struct Finding {
    pub rule: RuleId,
    pub severity: Severity,
    pub message: String,

    /// Anchor span: the precise sub-unit being reported (a whole
    /// declaration, or a single accessor)
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,

    /// The symbol behind the finding; None for configuration diagnostics
    pub declaration: Option<Declaration>,
}

impl Finding {
    pub fn for_symbol(rule: RuleId, declaration: &Declaration, message: String) -> Self {
        Self::anchored(rule, declaration, &declaration.location, message)
    }

    /// A finding anchored at a sub-span of the symbol (accessor reporting)
    pub fn anchored(
        rule: RuleId,
        declaration: &Declaration,
        anchor: &Location,
        message: String,
    ) -> Self {
        Self {
            rule,
            severity: rule.default_severity(),
            message,
            file: anchor.file.clone(),
            line: anchor.line,
            column: anchor.column,
            declaration: Some(declaration.clone()),
        }
    }

    pub fn from_config(diagnostic: &ConfigDiagnostic) -> Self {
        Self {
            rule: RuleId::InvalidConfig,
            severity: RuleId::InvalidConfig.default_severity(),
            message: diagnostic.message.clone(),
            file: diagnostic.file.clone(),
            line: diagnostic.line,
            column: 1,
            declaration: None,
        }
    }
}

/// Sort findings by file then line for stable output
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.line.cmp(&b.line))
            .then(a.column.cmp(&b.column))
    });
}
