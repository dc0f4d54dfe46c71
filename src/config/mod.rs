// Configuration surface

mod loader;

pub use loader::{load_config, load_from_default_locations, ConfigDiagnostic};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Rule identifiers with stable string forms
pub const RULE_UNUSED_TYPE: &str = "DS001";
pub const RULE_UNINSTANTIATED_CLASS: &str = "DS002";
pub const RULE_UNUSED_MEMBER: &str = "DS003";
pub const RULE_INVALID_CONFIG: &str = "DS900";

pub const KNOWN_RULES: &[&str] = &[RULE_UNUSED_TYPE, RULE_UNINSTANTIATED_CLASS, RULE_UNUSED_MEMBER];

/// Configuration for a deadsharp analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target directories to analyze (relative to the project root)
    pub targets: Vec<PathBuf>,

    /// Path patterns to exclude from analysis
    pub exclude: Vec<String>,

    /// Symbol name patterns to retain - never report as dead
    pub retain_patterns: Vec<String>,

    /// Explicit entry points (fully qualified or simple names)
    pub entry_points: Vec<String>,

    /// Additional attribute names that exempt the decorated symbol
    pub preserve_attributes: Vec<String>,

    /// Extra generated-file name patterns ("*.designer.cs" style)
    pub generated_file_patterns: Vec<String>,

    /// Report configuration
    pub report: ReportConfig,

    /// Per-rule options keyed by rule id ("DS001", ...)
    pub rules: HashMap<String, RuleOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json, sarif
    pub format: String,

    /// Show code snippets in terminal output
    pub show_code: bool,
}

/// Options accepted inside a `[rules.DSxxx]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    pub enabled: bool,

    /// DS003: report individual property/indexer accessors
    pub report_accessors: bool,

    /// DS002: treat generic type-argument positions as instantiation
    /// evidence (a `new()`-constrained argument constructs the type)
    pub skip_type_arguments: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: vec![],
            exclude: vec![
                "**/obj/**".to_string(),
                "**/bin/**".to_string(),
                "**/.vs/**".to_string(),
                "**/TestResults/**".to_string(),
            ],
            retain_patterns: vec![],
            entry_points: vec![],
            preserve_attributes: vec![],
            generated_file_patterns: vec![],
            report: ReportConfig::default(),
            rules: HashMap::new(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
            show_code: true,
        }
    }
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            report_accessors: true,
            skip_type_arguments: true,
        }
    }
}

impl Config {
    /// Options for a rule, falling back to defaults when not configured
    pub fn rule(&self, id: &str) -> RuleOptions {
        self.rules.get(id).cloned().unwrap_or_default()
    }

    pub fn rule_enabled(&self, id: &str) -> bool {
        self.rule(id).enabled
    }

    /// Check if a path matches an exclusion pattern
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.exclude.iter().any(|pattern| glob_match(pattern, &path_str))
    }

    /// Check if a symbol name is retained by configuration
    pub fn should_retain(&self, name: &str) -> bool {
        self.retain_patterns.iter().any(|p| glob_match(p, name))
    }
}

/// Simple glob matching for patterns like "*Factory" or "**/Legacy/**"
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern.starts_with('*') && !pattern.contains('/') {
        let suffix = &pattern[1..];
        return text.ends_with(suffix);
    }

    if pattern.ends_with('*') && !pattern.contains('/') {
        let prefix = &pattern[..pattern.len() - 1];
        return text.starts_with(prefix);
    }

    if pattern.contains("**") {
        if pattern.starts_with("**/") && pattern.ends_with("/**") {
            let dir_name = pattern
                .trim_start_matches("**/")
                .trim_end_matches("/**")
                .trim_matches('/');
            let dir_pattern = format!("/{}/", dir_name);
            return text.contains(&dir_pattern) || text.starts_with(&format!("{}/", dir_name));
        }

        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');

            if prefix.is_empty() && suffix.is_empty() {
                return true;
            }
            if prefix.is_empty() {
                return text.ends_with(suffix) || text.contains(&format!("/{}", suffix));
            }
            if suffix.is_empty() {
                return text.starts_with(prefix) || text.contains(&format!("{}/", prefix));
            }
            return (text.starts_with(prefix) || text.contains(&format!("/{}/", prefix)))
                && (text.ends_with(suffix) || text.contains(&format!("/{}", suffix)));
        }
    }

    text == pattern
}
