// Configuration loading and validation
//
// Malformed configuration never aborts analysis: every problem becomes a
// ConfigDiagnostic pointing at the offending file and line, and the run
// proceeds with defaults for the broken entries.

use super::{Config, KNOWN_RULES};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// A problem found in a configuration file
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.message)
    }
}

#[derive(Debug, Error)]
enum ParseError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("{message}")]
    Syntax { message: String, line: usize },
}

/// Load configuration from a file (TOML or YAML). Problems come back as
/// diagnostics alongside the best-effort config.
pub fn load_config(path: &Path) -> (Config, Vec<ConfigDiagnostic>) {
    let mut diagnostics = Vec::new();

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            diagnostics.push(ConfigDiagnostic {
                file: path.to_path_buf(),
                line: 1,
                message: ParseError::Io(e).to_string(),
            });
            return (Config::default(), diagnostics);
        }
    };

    let value = match parse_to_value(path, &raw) {
        Ok(value) => value,
        Err(ParseError::Syntax { message, line }) => {
            diagnostics.push(ConfigDiagnostic {
                file: path.to_path_buf(),
                line,
                message,
            });
            return (Config::default(), diagnostics);
        }
        Err(e) => {
            diagnostics.push(ConfigDiagnostic {
                file: path.to_path_buf(),
                line: 1,
                message: e.to_string(),
            });
            return (Config::default(), diagnostics);
        }
    };

    let config = extract_config(&value, &raw, path, &mut diagnostics);
    (config, diagnostics)
}

/// Try the default config file locations under the project root
pub fn load_from_default_locations(project_root: &Path) -> (Config, Vec<ConfigDiagnostic>) {
    let default_names = [
        ".deadsharp.toml",
        ".deadsharp.yml",
        ".deadsharp.yaml",
        "deadsharp.toml",
        "deadsharp.yml",
        "deadsharp.yaml",
    ];

    for name in &default_names {
        let path = project_root.join(name);
        if path.exists() {
            debug!("Loading config from {}", path.display());
            return load_config(&path);
        }
    }

    (Config::default(), Vec::new())
}

/// Parse TOML or YAML into a common JSON value tree. TOML rejects
/// duplicate keys natively; the error span carries the offending line.
fn parse_to_value(path: &Path, raw: &str) -> Result<Value, ParseError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension {
        "yml" | "yaml" => serde_yaml::from_str::<Value>(raw).map_err(|e| ParseError::Syntax {
            line: e.location().map(|l| l.line()).unwrap_or(1),
            message: format!("invalid YAML: {e}"),
        }),
        _ => {
            let value: toml::Value = toml::from_str(raw).map_err(|e| ParseError::Syntax {
                line: e
                    .span()
                    .map(|s| line_of_offset(raw, s.start))
                    .unwrap_or(1),
                message: format!("invalid TOML: {}", e.message()),
            })?;
            serde_json::to_value(&value).map_err(|e| ParseError::Syntax {
                line: 1,
                message: e.to_string(),
            })
        }
    }
}

fn extract_config(
    value: &Value,
    raw: &str,
    path: &Path,
    diagnostics: &mut Vec<ConfigDiagnostic>,
) -> Config {
    let mut config = Config::default();

    let Some(root) = value.as_object() else {
        diagnostics.push(diag(path, 1, "configuration root must be a table"));
        return config;
    };

    for (key, entry) in root {
        match key.as_str() {
            "targets" => {
                if let Some(v) = string_list(entry, raw, path, key, diagnostics) {
                    config.targets = v.into_iter().map(PathBuf::from).collect();
                }
            }
            "exclude" => {
                if let Some(v) = string_list(entry, raw, path, key, diagnostics) {
                    config.exclude.extend(v);
                }
            }
            "retain_patterns" => {
                if let Some(v) = string_list(entry, raw, path, key, diagnostics) {
                    config.retain_patterns = v;
                }
            }
            "entry_points" => {
                if let Some(v) = string_list(entry, raw, path, key, diagnostics) {
                    config.entry_points = v;
                }
            }
            "preserve_attributes" => {
                if let Some(v) = string_list(entry, raw, path, key, diagnostics) {
                    config.preserve_attributes = v;
                }
            }
            "generated_file_patterns" => {
                if let Some(v) = string_list(entry, raw, path, key, diagnostics) {
                    config.generated_file_patterns = v;
                }
            }
            "report" => extract_report(entry, raw, path, &mut config, diagnostics),
            "rules" => extract_rules(entry, raw, path, &mut config, diagnostics),
            other => {
                diagnostics.push(diag(
                    path,
                    find_line(raw, other),
                    &format!("unknown configuration key '{other}'"),
                ));
            }
        }
    }

    config
}

fn extract_report(
    entry: &Value,
    raw: &str,
    path: &Path,
    config: &mut Config,
    diagnostics: &mut Vec<ConfigDiagnostic>,
) {
    let Some(table) = entry.as_object() else {
        diagnostics.push(diag(path, find_line(raw, "report"), "'report' must be a table"));
        return;
    };
    for (key, value) in table {
        match key.as_str() {
            "format" => match value.as_str() {
                Some(f) if matches!(f, "terminal" | "json" | "sarif") => {
                    config.report.format = f.to_string();
                }
                Some(f) => diagnostics.push(diag(
                    path,
                    find_line(raw, f),
                    &format!("unknown report format '{f}' (expected terminal, json, or sarif)"),
                )),
                None => diagnostics.push(diag(
                    path,
                    find_line(raw, key),
                    "'report.format' must be a string",
                )),
            },
            "show_code" => match value.as_bool() {
                Some(b) => config.report.show_code = b,
                None => diagnostics.push(diag(
                    path,
                    find_line(raw, key),
                    "'report.show_code' must be a boolean",
                )),
            },
            other => diagnostics.push(diag(
                path,
                find_line(raw, other),
                &format!("unknown report option '{other}'"),
            )),
        }
    }
}

fn extract_rules(
    entry: &Value,
    raw: &str,
    path: &Path,
    config: &mut Config,
    diagnostics: &mut Vec<ConfigDiagnostic>,
) {
    let Some(table) = entry.as_object() else {
        diagnostics.push(diag(path, find_line(raw, "rules"), "'rules' must be a table"));
        return;
    };

    for (rule_id, options) in table {
        if !KNOWN_RULES.contains(&rule_id.as_str()) {
            diagnostics.push(diag(
                path,
                find_line(raw, rule_id),
                &format!("unknown rule id '{rule_id}'"),
            ));
            continue;
        }

        let Some(option_table) = options.as_object() else {
            diagnostics.push(diag(
                path,
                find_line(raw, rule_id),
                &format!("options for rule '{rule_id}' must be a table"),
            ));
            continue;
        };

        let mut opts = config.rule(rule_id);
        for (key, value) in option_table {
            let slot = match key.as_str() {
                "enabled" => Some(&mut opts.enabled),
                "report_accessors" => Some(&mut opts.report_accessors),
                "skip_type_arguments" => Some(&mut opts.skip_type_arguments),
                other => {
                    diagnostics.push(diag(
                        path,
                        find_line(raw, other),
                        &format!("unknown option '{other}' for rule '{rule_id}'"),
                    ));
                    None
                }
            };
            if let Some(slot) = slot {
                match value.as_bool() {
                    Some(b) => *slot = b,
                    None => diagnostics.push(diag(
                        path,
                        find_line(raw, key),
                        &format!("option '{key}' for rule '{rule_id}' must be a boolean"),
                    )),
                }
            }
        }
        config.rules.insert(rule_id.clone(), opts);
    }
}

fn string_list(
    entry: &Value,
    raw: &str,
    path: &Path,
    key: &str,
    diagnostics: &mut Vec<ConfigDiagnostic>,
) -> Option<Vec<String>> {
    let Some(array) = entry.as_array() else {
        diagnostics.push(diag(
            path,
            find_line(raw, key),
            &format!("'{key}' must be an array of strings"),
        ));
        return None;
    };

    let mut result = Vec::new();
    for item in array {
        match item.as_str() {
            Some(s) => result.push(s.to_string()),
            None => {
                diagnostics.push(diag(
                    path,
                    find_line(raw, key),
                    &format!("'{key}' entries must be strings"),
                ));
                return None;
            }
        }
    }
    Some(result)
}

fn diag(path: &Path, line: usize, message: &str) -> ConfigDiagnostic {
    ConfigDiagnostic {
        file: path.to_path_buf(),
        line,
        message: message.to_string(),
    }
}

/// 1-based line of the first occurrence of `needle` in the raw text
fn find_line(raw: &str, needle: &str) -> usize {
    for (idx, line) in raw.lines().enumerate() {
        if line.contains(needle) {
            return idx + 1;
        }
    }
    1
}

fn line_of_offset(raw: &str, offset: usize) -> usize {
    raw[..offset.min(raw.len())].bytes().filter(|&b| b == b'\n').count() + 1
}
