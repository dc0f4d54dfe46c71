use crate::analysis::{Finding, Severity};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, findings: &[Finding]) -> Result<()> {
        let report = JsonReport::from_findings(findings);
        let json = serde_json::to_string_pretty(&report).into_diagnostic()?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{json}");
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    total_findings: usize,
    findings: Vec<JsonFinding>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonFinding {
    rule: &'static str,
    name: &'static str,
    severity: &'static str,
    message: String,
    file: String,
    line: usize,
    column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<JsonSymbol>,
}

#[derive(Serialize)]
struct JsonSymbol {
    name: String,
    kind: &'static str,
    accessibility: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fully_qualified_name: Option<String>,
}

#[derive(Serialize)]
struct JsonSummary {
    errors: usize,
    warnings: usize,
    infos: usize,
}

impl JsonReport {
    fn from_findings(findings: &[Finding]) -> Self {
        let mut errors = 0;
        let mut warnings = 0;
        let mut infos = 0;

        let entries: Vec<JsonFinding> = findings
            .iter()
            .map(|f| {
                match f.severity {
                    Severity::Error => errors += 1,
                    Severity::Warning => warnings += 1,
                    Severity::Info => infos += 1,
                }

                JsonFinding {
                    rule: f.rule.code(),
                    name: f.rule.name(),
                    severity: f.severity.as_str(),
                    message: f.message.clone(),
                    file: f.file.to_string_lossy().to_string(),
                    line: f.line,
                    column: f.column,
                    symbol: f.declaration.as_ref().map(|d| JsonSymbol {
                        name: d.name.clone(),
                        kind: d.kind.display_name(),
                        accessibility: d.accessibility.as_str(),
                        fully_qualified_name: d.fully_qualified_name.clone(),
                    }),
                }
            })
            .collect();

        Self {
            version: "1.0",
            total_findings: findings.len(),
            findings: entries,
            summary: JsonSummary {
                errors,
                warnings,
                infos,
            },
        }
    }
}
