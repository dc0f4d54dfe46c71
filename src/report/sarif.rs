use crate::analysis::{Finding, RuleId, Severity};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// SARIF reporter for CI/CD integration (GitHub, Azure DevOps, etc.)
pub struct SarifReporter {
    output_path: Option<PathBuf>,
}

impl SarifReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, findings: &[Finding]) -> Result<()> {
        let sarif = SarifReport::from_findings(findings);
        let json = serde_json::to_string_pretty(&sarif).into_diagnostic()?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("SARIF report written to: {}", path.display());
        } else {
            println!("{json}");
        }

        Ok(())
    }
}

/// SARIF 2.1.0 format
#[derive(Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: &'static str,
    version: &'static str,
    #[serde(rename = "informationUri")]
    information_uri: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
struct SarifRule {
    id: &'static str,
    name: &'static str,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_configuration: SarifConfiguration,
}

#[derive(Serialize)]
struct SarifConfiguration {
    level: &'static str,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: &'static str,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
    region: SarifRegion,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
    #[serde(rename = "startColumn")]
    start_column: usize,
}

impl SarifReport {
    fn from_findings(findings: &[Finding]) -> Self {
        let rules = vec![
            SarifRule {
                id: RuleId::UnusedType.code(),
                name: RuleId::UnusedType.name(),
                short_description: SarifMessage {
                    text: "Non-public type is never used".to_string(),
                },
                default_configuration: SarifConfiguration { level: "warning" },
            },
            SarifRule {
                id: RuleId::UninstantiatedClass.code(),
                name: RuleId::UninstantiatedClass.name(),
                short_description: SarifMessage {
                    text: "Non-public class is never instantiated".to_string(),
                },
                default_configuration: SarifConfiguration { level: "warning" },
            },
            SarifRule {
                id: RuleId::UnusedMember.code(),
                name: RuleId::UnusedMember.name(),
                short_description: SarifMessage {
                    text: "Non-public member is never used".to_string(),
                },
                default_configuration: SarifConfiguration { level: "warning" },
            },
            SarifRule {
                id: RuleId::InvalidConfig.code(),
                name: RuleId::InvalidConfig.name(),
                short_description: SarifMessage {
                    text: "Malformed configuration entry".to_string(),
                },
                default_configuration: SarifConfiguration { level: "error" },
            },
        ];

        let results: Vec<SarifResult> = findings
            .iter()
            .map(|f| {
                let level = match f.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                    Severity::Info => "note",
                };

                SarifResult {
                    rule_id: f.rule.code(),
                    level,
                    message: SarifMessage {
                        text: f.message.clone(),
                    },
                    locations: vec![SarifLocation {
                        physical_location: SarifPhysicalLocation {
                            artifact_location: SarifArtifactLocation {
                                uri: f.file.to_string_lossy().to_string(),
                            },
                            region: SarifRegion {
                                start_line: f.line,
                                start_column: f.column,
                            },
                        },
                    }],
                }
            })
            .collect();

        SarifReport {
            schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
            version: "2.1.0",
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "deadsharp",
                        version: env!("CARGO_PKG_VERSION"),
                        information_uri: "https://github.com/pyctamovna/deadsharp",
                        rules,
                    },
                },
                results,
            }],
        }
    }
}
