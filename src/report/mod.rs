mod json;
mod sarif;
mod terminal;

pub use json::JsonReporter;
pub use sarif::SarifReporter;
pub use terminal::TerminalReporter;

use crate::analysis::Finding;
use miette::Result;
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
    Sarif,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terminal" => Ok(ReportFormat::Terminal),
            "json" => Ok(ReportFormat::Json),
            "sarif" => Ok(ReportFormat::Sarif),
            other => Err(format!("unknown report format '{other}'")),
        }
    }
}

/// Reporter for outputting analysis findings
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
    show_code: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
            show_code: true,
        }
    }

    pub fn with_show_code(mut self, show: bool) -> Self {
        self.show_code = show;
        self
    }

    /// Report the findings
    pub fn report(&self, findings: &[Finding]) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => TerminalReporter::new().with_code(self.show_code).report(findings),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report(findings),
            ReportFormat::Sarif => SarifReporter::new(self.output_path.clone()).report(findings),
        }
    }
}
