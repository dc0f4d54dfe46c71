use crate::analysis::{Finding, Severity};
use colored::Colorize;
use console::Term;
use miette::Result;
use std::collections::HashMap;
use std::path::PathBuf;

/// Terminal reporter with colored output, grouped by file
pub struct TerminalReporter {
    show_code: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_code: true }
    }

    pub fn with_code(mut self, show: bool) -> Self {
        self.show_code = show;
        self
    }

    pub fn report(&self, findings: &[Finding]) -> Result<()> {
        if findings.is_empty() {
            println!("{}", "No dead symbols found!".green().bold());
            return Ok(());
        }

        let mut by_file: HashMap<PathBuf, Vec<&Finding>> = HashMap::new();
        for finding in findings {
            by_file.entry(finding.file.clone()).or_default().push(finding);
        }

        let width = Term::stdout().size().1 as usize;
        let rule = "─".repeat(width.clamp(20, 100));

        println!();
        println!(
            "{}",
            format!("Found {} findings:", findings.len()).yellow().bold()
        );
        println!();

        let mut files: Vec<_> = by_file.keys().collect();
        files.sort();

        for file in files {
            println!("{}", file.display().to_string().cyan().bold());

            for finding in &by_file[file] {
                self.print_finding(finding);
            }

            println!();
        }

        println!("{}", rule.dimmed());
        self.print_summary(findings);

        Ok(())
    }

    fn print_finding(&self, finding: &Finding) {
        let severity = match finding.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };

        println!(
            "  {}:{} {} [{}] {}",
            finding.line,
            finding.column,
            severity,
            finding.rule.code().dimmed(),
            finding.message
        );

        if self.show_code {
            if let Some(snippet) = read_line(&finding.file, finding.line) {
                println!("      {}", snippet.trim().dimmed());
            }
        }
    }

    fn print_summary(&self, findings: &[Finding]) {
        let errors = findings.iter().filter(|f| f.severity == Severity::Error).count();
        let warnings = findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count();
        let infos = findings.iter().filter(|f| f.severity == Severity::Info).count();

        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(format!("{}", format!("{errors} errors").red()));
        }
        if warnings > 0 {
            parts.push(format!("{}", format!("{warnings} warnings").yellow()));
        }
        if infos > 0 {
            parts.push(format!("{}", format!("{infos} infos").blue()));
        }

        println!("Summary: {}", parts.join(", "));
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn read_line(file: &PathBuf, line: usize) -> Option<String> {
    let contents = std::fs::read_to_string(file).ok()?;
    contents.lines().nth(line.saturating_sub(1)).map(str::to_string)
}
