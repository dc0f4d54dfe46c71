// Source file discovery

use crate::config::Config;
use ignore::WalkBuilder;
use miette::{IntoDiagnostic, Result};
use rayon::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A discovered C# source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path to the file
    pub path: PathBuf,

    /// Whether the file matches a generated-code convention. Generated
    /// files are parsed (their references count as usage) but their own
    /// declarations are never reported.
    pub generated: bool,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            generated: false,
        }
    }

    pub fn generated(path: PathBuf) -> Self {
        Self {
            path,
            generated: true,
        }
    }

    /// Load and return owned contents
    pub fn read_contents(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).into_diagnostic()
    }
}

/// File finder for discovering C# sources in a project. Naming conventions
/// for generated code follow the .NET ecosystem: `*.g.cs`, `*.g.i.cs`,
/// `*.designer.cs`, `*.generated.cs`, plus an `<auto-generated>` marker in
/// the leading comment lines. `obj/` and `bin/` trees hold compiler
/// artifacts and are skipped outright.
pub struct FileFinder<'a> {
    config: &'a Config,
    generated_name: Regex,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        let mut patterns: Vec<String> = config
            .generated_file_patterns
            .iter()
            .map(|p| regex::escape(p).replace(r"\*", ".*"))
            .collect();
        if patterns.is_empty() {
            patterns.push(r".*\.(g|g\.i|designer|generated)\.cs".to_string());
        }
        let joined = format!("(?i)^({})$", patterns.join("|"));
        let generated_name = Regex::new(&joined)
            .unwrap_or_else(|_| Regex::new(r"(?i)^.*\.(g|g\.i|designer|generated)\.cs$").unwrap());

        Self {
            config,
            generated_name,
        }
    }

    /// Find all C# source files under the given root
    pub fn find_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        debug!("Scanning for files in: {}", root.display());

        let targets = if self.config.targets.is_empty() {
            vec![root.to_path_buf()]
        } else {
            self.config.targets.iter().map(|t| root.join(t)).collect()
        };

        let files: Vec<SourceFile> = targets
            .par_iter()
            .flat_map(|target| self.scan_directory(target))
            .collect();

        debug!("Found {} files", files.len());
        Ok(files)
    }

    fn scan_directory(&self, dir: &Path) -> Vec<SourceFile> {
        if !dir.exists() {
            trace!("Directory does not exist: {}", dir.display());
            return Vec::new();
        }

        if dir.is_file() {
            return self.classify(dir).into_iter().collect();
        }

        let walker = WalkBuilder::new(dir)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .follow_links(false)
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| self.classify(entry.path()))
            .collect()
    }

    fn classify(&self, path: &Path) -> Option<SourceFile> {
        let extension = path.extension().and_then(|e| e.to_str())?;
        if !extension.eq_ignore_ascii_case("cs") {
            return None;
        }

        let path_str = path.to_string_lossy().replace('\\', "/");
        if path_str.contains("/obj/") || path_str.contains("/bin/") {
            trace!("Excluding build output: {}", path.display());
            return None;
        }

        if self.config.should_exclude(path) {
            trace!("Excluding: {}", path.display());
            return None;
        }

        let by_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| self.generated_name.is_match(n))
            .unwrap_or(false);

        if by_name || has_auto_generated_header(path) {
            trace!("Generated file: {}", path.display());
            return Some(SourceFile::generated(path.to_path_buf()));
        }

        Some(SourceFile::new(path.to_path_buf()))
    }
}

/// Check the leading lines for an `<auto-generated>` marker comment
fn has_auto_generated_header(path: &Path) -> bool {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return false;
    };
    contents
        .lines()
        .take(5)
        .any(|line| line.contains("<auto-generated"))
}

/// Statistics about discovered files
#[derive(Debug, Default)]
pub struct FileStats {
    pub source_files: usize,
    pub generated_files: usize,
}

impl FileStats {
    pub fn from_files(files: &[SourceFile]) -> Self {
        let generated = files.iter().filter(|f| f.generated).count();
        Self {
            source_files: files.len() - generated,
            generated_files: generated,
        }
    }
}
