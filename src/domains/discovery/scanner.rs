//! Module Scanner - finds candidate module files under the source directories.
//!
//! Scanning is best-effort: missing or unreadable directories are skipped and
//! the scan itself never fails.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::error::DiscoveryError;
use crate::core::config::DiscoveryConfig;

/// Directory names never descended into below a source root.
const SKIPPED_DIRS: &[&str] = &["node_modules"];

/// Compiled include/exclude rules, matched against a file's name.
#[derive(Debug, Clone)]
pub struct MatchRules {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl MatchRules {
    /// Compile include and exclude patterns.
    pub fn new<I, E>(include: I, exclude: E) -> Result<Self, DiscoveryError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// A file matches iff it matches at least one include rule (or there are
    /// none) and no exclude rule.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        let included = self.include.is_empty() || self.include.iter().any(|r| r.is_match(name));
        included && !self.exclude.iter().any(|r| r.is_match(name))
    }
}

fn compile<P>(patterns: P) -> Result<Vec<Regex>, DiscoveryError>
where
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| {
            let p = p.as_ref();
            Regex::new(p).map_err(|e| DiscoveryError::invalid_pattern(p, e))
        })
        .collect()
}

/// Walks the configured source directories.
#[derive(Debug, Clone)]
pub struct ModuleScanner {
    source_dirs: Vec<PathBuf>,
    rules: MatchRules,
}

impl ModuleScanner {
    /// Build a scanner from the discovery configuration.
    pub fn new(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        Ok(Self {
            source_dirs: config.source_dirs.clone(),
            rules: MatchRules::new(&config.include_patterns, &config.exclude_patterns)?,
        })
    }

    pub fn source_dirs(&self) -> &[PathBuf] {
        &self.source_dirs
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    /// Return every matching module path, sorted and de-duplicated.
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = self
            .source_dirs
            .iter()
            .flat_map(|dir| self.scan_directory(dir))
            .collect();

        found.sort();
        found.dedup();
        debug!("Scan found {} candidate modules", found.len());
        found
    }

    fn scan_directory(&self, dir: &Path) -> Vec<PathBuf> {
        if !dir.is_dir() {
            debug!("Skipping missing source directory {:?}", dir);
            return Vec::new();
        }

        WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.rules.matches(e.path()))
            .map(|e| e.into_path())
            .collect()
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.') || SKIPPED_DIRS.contains(&name))
        .unwrap_or(false)
}
