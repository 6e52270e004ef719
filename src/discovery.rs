//! Resolution of configured paths into files to list.
//!
//! Each configured entry is a glob pattern or a directory. A leading `~`
//! expands to the home directory. Directories are walked up to
//! `scan.max_depth`, keeping files whose extension fits the kind they were
//! configured for; glob matches are kept as they are.

use crate::config::Config;
use crate::error::Result;
use crate::parser::{SKIP_DIRS, TERRAFORM_EXTENSIONS};
use crate::types::{FileKind, FileTarget};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Turns a [`Config`]'s path lists into [`FileTarget`]s.
pub struct Discovery<'c> {
    config: &'c Config,
    excludes: Vec<glob::Pattern>,
}

impl<'c> Discovery<'c> {
    /// # Errors
    ///
    /// Returns a `Glob` error if an exclude pattern is invalid.
    pub fn new(config: &'c Config) -> Result<Self> {
        let excludes = config
            .scan
            .exclude_patterns
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern)
                    .map_err(|e| crate::err!(Glob { pattern: pattern.clone(), message: e.to_string() }))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { config, excludes })
    }

    /// Every file the configuration names, configuration first, then plans,
    /// then states. A file reached twice keeps its first classification.
    ///
    /// # Errors
    ///
    /// Returns a `Glob` error if a path pattern is invalid.
    pub fn targets(&self) -> Result<Vec<FileTarget>> {
        let sections = [
            (FileKind::Configuration, self.config.configuration_patterns()),
            (FileKind::Plan, self.config.plan_file_paths.clone()),
            (FileKind::State, self.config.state_file_paths.clone()),
        ];

        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for (kind, patterns) in sections {
            for pattern in &patterns {
                for path in self.resolve(pattern, kind)? {
                    if seen.insert(path.clone()) {
                        targets.push(FileTarget::new(path, kind));
                    }
                }
            }
        }

        tracing::info!(files = targets.len(), "Discovered files");
        Ok(targets)
    }

    fn resolve(&self, pattern: &str, kind: FileKind) -> Result<Vec<PathBuf>> {
        let expanded = expand_home(pattern);
        let as_path = Path::new(&expanded);
        if as_path.is_dir() {
            return Ok(self.walk(as_path, kind));
        }

        let entries = glob::glob(&expanded)
            .map_err(|e| crate::err!(Glob { pattern: pattern.to_string(), message: e.to_string() }))?;

        let mut found = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_dir() => found.extend(self.walk(&path, kind)),
                Ok(path) if self.is_excluded(&path) => {
                    tracing::debug!(path = %path.display(), reason = "matches exclude pattern", "Skipping path");
                }
                Ok(path) => found.push(path),
                Err(e) => tracing::warn!(pattern, error = %e, "Failed to read glob entry"),
            }
        }

        if found.is_empty() {
            tracing::warn!(pattern, %kind, "No files match path");
        }
        Ok(found)
    }

    fn walk(&self, dir: &Path, kind: FileKind) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for entry in WalkDir::new(dir)
            .max_depth(self.config.scan.max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.should_skip(e.path()))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read directory entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && has_extension_for(entry.path(), kind) {
                found.push(entry.into_path());
            }
        }
        found
    }

    fn should_skip(&self, path: &Path) -> bool {
        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            if SKIP_DIRS.contains(&file_name) {
                tracing::debug!(path = %path.display(), reason = "known skip directory", "Skipping path");
                return true;
            }
        }
        if self.is_excluded(path) {
            tracing::debug!(path = %path.display(), reason = "matches exclude pattern", "Skipping path");
            return true;
        }
        false
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let file_name = path.file_name().and_then(|n| n.to_str());
        self.excludes
            .iter()
            .any(|p| p.matches_path(path) || file_name.is_some_and(|name| p.matches(name)))
    }
}

fn has_extension_for(path: &Path, kind: FileKind) -> bool {
    let name = path.to_string_lossy();
    match kind {
        FileKind::Configuration => TERRAFORM_EXTENSIONS.iter().any(|ext| name.ends_with(ext)),
        FileKind::Plan => name.ends_with(".json"),
        FileKind::State => name.ends_with(".tfstate"),
    }
}

/// Replace a leading `~` with the home directory.
#[must_use]
pub fn expand_home(pattern: &str) -> String {
    let rest = match pattern.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return pattern.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{rest}", home.display()),
        None => {
            tracing::warn!(pattern, "Home directory unknown, path left as is");
            pattern.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "").unwrap();
        path
    }

    fn config_for(paths: Vec<String>) -> Config {
        Config { configuration_file_paths: Some(paths), ..Config::default() }
    }

    #[test]
    fn test_directory_walk_filters_extensions_and_skips() {
        let dir = TempDir::new().unwrap();
        let main = touch(dir.path(), "main.tf");
        let json = touch(dir.path(), "nested/vars.tf.json");
        touch(dir.path(), "README.md");
        touch(dir.path(), ".terraform/modules/m/main.tf");

        let config = config_for(vec![dir.path().display().to_string()]);
        let targets = Discovery::new(&config).unwrap().targets().unwrap();

        let paths: Vec<_> = targets.iter().map(|t| t.path.clone()).collect();
        assert_eq!(paths, vec![main, json]);
        assert!(targets.iter().all(|t| t.kind == FileKind::Configuration));
    }

    #[test]
    fn test_glob_per_kind() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.tf");
        let plan = touch(dir.path(), "plan.json");
        let state = touch(dir.path(), "prod.tfstate");

        let config = Config {
            configuration_file_paths: Some(Vec::new()),
            plan_file_paths: vec![format!("{}/*.json", dir.path().display())],
            state_file_paths: vec![format!("{}/*.tfstate", dir.path().display())],
            ..Config::default()
        };
        let targets = Discovery::new(&config).unwrap().targets().unwrap();

        assert_eq!(
            targets,
            vec![FileTarget::new(plan, FileKind::Plan), FileTarget::new(state, FileKind::State)]
        );
    }

    #[test]
    fn test_duplicates_keep_first_kind() {
        let dir = TempDir::new().unwrap();
        let main = touch(dir.path(), "main.tf");
        let pattern = format!("{}/*.tf", dir.path().display());

        let config = config_for(vec![pattern.clone(), dir.path().display().to_string(), pattern]);
        let targets = Discovery::new(&config).unwrap().targets().unwrap();

        assert_eq!(targets, vec![FileTarget::new(main, FileKind::Configuration)]);
    }

    #[test]
    fn test_max_depth_limits_walk() {
        let dir = TempDir::new().unwrap();
        let top = touch(dir.path(), "main.tf");
        touch(dir.path(), "a/b/deep.tf");

        let mut config = config_for(vec![dir.path().display().to_string()]);
        config.scan.max_depth = 1;
        let targets = Discovery::new(&config).unwrap().targets().unwrap();

        assert_eq!(targets, vec![FileTarget::new(top, FileKind::Configuration)]);
    }

    #[test]
    fn test_exclude_patterns() {
        let dir = TempDir::new().unwrap();
        let main = touch(dir.path(), "main.tf");
        touch(dir.path(), "override.tf");

        let mut config = config_for(vec![format!("{}/*.tf", dir.path().display())]);
        config.scan.exclude_patterns = vec!["override.tf".to_string()];
        let targets = Discovery::new(&config).unwrap().targets().unwrap();

        assert_eq!(targets, vec![FileTarget::new(main, FileKind::Configuration)]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = config_for(vec![format!("{}/*.tf", dir.path().display())]);
        assert!(Discovery::new(&config).unwrap().targets().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let config = config_for(vec!["[unclosed".to_string()]);
        let err = Discovery::new(&config).unwrap().targets().unwrap_err();
        assert_eq!(err.exit_code(), 16);
    }

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/infra/*.tf"), format!("{}/infra/*.tf", home.display()));
        assert_eq!(expand_home("~"), home.display().to_string());
        assert_eq!(expand_home("~other/x"), "~other/x");
        assert_eq!(expand_home("/abs/*.tf"), "/abs/*.tf");
    }
}
