use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::{Walk, WalkBuilder, overrides::OverrideBuilder};
use regex::Regex;

use crate::fault::Failure;

/// How candidate files are matched by name.
#[derive(Debug, Clone)]
enum NameFilter {
    /// gitignore-style glob, applied through walk overrides.
    Glob(String),
    /// `/regex/` matched against the file name.
    Regex(Regex),
}

impl NameFilter {
    fn parse(pattern: &str) -> Result<Self> {
        if pattern.len() > 2 && pattern.starts_with('/') && pattern.ends_with('/') {
            let body = &pattern[1..pattern.len() - 1];
            let re = Regex::new(body).with_context(|| format!("invalid pattern {pattern}"))?;
            return Ok(NameFilter::Regex(re));
        }
        OverrideBuilder::new("")
            .add(pattern)
            .with_context(|| format!("invalid pattern {pattern}"))?;
        Ok(NameFilter::Glob(pattern.to_string()))
    }
}

/// Lazy, restartable view over the source files below a set of roots.
#[derive(Debug, Clone)]
pub struct SourceFinder {
    roots: Vec<PathBuf>,
    excludes: Vec<String>,
    filter: NameFilter,
}

impl SourceFinder {
    /// # Errors
    /// Fails when a root does not exist or the pattern is an invalid regex.
    pub fn new<P: AsRef<Path>>(roots: &[P], excludes: &[String], pattern: &str) -> Result<Self> {
        let mut checked = Vec::with_capacity(roots.len());
        for root in roots {
            let root = root.as_ref();
            if !root.exists() {
                return Err(Failure::MissingPath(root.display().to_string()).into());
            }
            checked.push(root.to_path_buf());
        }
        Ok(SourceFinder {
            roots: checked,
            excludes: excludes.to_vec(),
            filter: NameFilter::parse(pattern)?,
        })
    }

    /// Starts a fresh pass over all roots.
    pub fn files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.roots
            .iter()
            .flat_map(move |root| self.walk(root))
    }

    fn walk<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
        let walk = self.walker(root);
        walk.filter_map(|dent| match dent {
            Ok(d) => Some(d),
            Err(err) => {
                tracing::debug!(%err, "skipping unreadable entry");
                None
            }
        })
        .filter(|dent| dent.file_type().is_some_and(|t| t.is_file()))
        .filter(move |dent| dent.depth() == 0 || self.name_matches(dent.path()))
        .map(ignore::DirEntry::into_path)
    }

    fn walker(&self, root: &Path) -> Walk {
        let mut builder = WalkBuilder::new(root);
        builder.standard_filters(false);
        builder.hidden(true);
        builder.sort_by_file_name(|a, b| a.cmp(b));

        let mut ob = OverrideBuilder::new(root);
        if let NameFilter::Glob(glob) = &self.filter {
            // Checked in `NameFilter::parse`.
            let _ = ob.add(glob);
        }
        for exclude in &self.excludes {
            let Some(rel) = relative_to(root, exclude) else {
                tracing::debug!(%exclude, root = %root.display(), "exclude outside root");
                continue;
            };
            let rel = rel.trim_end_matches('/');
            if rel.is_empty() {
                continue;
            }
            // Anchor to the root so `a/b` cannot match `x/a/b`.
            let _ = ob.add(&format!("!/{rel}"));
        }
        match ob.build() {
            Ok(ov) => {
                builder.overrides(ov);
            }
            Err(err) => tracing::debug!(%err, root = %root.display(), "overrides rejected"),
        }
        tracing::debug!(root = %root.display(), "walking");
        builder.build()
    }

    fn name_matches(&self, path: &Path) -> bool {
        match &self.filter {
            NameFilter::Glob(_) => true,
            NameFilter::Regex(re) => path
                .file_name()
                .and_then(|s| s.to_str())
                .is_some_and(|name| re.is_match(name)),
        }
    }
}

/// Exclude path relative to `root`. Absolute excludes are compared against
/// the absolute form of the root; `None` when they lie outside it.
fn relative_to(root: &Path, exclude: &str) -> Option<String> {
    let path = Path::new(exclude);
    if !path.is_absolute() {
        return Some(exclude.trim_start_matches("./").to_string());
    }
    let root = std::path::absolute(root).ok()?;
    path.strip_prefix(&root)
        .ok()
        .map(|rel| rel.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("api/v1")).unwrap();
        fs::create_dir_all(root.join("vendor/lib")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("api/pets.rs"), "").unwrap();
        fs::write(root.join("api/v1/users.rs"), "").unwrap();
        fs::write(root.join("api/notes.txt"), "").unwrap();
        fs::write(root.join("vendor/lib/dep.rs"), "").unwrap();
        fs::write(root.join(".hidden/secret.rs"), "").unwrap();
        dir
    }

    fn names(finder: &SourceFinder) -> Vec<String> {
        finder
            .files()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn glob_and_excludes() {
        let dir = tree();
        let finder = SourceFinder::new(&[dir.path()], &["vendor".to_string()], "*.rs").unwrap();
        assert_eq!(names(&finder), vec!["pets.rs", "users.rs"]);
    }

    #[test]
    fn nested_exclude_and_absolute_exclude() {
        let dir = tree();
        let abs = dir.path().join("vendor").display().to_string();
        let finder =
            SourceFinder::new(&[dir.path()], &["api/v1/".to_string(), abs], "*.rs").unwrap();
        assert_eq!(names(&finder), vec!["pets.rs"]);
    }

    #[test]
    fn absolute_exclude_under_relative_root() {
        let cwd = std::env::current_dir().unwrap();
        let abs = cwd.join("src/vendor").display().to_string();
        assert_eq!(relative_to(Path::new("src"), &abs).as_deref(), Some("vendor"));
        assert_eq!(relative_to(Path::new("./src"), &abs).as_deref(), Some("vendor"));
        assert_eq!(relative_to(Path::new("lib"), &abs), None);
        assert_eq!(relative_to(Path::new("src"), "./vendor").as_deref(), Some("vendor"));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let dir = tree();
        assert!(SourceFinder::new(&[dir.path()], &[], "*.{rs").is_err());
        assert!(SourceFinder::new(&[dir.path()], &[], "/(rs/").is_err());
    }

    #[test]
    fn regex_pattern() {
        let dir = tree();
        let finder = SourceFinder::new(&[dir.path()], &[], r"/\.txt$/").unwrap();
        assert_eq!(names(&finder), vec!["notes.txt"]);
    }

    #[test]
    fn restartable_and_file_roots() {
        let dir = tree();
        let file = dir.path().join("api/notes.txt");
        let finder = SourceFinder::new(&[file.as_path()], &[], "*.rs").unwrap();
        assert_eq!(names(&finder), vec!["notes.txt"]);
        assert_eq!(names(&finder), vec!["notes.txt"]);
    }

    #[test]
    fn missing_root_fails() {
        let dir = tree();
        let err = SourceFinder::new(&[dir.path().join("nope")], &[], "*.rs").unwrap_err();
        assert!(err.downcast_ref::<Failure>().is_some());
    }
}
