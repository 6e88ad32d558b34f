//! Candidate source tree: file collection, revision checkout, and the
//! per-workspace vector cache.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use ignore::WalkBuilder;
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::RepositoryConfig;
use crate::core::{Error, Result};
use crate::semantic::{tokenize_stems, vectorize, DocumentVectors, EmbeddingTable};

/// Snapshot of candidate files at the currently checked-out revision,
/// keyed by repository-relative path.
#[derive(Debug, Clone)]
pub struct SourceTree {
    files: BTreeMap<String, String>,
}

impl SourceTree {
    /// Collect candidate files under `root`, respecting .gitignore.
    pub fn collect(root: impl AsRef<Path>, config: &RepositoryConfig) -> Result<Self> {
        let root = root.as_ref().canonicalize()?;
        let mut files = BTreeMap::new();

        let exclude = build_exclude_set(&config.exclude_patterns)?;

        let walker = WalkBuilder::new(&root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default();
            if !config.extensions.iter().any(|e| e == extension) {
                continue;
            }

            let relative = relative_name(&root, path);
            if config.exclude_tests && is_test_path(&relative) {
                continue;
            }
            if let Some(ref matcher) = exclude {
                if matcher.is_match(&relative) {
                    continue;
                }
            }

            // Candidate trees occasionally hold latin-1 sources; lossy
            // decoding keeps them tokenizable.
            let bytes = std::fs::read(path)?;
            files.insert(relative, String::from_utf8_lossy(&bytes).into_owned());
        }

        Ok(Self { files })
    }

    /// Filenames in sorted order.
    pub fn filenames(&self) -> impl Iterator<Item = &String> {
        self.files.keys()
    }

    /// Get a file's contents.
    pub fn get(&self, filename: &str) -> Option<&String> {
        self.files.get(filename)
    }

    /// Iterate over (filename, contents) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.files.iter()
    }

    /// Number of candidate files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the tree has no candidates.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn build_exclude_set(patterns: &[String]) -> Result<Option<globset::GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::Glob::new(pattern)
            .map_err(|e| Error::config(format!("bad exclude pattern {pattern:?}: {e}")))?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| Error::config(e.to_string()))?;
    Ok(Some(set))
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    // Forward slashes regardless of platform; filenames are cache keys.
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_test_path(relative: &str) -> bool {
    relative
        .split('/')
        .any(|segment| segment.to_lowercase().contains("test"))
}

#[derive(Default)]
struct WorkspaceState {
    /// Revision the working tree is known to hold; `None` after a failed
    /// checkout so the next request re-checkouts instead of trusting a
    /// possibly-mismatched tree.
    revision: Option<String>,
    /// File vectors derived from the current revision.
    vectors: HashMap<String, Arc<DocumentVectors>>,
}

/// A checked-out candidate repository with its derived-vector cache.
///
/// Checkout-then-read is a critical section: the internal lock is held from
/// revision switch until every file of the request has been read and
/// vectorized, so no request observes a tree mid-switch. The similarity
/// computation itself runs on the returned `Arc` clones, outside the lock.
pub struct Workspace {
    root: PathBuf,
    state: Mutex<WorkspaceState>,
}

impl Workspace {
    /// Create a workspace over a working tree.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: Mutex::new(WorkspaceState::default()),
        }
    }

    /// The working-tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Revision the tree is currently known to hold.
    pub fn current_revision(&self) -> Option<String> {
        self.state.lock().revision.clone()
    }

    /// Number of cached file vectors.
    pub fn cached_files(&self) -> usize {
        self.state.lock().vectors.len()
    }

    /// Resolve the working tree's HEAD commit.
    pub fn head_revision(&self) -> Result<String> {
        let repo = gix::open(&self.root)
            .map_err(|e| Error::git(format!("failed to open repository: {e}")))?;
        let head = repo
            .head_id()
            .map_err(|e| Error::git(format!("failed to resolve HEAD: {e}")))?;
        Ok(head.to_string())
    }

    /// List candidate filenames at a revision.
    pub fn files_at(&self, revision: &str, config: &RepositoryConfig) -> Result<Vec<String>> {
        let mut state = self.state.lock();
        self.ensure_revision(&mut state, revision)?;
        let tree = SourceTree::collect(&self.root, config)?;
        Ok(tree.filenames().cloned().collect())
    }

    /// Check out a revision and return vectors for every candidate file.
    ///
    /// Vectors are cached per filename and reused across requests until the
    /// next revision switch invalidates them.
    pub fn vectors_at(
        &self,
        revision: &str,
        config: &RepositoryConfig,
        table: &EmbeddingTable,
        filter_stopwords: bool,
    ) -> Result<HashMap<String, Arc<DocumentVectors>>> {
        let mut state = self.state.lock();
        self.ensure_revision(&mut state, revision)?;

        let tree = SourceTree::collect(&self.root, config)?;
        let missing: Vec<(&String, &String)> = tree
            .iter()
            .filter(|(name, _)| !state.vectors.contains_key(*name))
            .collect();

        if !missing.is_empty() {
            debug!(count = missing.len(), "vectorizing candidate files");
            let computed: Vec<(String, Arc<DocumentVectors>)> = missing
                .par_iter()
                .map(|(name, contents)| {
                    let tokens = tokenize_stems(contents, filter_stopwords);
                    ((*name).clone(), Arc::new(vectorize(tokens, table)))
                })
                .collect();
            state.vectors.extend(computed);
        }

        Ok(tree
            .filenames()
            .map(|name| (name.clone(), state.vectors[name].clone()))
            .collect())
    }

    fn ensure_revision(&self, state: &mut WorkspaceState, revision: &str) -> Result<()> {
        if state.revision.as_deref() == Some(revision) {
            return Ok(());
        }

        state.revision = None;
        state.vectors.clear();

        // gix has no porcelain working-tree checkout; shell out and surface
        // the tool's diagnostics on failure.
        let output = Command::new("git")
            .args(["checkout", revision])
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::git(format!("failed to run git checkout: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git(format!(
                "failed to checkout {revision}: {}",
                stderr.trim()
            )));
        }

        info!(revision, "checked out candidate tree");
        state.revision = Some(revision.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("src/main")).unwrap();
        std::fs::create_dir_all(temp.path().join("src/test")).unwrap();
        std::fs::write(
            temp.path().join("src/main/Connector.java"),
            "class Connector {}",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("src/test/ConnectorTest.java"),
            "class ConnectorTest {}",
        )
        .unwrap();
        std::fs::write(temp.path().join("README.md"), "# readme").unwrap();
        temp
    }

    #[test]
    fn test_collect_filters_extension_and_tests() {
        let temp = sample_tree();
        let config = RepositoryConfig::default();

        let tree = SourceTree::collect(temp.path(), &config).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.get("src/main/Connector.java").is_some());
    }

    #[test]
    fn test_collect_keeps_tests_when_configured() {
        let temp = sample_tree();
        let config = RepositoryConfig {
            exclude_tests: false,
            ..RepositoryConfig::default()
        };

        let tree = SourceTree::collect(temp.path(), &config).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_collect_exclude_patterns() {
        let temp = sample_tree();
        let config = RepositoryConfig {
            exclude_patterns: vec!["src/main/**".to_string()],
            ..RepositoryConfig::default()
        };

        let tree = SourceTree::collect(temp.path(), &config).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path("src/test/Foo.java"));
        assert!(is_test_path("src/main/FooTest.java"));
        assert!(!is_test_path("src/main/Foo.java"));
    }

    #[test]
    fn test_checkout_failure_surfaces_diagnostics() {
        let temp = sample_tree();
        let workspace = Workspace::new(temp.path());

        let err = workspace
            .files_at("deadbeef", &RepositoryConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::Git(_)));
        // A failed checkout forgets the revision entirely.
        assert!(workspace.current_revision().is_none());
    }

    #[test]
    fn test_head_revision_outside_repo_fails() {
        let temp = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(temp.path());
        assert!(workspace.head_revision().is_err());
    }
}
