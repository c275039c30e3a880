use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::schema::RegistryConfig;

/// One enumeration pass over a set of roots. Directories and files are
/// remembered by canonical path, so symlink cycles terminate and a file
/// reachable through several links is reported once.
pub struct DiscoveryPass<'a> {
    config: &'a RegistryConfig,
    visited_dirs: HashSet<PathBuf>,
    seen_files: HashSet<PathBuf>,
    files: Vec<PathBuf>,
}

impl<'a> DiscoveryPass<'a> {
    pub fn new(config: &'a RegistryConfig) -> Self {
        Self {
            config,
            visited_dirs: HashSet::new(),
            seen_files: HashSet::new(),
            files: Vec::new(),
        }
    }

    pub fn designated_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.config.designated_dir)
    }

    /// Collects accepted files below `<root>/<designated dir>`. A root without
    /// the designated directory contributes nothing.
    pub async fn collect_root(&mut self, root: &Path) {
        let base = self.designated_dir(root);
        match tokio::fs::metadata(&base).await {
            Ok(metadata) if metadata.is_dir() => {}
            _ => {
                debug!(root = %root.display(), "no workflow directory under root");
                return;
            }
        }

        let mut queue = VecDeque::new();
        queue.push_back(base);
        while let Some(current) = queue.pop_front() {
            let identity = match tokio::fs::canonicalize(&current).await {
                Ok(path) => path,
                Err(err) => {
                    warn!(dir = %current.display(), "failed to resolve directory: {err}");
                    continue;
                }
            };
            if !self.visited_dirs.insert(identity) {
                debug!(dir = %current.display(), "directory already visited, skipping");
                continue;
            }

            let mut entries = match tokio::fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(dir = %current.display(), "failed to read directory: {err}");
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(err) => {
                        warn!(dir = %current.display(), "failed to read directory entry: {err}");
                        break;
                    }
                };

                let path = entry.path();
                // follows symlinks; dangling links are dropped here
                let Ok(metadata) = tokio::fs::metadata(&path).await else {
                    continue;
                };
                if metadata.is_dir() {
                    queue.push_back(path);
                    continue;
                }
                if !metadata.is_file() || !self.is_candidate(&path) {
                    continue;
                }

                let identity = tokio::fs::canonicalize(&path)
                    .await
                    .unwrap_or_else(|_| path.clone());
                if self.seen_files.insert(identity) {
                    self.files.push(path);
                }
            }
        }
    }

    fn is_candidate(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|value| value.to_str())
            .is_some_and(|ext| self.config.accepts_extension(ext))
    }

    pub fn into_files(self) -> Vec<PathBuf> {
        self.files
    }
}
