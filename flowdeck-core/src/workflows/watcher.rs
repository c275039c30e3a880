use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::schema::RegistryConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileFingerprint {
    size: u64,
    modified_epoch_millis: u128,
}

type Snapshot = HashMap<PathBuf, FileFingerprint>;

/// Paths that changed under one watched root between two polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchEvent {
    pub root: PathBuf,
    pub created: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

impl WatchEvent {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// A polling watch over `<root>/<designated dir>`. Cancelled on `dispose`
/// or drop.
pub struct WatchSubscription {
    root: PathBuf,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl WatchSubscription {
    pub async fn spawn<F>(
        root: PathBuf,
        config: &RegistryConfig,
        poll_interval: Duration,
        on_change: F,
    ) -> Result<Self>
    where
        F: Fn(WatchEvent) + Send + Sync + 'static,
    {
        let matcher = Arc::new(extension_matcher(&config.extensions)?);
        let watched_dir = root.join(&config.designated_dir);
        let cancel = CancellationToken::new();

        let mut previous = snapshot(watched_dir.clone(), matcher.clone())
            .await
            .unwrap_or_default();
        debug!(
            dir = %watched_dir.display(),
            files = previous.len(),
            "watching workflow directory"
        );

        let token = cancel.clone();
        let event_root = root.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let Some(current) = snapshot(watched_dir.clone(), matcher.clone()).await else {
                    continue;
                };
                let event = diff_snapshots(&event_root, &previous, &current);
                previous = current;
                if !event.is_empty() {
                    on_change(event);
                }
            }
            debug!(dir = %watched_dir.display(), "workflow watch stopped");
        });

        Ok(Self {
            root,
            cancel,
            handle,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }

    pub fn dispose(&self) {
        self.cancel.cancel();
    }
}

impl Drop for WatchSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn extension_matcher(extensions: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for ext in extensions {
        let pattern = format!("**/*.{}", ext.trim());
        let glob = GlobBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| Error::Watch(format!("invalid watch pattern '{pattern}': {err}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| Error::Watch(format!("failed to build watch patterns: {err}")))
}

async fn snapshot(dir: PathBuf, matcher: Arc<GlobSet>) -> Option<Snapshot> {
    match tokio::task::spawn_blocking(move || collect_fingerprints(&dir, &matcher)).await {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!("workflow watch snapshot failed: {err}");
            None
        }
    }
}

fn collect_fingerprints(dir: &Path, matcher: &GlobSet) -> Snapshot {
    let mut snapshot = HashMap::new();
    if !dir.is_dir() {
        return snapshot;
    }

    let mut builder = WalkBuilder::new(dir);
    builder.standard_filters(false).follow_links(true);

    for entry in builder.build() {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path);
        if !matcher.is_match(rel) {
            continue;
        }

        let Ok(metadata) = std::fs::metadata(path) else {
            continue;
        };
        let modified_epoch_millis = metadata
            .modified()
            .ok()
            .and_then(|value| value.duration_since(UNIX_EPOCH).ok())
            .map(|value| value.as_millis())
            .unwrap_or(0);
        snapshot.insert(
            path.to_path_buf(),
            FileFingerprint {
                size: metadata.len(),
                modified_epoch_millis,
            },
        );
    }

    snapshot
}

fn diff_snapshots(root: &Path, before: &Snapshot, after: &Snapshot) -> WatchEvent {
    let before_paths = before.keys().collect::<HashSet<_>>();
    let after_paths = after.keys().collect::<HashSet<_>>();

    let mut created = after_paths
        .difference(&before_paths)
        .map(|path| (*path).clone())
        .collect::<Vec<_>>();
    created.sort();

    let mut deleted = before_paths
        .difference(&after_paths)
        .map(|path| (*path).clone())
        .collect::<Vec<_>>();
    deleted.sort();

    let mut modified = before_paths
        .intersection(&after_paths)
        .filter(|path| before.get(**path) != after.get(**path))
        .map(|path| (*path).clone())
        .collect::<Vec<_>>();
    modified.sort();

    WatchEvent {
        root: root.to_path_buf(),
        created,
        modified,
        deleted,
    }
}
