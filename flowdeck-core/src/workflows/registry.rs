use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, info};

use super::collation::compare_labels;
use super::discovery::DiscoveryPass;
use super::parser::parse_definition_file;
use super::types::WorkflowRecord;
use super::watcher::WatchSubscription;
use crate::config::Config;
use crate::error::Result;
use crate::events::{Event, EventBus, Notifier};

/// Owns the sorted record list for a set of roots and the watch
/// subscriptions that keep it fresh.
pub struct WorkflowRegistry {
    config: Config,
    notifier: Arc<dyn Notifier>,
    events: EventBus,
    roots: RwLock<Vec<PathBuf>>,
    records: RwLock<Arc<[WorkflowRecord]>>,
    scan_lock: tokio::sync::Mutex<()>,
    refresh_pending: AtomicBool,
    subscriptions: Mutex<Vec<WatchSubscription>>,
}

impl WorkflowRegistry {
    pub fn new(config: Config, notifier: Arc<dyn Notifier>, events: EventBus) -> Self {
        Self {
            config,
            notifier,
            events,
            roots: RwLock::new(Vec::new()),
            records: RwLock::new(Arc::from(Vec::new())),
            scan_lock: tokio::sync::Mutex::new(()),
            refresh_pending: AtomicBool::new(false),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current list, sorted by label.
    pub fn records(&self) -> Arc<[WorkflowRecord]> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the roots, re-establishes watches when enabled and rescans.
    pub async fn set_roots(self: &Arc<Self>, roots: Vec<PathBuf>) -> Result<Arc<[WorkflowRecord]>> {
        let roots = normalize_roots(roots)?;
        debug!(roots = ?roots, "workflow roots changed");
        *self.roots.write().unwrap_or_else(PoisonError::into_inner) = roots;

        if self.config.watch.enabled {
            self.watch().await?;
        } else {
            self.dispose();
        }

        Ok(self.scan().await)
    }

    /// Full rescan. Waits for any scan already in flight and runs one more
    /// pass for refreshes requested while this one was running.
    pub async fn scan(&self) -> Arc<[WorkflowRecord]> {
        let _guard = self.scan_lock.lock().await;
        self.refresh_pending.store(false, Ordering::SeqCst);
        let mut records = self.scan_once().await;
        while self.refresh_pending.swap(false, Ordering::SeqCst) {
            records = self.scan_once().await;
        }
        records
    }

    /// Rescan triggered by a change notification. Requests arriving while a
    /// scan runs are folded into one follow-up pass of that scan.
    pub async fn request_refresh(&self) {
        self.refresh_pending.store(true, Ordering::SeqCst);
        loop {
            let Ok(guard) = self.scan_lock.try_lock() else {
                debug!("workflow scan in progress, refresh coalesced");
                return;
            };
            while self.refresh_pending.swap(false, Ordering::SeqCst) {
                self.scan_once().await;
            }
            drop(guard);

            if !self.refresh_pending.load(Ordering::SeqCst) {
                return;
            }
        }
    }

    async fn scan_once(&self) -> Arc<[WorkflowRecord]> {
        let roots = self.roots();
        let mut pass = DiscoveryPass::new(&self.config.registry);
        for root in &roots {
            pass.collect_root(root).await;
        }

        let mut records = Vec::new();
        for path in pass.into_files() {
            records.push(
                parse_definition_file(&path, &self.config.registry, self.notifier.as_ref()).await,
            );
        }
        records.sort_by(|left, right| {
            compare_labels(&left.label, &right.label)
                .then_with(|| left.source_path.cmp(&right.source_path))
        });

        let records: Arc<[WorkflowRecord]> = Arc::from(records);
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = records.clone();
        info!(
            roots = roots.len(),
            workflows = records.len(),
            "workflow scan complete"
        );
        self.events.publish(Event::RecordsUpdated {
            count: records.len(),
        });
        records
    }

    /// Resolves a record by exact label, case-insensitive label, then path.
    pub fn find(&self, query: &str) -> Option<WorkflowRecord> {
        let records = self.records();
        let query = query.trim();

        if let Some(record) = records.iter().find(|record| record.label == query) {
            return Some(record.clone());
        }
        let folded = query.to_lowercase();
        if let Some(record) = records
            .iter()
            .find(|record| record.label.to_lowercase() == folded)
        {
            return Some(record.clone());
        }

        let candidate = Path::new(query);
        let roots = self.roots();
        records
            .iter()
            .find(|record| {
                record.source_path == candidate
                    || roots
                        .iter()
                        .any(|root| record.source_path == root.join(candidate))
            })
            .cloned()
    }

    /// Subscribes to changes under every current root, replacing any
    /// existing subscriptions.
    pub async fn watch(self: &Arc<Self>) -> Result<()> {
        self.dispose();

        let interval = Duration::from_millis(self.config.watch.poll_interval_ms);
        let mut subscriptions = Vec::new();
        for root in self.roots() {
            let registry = Arc::downgrade(self);
            let subscription = WatchSubscription::spawn(
                root,
                &self.config.registry,
                interval,
                move |event| {
                    let Some(registry) = registry.upgrade() else {
                        return;
                    };
                    debug!(
                        root = %event.root.display(),
                        created = event.created.len(),
                        modified = event.modified.len(),
                        deleted = event.deleted.len(),
                        "workflow files changed"
                    );
                    tokio::spawn(async move {
                        registry.request_refresh().await;
                    });
                },
            )
            .await?;
            subscriptions.push(subscription);
        }

        *self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = subscriptions;
        Ok(())
    }

    pub fn watched_roots(&self) -> Vec<PathBuf> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|subscription| subscription.is_active())
            .map(|subscription| subscription.root().to_path_buf())
            .collect()
    }

    /// Releases every watch subscription.
    pub fn dispose(&self) {
        let subscriptions = std::mem::take(
            &mut *self
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for subscription in &subscriptions {
            subscription.dispose();
        }
    }
}

impl Drop for WorkflowRegistry {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn normalize_roots(roots: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let mut normalized: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(root)
        };
        if !normalized.contains(&root) {
            normalized.push(root);
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Severity;
    use crate::workflows::testing::{write_file, RecordingNotifier};

    fn registry_with(config: Config) -> (Arc<WorkflowRegistry>, Arc<RecordingNotifier>, EventBus) {
        let notifier = Arc::new(RecordingNotifier::default());
        let events = EventBus::default();
        let registry = Arc::new(WorkflowRegistry::new(
            config,
            notifier.clone(),
            events.clone(),
        ));
        (registry, notifier, events)
    }

    fn unwatched() -> Config {
        let mut config = Config::default();
        config.watch.enabled = false;
        config
    }

    fn labels(records: &[WorkflowRecord]) -> Vec<&str> {
        records.iter().map(|record| record.label.as_str()).collect()
    }

    #[tokio::test]
    async fn end_to_end_two_definitions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write_file(&root.join(".flowdeck/a.yaml"), "name: Build\ncommand: make\n");
        write_file(&root.join(".flowdeck/b.json"), "{}");
        let (registry, notifier, _) = registry_with(unwatched());

        let records = registry
            .set_roots(vec![root.to_path_buf()])
            .await
            .expect("scan");

        assert_eq!(
            records.as_ref(),
            &[
                WorkflowRecord {
                    label: "b.json".to_owned(),
                    description: None,
                    command: None,
                    source_path: root.join(".flowdeck/b.json"),
                },
                WorkflowRecord {
                    label: "Build".to_owned(),
                    description: None,
                    command: Some("make".to_owned()),
                    source_path: root.join(".flowdeck/a.yaml"),
                },
            ]
        );
        assert!(notifier.is_empty());
    }

    #[tokio::test]
    async fn one_record_per_file_even_when_malformed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write_file(&root.join(".flowdeck/good.yaml"), "name: Good\ndescription: fine\n");
        write_file(&root.join(".flowdeck/bad.yaml"), "name: [oops\n");
        write_file(&root.join(".flowdeck/bad.json"), "{ nope");
        write_file(&root.join(".flowdeck/sub/empty.yml"), "");
        write_file(&root.join(".flowdeck/list.yaml"), "- a\n- b\n");
        let (registry, notifier, _) = registry_with(unwatched());

        let records = registry
            .set_roots(vec![root.to_path_buf()])
            .await
            .expect("scan");

        assert_eq!(
            labels(&records),
            vec!["bad.json", "bad.yaml", "empty.yml", "Good", "list.yaml"]
        );
        let warnings = notifier.messages(Severity::Warning);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|message| message.contains("bad.yaml")));
        assert!(warnings.iter().any(|message| message.contains("bad.json")));
    }

    #[tokio::test]
    async fn records_stay_sorted_across_roots() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        write_file(&first.path().join(".flowdeck/z.yaml"), "name: zeta");
        write_file(&first.path().join(".flowdeck/m.yaml"), "name: Mu");
        write_file(&second.path().join(".flowdeck/a.yaml"), "name: alpha");
        write_file(&second.path().join(".flowdeck/d.yaml"), "name: Delta");
        let (registry, _, _) = registry_with(unwatched());

        let records = registry
            .set_roots(vec![first.path().to_path_buf(), second.path().to_path_buf()])
            .await
            .expect("scan");

        assert_eq!(labels(&records), vec!["alpha", "Delta", "Mu", "zeta"]);
    }

    #[tokio::test]
    async fn rescanning_unchanged_files_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(&dir.path().join(".flowdeck/a.yaml"), "name: Same\ncommand: one");
        write_file(&dir.path().join(".flowdeck/b.yaml"), "name: Same\ncommand: two");
        write_file(&dir.path().join(".flowdeck/c.json"), r#"{"description": "x"}"#);
        let (registry, _, _) = registry_with(unwatched());

        let first = registry
            .set_roots(vec![dir.path().to_path_buf()])
            .await
            .expect("scan");
        let second = registry.scan().await;

        assert_eq!(first.as_ref(), second.as_ref());
        assert_eq!(registry.records().as_ref(), second.as_ref());
    }

    #[tokio::test]
    async fn roots_without_designated_dir_are_skipped() {
        let empty = tempfile::tempdir().expect("tempdir");
        let missing = empty.path().join("does-not-exist");
        let (registry, notifier, _) = registry_with(unwatched());

        let records = registry
            .set_roots(vec![empty.path().to_path_buf(), missing])
            .await
            .expect("scan");

        assert!(records.is_empty());
        assert!(notifier.is_empty());
    }

    #[tokio::test]
    async fn scan_publishes_record_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(&dir.path().join(".flowdeck/a.yaml"), "name: A");
        let (registry, _, events) = registry_with(unwatched());
        let mut rx = events.subscribe();

        registry
            .set_roots(vec![dir.path().to_path_buf()])
            .await
            .expect("scan");

        assert_eq!(
            rx.try_recv().expect("event"),
            Event::RecordsUpdated { count: 1 }
        );
    }

    #[tokio::test]
    async fn find_matches_label_then_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(&dir.path().join(".flowdeck/a.yaml"), "name: Build");
        write_file(&dir.path().join(".flowdeck/b.yaml"), "name: Test");
        let (registry, _, _) = registry_with(unwatched());
        registry
            .set_roots(vec![dir.path().to_path_buf()])
            .await
            .expect("scan");

        assert_eq!(registry.find("Build").map(|r| r.label), Some("Build".to_owned()));
        assert_eq!(registry.find("test").map(|r| r.label), Some("Test".to_owned()));
        assert_eq!(
            registry.find(".flowdeck/a.yaml").map(|r| r.label),
            Some("Build".to_owned())
        );
        assert!(registry.find("deploy").is_none());
    }

    #[tokio::test]
    async fn coalesced_refreshes_leave_a_complete_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        for index in 0..5 {
            write_file(
                &dir.path().join(format!(".flowdeck/task{index}.yaml")),
                &format!("name: Task {index}"),
            );
        }
        let (registry, _, _) = registry_with(unwatched());
        registry
            .set_roots(vec![dir.path().to_path_buf()])
            .await
            .expect("scan");
        write_file(&dir.path().join(".flowdeck/task5.yaml"), "name: Task 5");

        tokio::join!(
            registry.request_refresh(),
            registry.request_refresh(),
            registry.request_refresh()
        );

        assert_eq!(registry.records().len(), 6);
    }

    /// Writes a new definition the first time a parse warning comes in and
    /// flags a refresh, the way a watch callback does while a scan holds the lock.
    struct ChangeDuringScan {
        registry: std::sync::OnceLock<std::sync::Weak<WorkflowRegistry>>,
        new_file: PathBuf,
    }

    impl Notifier for ChangeDuringScan {
        fn notify(&self, _severity: Severity, _message: String) {
            if self.new_file.exists() {
                return;
            }
            write_file(&self.new_file, "name: New");
            if let Some(registry) = self.registry.get().and_then(std::sync::Weak::upgrade) {
                assert!(registry.scan_lock.try_lock().is_err());
                registry.refresh_pending.store(true, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn change_noted_mid_scan_triggers_another_pass() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(&dir.path().join(".flowdeck/broken.yaml"), "name: [oops\n");
        let notifier = Arc::new(ChangeDuringScan {
            registry: std::sync::OnceLock::new(),
            new_file: dir.path().join(".flowdeck/new.yaml"),
        });
        let registry = Arc::new(WorkflowRegistry::new(
            unwatched(),
            notifier.clone(),
            EventBus::default(),
        ));
        let _ = notifier.registry.set(Arc::downgrade(&registry));

        let records = registry
            .set_roots(vec![dir.path().to_path_buf()])
            .await
            .expect("scan");

        assert_eq!(labels(&records), vec!["broken.yaml", "New"]);
        assert!(!registry.refresh_pending.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn refresh_requested_while_locked_runs_once_released() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (registry, _, _) = registry_with(unwatched());
        registry
            .set_roots(vec![dir.path().to_path_buf()])
            .await
            .expect("scan");

        let guard = registry.scan_lock.lock().await;
        write_file(&dir.path().join(".flowdeck/new.yaml"), "name: New");
        registry.request_refresh().await;
        assert!(registry.records().is_empty());
        drop(guard);

        registry.request_refresh().await;
        assert_eq!(labels(&registry.records()), vec!["New"]);
    }

    #[tokio::test]
    async fn watch_triggers_rescan_and_dispose_releases_watches() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::default();
        config.watch.poll_interval_ms = 20;
        let (registry, _, events) = registry_with(config);
        let mut rx = events.subscribe();

        let records = registry
            .set_roots(vec![dir.path().to_path_buf()])
            .await
            .expect("scan");
        assert!(records.is_empty());
        assert_eq!(registry.watched_roots(), vec![dir.path().to_path_buf()]);
        assert_eq!(rx.recv().await.expect("event"), Event::RecordsUpdated { count: 0 });

        write_file(&dir.path().join(".flowdeck/new.yaml"), "name: New");
        let updated = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Ok(Event::RecordsUpdated { count }) = rx.recv().await {
                    if count == 1 {
                        return count;
                    }
                }
            }
        })
        .await
        .expect("watch should trigger a rescan");
        assert_eq!(updated, 1);
        assert_eq!(labels(&registry.records()), vec!["New"]);

        registry.dispose();
        assert!(registry.watched_roots().is_empty());
    }

    #[tokio::test]
    async fn changing_roots_moves_the_watches() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        let (registry, _, _) = registry_with(Config::default());

        registry
            .set_roots(vec![first.path().to_path_buf()])
            .await
            .expect("scan");
        registry
            .set_roots(vec![second.path().to_path_buf()])
            .await
            .expect("scan");

        assert_eq!(registry.watched_roots(), vec![second.path().to_path_buf()]);
    }
}
