//! Scope-serialized rebuilds for watch mode.
//!
//! A filesystem change is classified into a [`RebuildScope`]. Each scope gets
//! one worker task fed by a capacity-1 channel, so a scope has at most one
//! rebuild running and one queued. Triggers arriving while one is queued are
//! absorbed. Different scopes rebuild concurrently.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};

use crate::{
    build::{BuildError, Builder},
    collector::relative_path,
    ignore::{IgnoreRules, is_hidden_name, is_minified_name},
};

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
    Renamed,
    Other,
}

/// A filesystem change reported by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Unit of rebuild serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RebuildScope {
    /// Documents, templates and copied assets.
    Content,
    /// Sources owned by an external compiler, keyed by its name (`css`, `js`).
    Compiler(String),
}

impl fmt::Display for RebuildScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => f.write_str("content"),
            Self::Compiler(name) => f.write_str(name),
        }
    }
}

/// Map a change under `source_root` to the scope it invalidates.
///
/// Returns `None` for paths outside the root, ignored paths, compiler output
/// and source maps.
pub fn classify(
    event: &ChangeEvent,
    rules: &IgnoreRules,
    source_root: &Path,
) -> Option<RebuildScope> {
    if event.kind == ChangeKind::Other || !event.path.starts_with(source_root) {
        return None;
    }
    let rel = relative_path(source_root, &event.path);
    let name = rel.rsplit('/').next().unwrap_or(&rel);
    if rel.is_empty() || is_hidden_name(name) {
        return None;
    }

    if rules.is_template_path(&rel) {
        return Some(RebuildScope::Content);
    }
    if rules.is_ignored_path(&rel) || is_minified_name(name) || name.ends_with(".map") {
        return None;
    }

    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let scope = match ext.as_str() {
        "css" | "scss" | "sass" | "less" => RebuildScope::Compiler("css".to_string()),
        "js" | "mjs" | "ts" => RebuildScope::Compiler("js".to_string()),
        _ => RebuildScope::Content,
    };
    Some(scope)
}

/// Rebuild entry point invoked by the queue workers.
pub trait Rebuild: Send + Sync + 'static {
    /// Rebuild everything `scope` covers. Runs on a blocking thread.
    fn rebuild(&self, scope: &RebuildScope) -> Result<(), BuildError>;
}

impl Rebuild for Builder {
    fn rebuild(&self, scope: &RebuildScope) -> Result<(), BuildError> {
        // Compiler output changes artifact versions, so pages are re-rendered either way.
        let report = self.build()?;
        info!(
            %scope,
            pages = report.stats.pages,
            failed = report.stats.failed,
            duration_ms = report.stats.duration_ms,
            "rebuild complete"
        );
        Ok(())
    }
}

/// Result of [`RebuildQueue::trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A rebuild was queued.
    Queued,
    /// A rebuild was already queued for the scope.
    Absorbed,
}

/// Emitted when a rebuild finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildEvent {
    pub scope: RebuildScope,
    pub ok: bool,
}

/// Per-scope rebuild serializer.
pub struct RebuildQueue {
    rebuilder: Arc<dyn Rebuild>,
    workers: Mutex<HashMap<RebuildScope, mpsc::Sender<()>>>,
    events: broadcast::Sender<RebuildEvent>,
}

impl fmt::Debug for RebuildQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let workers = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("RebuildQueue")
            .field("workers", &workers)
            .finish_non_exhaustive()
    }
}

impl RebuildQueue {
    /// Create a queue that hands every rebuild to `rebuilder`.
    pub fn new(rebuilder: Arc<dyn Rebuild>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            rebuilder,
            workers: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Receive an event for every finished rebuild.
    pub fn subscribe(&self) -> broadcast::Receiver<RebuildEvent> {
        self.events.subscribe()
    }

    /// Request a rebuild of `scope`.
    ///
    /// Must be called from within a Tokio runtime; the first trigger for a
    /// scope spawns its worker.
    pub fn trigger(&self, scope: RebuildScope) -> TriggerOutcome {
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = workers
            .entry(scope.clone())
            .or_insert_with(|| self.spawn_worker(scope.clone()));

        match sender.try_send(()) {
            Ok(()) => {
                debug!(%scope, "rebuild queued");
                TriggerOutcome::Queued
            }
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!(%scope, "rebuild already queued");
                TriggerOutcome::Absorbed
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                // The worker is gone; replace it and queue on the new one.
                let fresh = self.spawn_worker(scope.clone());
                let outcome = match fresh.try_send(()) {
                    Ok(()) => TriggerOutcome::Queued,
                    Err(_) => TriggerOutcome::Absorbed,
                };
                *sender = fresh;
                outcome
            }
        }
    }

    fn spawn_worker(&self, scope: RebuildScope) -> mpsc::Sender<()> {
        let (tx, mut rx) = mpsc::channel::<()>(1);
        let rebuilder = Arc::clone(&self.rebuilder);
        let events = self.events.clone();

        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                info!(%scope, "rebuilding");
                let task_rebuilder = Arc::clone(&rebuilder);
                let task_scope = scope.clone();
                let result =
                    tokio::task::spawn_blocking(move || task_rebuilder.rebuild(&task_scope)).await;

                let ok = match result {
                    Ok(Ok(())) => true,
                    Ok(Err(e)) => {
                        error!(%scope, error = %e, "rebuild failed");
                        false
                    }
                    Err(e) => {
                        error!(%scope, error = %e, "rebuild task panicked");
                        false
                    }
                };
                // No subscribers is fine.
                let _ = events.send(RebuildEvent {
                    scope: scope.clone(),
                    ok,
                });
            }
            debug!(%scope, "rebuild worker stopped");
        });

        tx
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };

    use bodykit_core::Config;
    use tokio::time::{sleep, timeout};

    use super::*;

    fn rules() -> IgnoreRules {
        let mut config = Config::default();
        config.build.ignore = vec!["*.tmp".to_string()];
        IgnoreRules::from_config(&config).expect("compile rules")
    }

    fn scope_of(path: &str) -> Option<RebuildScope> {
        let event = ChangeEvent::new(ChangeKind::Modified, Path::new("/site/source").join(path));
        classify(&event, &rules(), Path::new("/site/source"))
    }

    #[test]
    fn test_classify() {
        assert_eq!(scope_of("posts/a.md"), Some(RebuildScope::Content));
        assert_eq!(scope_of("img/logo.png"), Some(RebuildScope::Content));
        assert_eq!(scope_of("templates/default.html"), Some(RebuildScope::Content));
        assert_eq!(
            scope_of("styles/main.scss"),
            Some(RebuildScope::Compiler("css".to_string()))
        );
        assert_eq!(
            scope_of("scripts/app.ts"),
            Some(RebuildScope::Compiler("js".to_string()))
        );
    }

    #[test]
    fn test_classify_skips() {
        assert_eq!(scope_of("css/main.min.css"), None);
        assert_eq!(scope_of("css/main.css.map"), None);
        assert_eq!(scope_of("posts/.a.md.swp"), None);
        assert_eq!(scope_of("_drafts/a.md"), None);
        assert_eq!(scope_of("notes.tmp"), None);

        let outside = ChangeEvent::new(ChangeKind::Created, "/elsewhere/a.md");
        assert_eq!(classify(&outside, &rules(), Path::new("/site/source")), None);

        let other = ChangeEvent::new(ChangeKind::Other, "/site/source/a.md");
        assert_eq!(classify(&other, &rules(), Path::new("/site/source")), None);
    }

    #[derive(Default)]
    struct Recorder {
        started: AtomicUsize,
        running: AtomicUsize,
        max_running: AtomicUsize,
    }

    impl Rebuild for Recorder {
        fn rebuild(&self, _scope: &RebuildScope) -> Result<(), BuildError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(200));
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn wait_started(recorder: &Recorder, count: usize) {
        timeout(Duration::from_secs(5), async {
            while recorder.started.load(Ordering::SeqCst) < count {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("rebuild started");
    }

    async fn next_event(rx: &mut broadcast::Receiver<RebuildEvent>) -> RebuildEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_same_scope_is_serialized() {
        let recorder = Arc::new(Recorder::default());
        let queue = RebuildQueue::new(recorder.clone());
        let mut events = queue.subscribe();

        assert_eq!(queue.trigger(RebuildScope::Content), TriggerOutcome::Queued);
        wait_started(&recorder, 1).await;

        assert_eq!(queue.trigger(RebuildScope::Content), TriggerOutcome::Queued);
        assert_eq!(queue.trigger(RebuildScope::Content), TriggerOutcome::Absorbed);
        assert_eq!(queue.trigger(RebuildScope::Content), TriggerOutcome::Absorbed);

        for _ in 0..2 {
            let event = next_event(&mut events).await;
            assert_eq!(event.scope, RebuildScope::Content);
            assert!(event.ok);
        }
        sleep(Duration::from_millis(300)).await;

        assert_eq!(recorder.started.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.max_running.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_different_scopes_run_concurrently() {
        let recorder = Arc::new(Recorder::default());
        let queue = RebuildQueue::new(recorder.clone());
        let mut events = queue.subscribe();

        queue.trigger(RebuildScope::Content);
        queue.trigger(RebuildScope::Compiler("css".to_string()));

        let first = next_event(&mut events).await;
        let second = next_event(&mut events).await;
        assert_ne!(first.scope, second.scope);
        assert_eq!(recorder.max_running.load(Ordering::SeqCst), 2);
    }

    struct Failing;

    impl Rebuild for Failing {
        fn rebuild(&self, _scope: &RebuildScope) -> Result<(), BuildError> {
            Err(BuildError::Io(std::io::Error::other("disk full")))
        }
    }

    #[tokio::test]
    async fn test_failed_rebuild_reports_and_continues() {
        let queue = RebuildQueue::new(Arc::new(Failing));
        let mut events = queue.subscribe();

        queue.trigger(RebuildScope::Content);
        assert!(!next_event(&mut events).await.ok);

        queue.trigger(RebuildScope::Content);
        assert!(!next_event(&mut events).await.ok);
    }
}
