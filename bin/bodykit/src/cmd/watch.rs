//! Watch command - rebuild on source changes

use std::{path::Path, sync::Arc};

use bodykit_generator::{
    Builder, ChangeEvent, ChangeKind, RebuildQueue, classify, ignore::IgnoreRules,
};
use color_eyre::eyre::{Result, WrapErr};
use notify::{
    EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use tokio::sync::mpsc;

use super::{load_config, print_failures};

/// Buffered filesystem events between the watcher thread and the runtime.
const EVENT_BUFFER: usize = 256;

/// Run the watch command.
///
/// Builds once, then classifies every change under the source directory and
/// hands it to the per-scope rebuild queue until interrupted.
pub async fn run(config_path: &Path) -> Result<()> {
    tracing::info!(?config_path, "Starting watch mode");

    let config = load_config(config_path)?;
    let rules = IgnoreRules::from_config(&config).wrap_err("Invalid ignore pattern")?;
    let source_root = config.build.source_dir.canonicalize().wrap_err_with(|| {
        format!(
            "Source directory not found: {}",
            config.build.source_dir.display()
        )
    })?;

    let builder = Arc::new(Builder::new(config));

    tracing::info!("Running initial build...");
    let initial = Arc::clone(&builder);
    let report = tokio::task::spawn_blocking(move || initial.build())
        .await?
        .wrap_err("Initial build failed")?;
    println!();
    println!(
        "  ✓ Built {} pages ({} failed) in {}ms",
        report.stats.pages, report.stats.failed, report.stats.duration_ms
    );
    print_failures(&report);

    let queue = RebuildQueue::new(builder);
    let mut finished = queue.subscribe();

    let (tx, mut rx) = mpsc::channel::<ChangeEvent>(EVENT_BUFFER);
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                let kind = change_kind(&event.kind);
                for path in event.paths {
                    // The receiver only goes away on shutdown.
                    let _ = tx.blocking_send(ChangeEvent::new(kind, path));
                }
            }
            Err(e) => tracing::warn!(error = %e, "watch error"),
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    watcher
        .watch(&source_root, RecursiveMode::Recursive)
        .wrap_err("Failed to watch source directory")?;

    println!();
    println!("  Watching {}", source_root.display());
    println!("  Press Ctrl+C to stop");
    println!();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                let Some(scope) = classify(&event, &rules, &source_root) else {
                    tracing::trace!(path = %event.path.display(), "change ignored");
                    continue;
                };
                tracing::debug!(path = %event.path.display(), %scope, "change detected");
                queue.trigger(scope);
            }
            Ok(done) = finished.recv() => {
                if done.ok {
                    println!("  ✓ Rebuilt {}", done.scope);
                } else {
                    eprintln!("  ✗ Rebuild of {} failed", done.scope);
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Stopping watch mode");
                break;
            }
        }
    }

    drop(watcher);
    Ok(())
}

fn change_kind(kind: &EventKind) -> ChangeKind {
    match kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Modify(ModifyKind::Name(RenameMode::Any | RenameMode::Both)) => {
            ChangeKind::Renamed
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Removed,
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Created,
        EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::Other,
        EventKind::Modify(_) => ChangeKind::Modified,
        EventKind::Remove(_) => ChangeKind::Removed,
        _ => ChangeKind::Other,
    }
}
