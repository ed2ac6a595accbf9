//! File system watcher driving incremental re-discovery.
//!
//! `notify` delivers events on its own thread; they are forwarded into a
//! tokio channel, bursts are collapsed by a quiet-period debounce, and the
//! registry is refreshed once per burst.

use std::path::PathBuf;
use std::sync::Weak;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::DiscoveryError;
use super::registry::{RegistryInner, ToolRegistry};
use super::scanner::MatchRules;

/// A running watcher. Dropping it cancels the debounce task and releases
/// the OS watch handles.
pub(super) struct WatchHandle {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(super) fn spawn(
    registry: Weak<RegistryInner>,
    source_dirs: &[PathBuf],
    rules: MatchRules,
    debounce: Duration,
) -> Result<WatchHandle, DiscoveryError> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| DiscoveryError::NoRuntime)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            // The receiver is gone once the handle is dropped.
            let _ = tx.send(event);
        }
        Err(e) => warn!("File watcher error: {}", e),
    })?;

    for dir in source_dirs {
        if !dir.is_dir() {
            debug!("Not watching missing directory {:?}", dir);
            continue;
        }
        if let Err(e) = watcher.watch(dir, RecursiveMode::Recursive) {
            warn!("Failed to watch {:?}: {}", dir, e);
        }
    }

    let task = runtime.spawn(debounce_loop(rx, registry, rules, debounce));

    Ok(WatchHandle {
        _watcher: watcher,
        task,
    })
}

async fn debounce_loop(
    mut rx: mpsc::UnboundedReceiver<Event>,
    registry: Weak<RegistryInner>,
    rules: MatchRules,
    debounce: Duration,
) {
    while let Some(event) = rx.recv().await {
        if !is_relevant(&event, &rules) {
            continue;
        }
        debug!("Change detected: {:?} {:?}", event.kind, event.paths);

        // Wait for a quiet period before rescanning.
        loop {
            match tokio::time::timeout(debounce, rx.recv()).await {
                Ok(Some(_)) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        let Some(inner) = registry.upgrade() else {
            return;
        };
        let stats = ToolRegistry::from_inner(inner).refresh().await;
        info!(
            "Hot reload: {} tools across {} modules",
            stats.total_tools, stats.total_modules
        );
    }
}

fn is_relevant(event: &Event, rules: &MatchRules) -> bool {
    match event.kind {
        EventKind::Access(_) => false,
        // A removed directory may have held modules.
        EventKind::Remove(_) => true,
        _ => event.paths.iter().any(|p| rules.matches(p) || p.is_dir()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    fn rules() -> MatchRules {
        MatchRules::new(["^mcp-.*\\.ts$"], ["\\.test\\.ts$"]).unwrap()
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_relevance_filter() {
        let rules = rules();
        assert!(is_relevant(
            &event(EventKind::Create(CreateKind::File), "/src/mcp-a.ts"),
            &rules
        ));
        assert!(is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/src/mcp-a.ts"),
            &rules
        ));
        assert!(is_relevant(
            &event(EventKind::Remove(RemoveKind::Any), "/src/whatever"),
            &rules
        ));
        assert!(!is_relevant(
            &event(EventKind::Access(AccessKind::Any), "/src/mcp-a.ts"),
            &rules
        ));
        assert!(!is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/src/mcp-a.test.ts"),
            &rules
        ));
        assert!(!is_relevant(
            &event(EventKind::Create(CreateKind::File), "/src/readme.md"),
            &rules
        ));
    }

    #[test]
    fn test_spawn_without_runtime_fails() {
        let result = spawn(Weak::new(), &[], rules(), Duration::from_millis(10));
        assert!(matches!(result, Err(DiscoveryError::NoRuntime)));
    }
}
