//! Attack ingestion adapters (spec §4.1 [INGESTION ADAPTER]): a directory
//! watcher for closed CSV files and a message-bus consumer, run on
//! independent threads sharing only the read-only plug-in registry
//! (spec §5 "Scheduling model").

pub mod file;
pub mod message;

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::error::{Result, ShieldError};

/// Watches `directory` for newly-closed files, calling `on_attack_path` for
/// each one (spec §4.1 "File adapter": "watches a directory for newly-closed
/// files"). Runs until `on_attack_path` or the channel itself signals to
/// stop by returning `false`.
pub fn watch_directory(directory: &Path, mut on_attack_path: impl FnMut(&Path) -> bool) -> Result<()> {
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();

    let mut watcher: RecommendedWatcher =
        notify::recommended_watcher(move |event| {
            let _ = tx.send(event);
        })
        .map_err(ShieldError::from)?;

    watcher
        .watch(directory, RecursiveMode::Recursive)
        .map_err(ShieldError::from)?;

    for event in rx {
        let event = event.map_err(ShieldError::from)?;
        if !matches!(event.kind, EventKind::Create(_)) {
            continue;
        }
        for path in &event.paths {
            if !is_regular_file(path) {
                continue;
            }
            debug!(path = %path.display(), "new attack file");
            if !on_attack_path(path) {
                return Ok(());
            }
        }
    }

    Ok(())
}

fn is_regular_file(path: &Path) -> bool {
    path.is_file()
}

/// Scans `directory` once for already-present files, used to pick up
/// attacks dropped before the watcher started (e.g. a `once` CLI run).
pub fn scan_directory(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();
        if is_regular_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Debounce window a caller may wait after a create event before reading a
/// file, to let a slow writer finish (spec §4.1: "newly-*closed* files").
/// No events are consulted here; this is a plain sleep, matching the
/// bounded, synchronous nature of the per-attack pipeline (spec §5).
pub fn settle_delay() -> Duration {
    Duration::from_millis(50)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_directory_lists_regular_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let paths = scan_directory(dir.path()).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("a.csv"));
    }
}
