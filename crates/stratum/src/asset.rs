//! # Atlas Hot-Reload
//!
//! [`AtlasWatcher`] watches the JSON and texture files behind loaded atlases
//! and reloads an atlas through the [`ResourceRegistry`] when either changes.
//! Sprite names are looked up every frame, so the new frames show up on the
//! next render without touching any visual.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  AtlasWatcher                                          │
//! │                                                        │
//! │  watcher ──► background thread (notify crate)          │
//! │              sends events over an mpsc channel         │
//! │                                                        │
//! │  watched ── canonical path → atlas name                │
//! │  pending ── atlas name → time of last event            │
//! └────────────────────────────────────────────────────────┘
//!
//! Between frames: watcher.process_reloads(&mut registry, &mut backend)
//!   1. Poll: drain the channel into `pending`
//!   2. Debounce: act on atlases quiet for at least 100ms
//!   3. Reload: registry.reload_atlas(name)
//! ```
//!
//! Editors save atomically (write temp, rename), which fires several events
//! per save, and an atlas export touches two files. Both collapse into one
//! reload per atlas after 100ms of quiet.
//!
//! If the watcher can't start, loading still works; atlases just don't
//! hot-reload. Failures are logged, never panicked.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::atlas::{Atlas, ResourceRegistry};
use crate::render::Backend;

/// Quiet time required before a changed atlas is reloaded.
const DEBOUNCE_DURATION: Duration = Duration::from_millis(100);

/// Watches atlas files and reloads changed atlases.
pub struct AtlasWatcher {
    /// `None` if the platform watcher failed to start.
    watcher: Option<RecommendedWatcher>,
    rx: mpsc::Receiver<notify::Result<notify::Event>>,
    watched: HashMap<PathBuf, String>,
    pending: HashMap<String, Instant>,
    rx_disconnected: bool,
}

impl AtlasWatcher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        let watcher = notify::recommended_watcher(move |res| {
            // Receiver gone means the watcher is being dropped.
            let _ = tx.send(res);
        });

        let watcher = match watcher {
            Ok(w) => Some(w),
            Err(e) => {
                log::warn!("Failed to create file watcher: {e}. Atlas hot-reload disabled.");
                None
            }
        };

        Self {
            watcher,
            rx,
            watched: HashMap::new(),
            pending: HashMap::new(),
            rx_disconnected: false,
        }
    }

    /// True when file events are being received.
    pub fn is_active(&self) -> bool {
        self.watcher.is_some() && !self.rx_disconnected
    }

    /// Number of watched files.
    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Number of atlases waiting out the debounce window.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Watch the files an atlas was loaded from. Atlases built in code have
    /// none and are skipped.
    pub fn watch_atlas(&mut self, atlas: &Atlas) {
        for path in [atlas.json_path(), atlas.texture_path()].into_iter().flatten() {
            self.watch_path(path, atlas.name());
        }
    }

    /// Watch every file-backed atlas in the registry.
    pub fn watch_registry(&mut self, registry: &ResourceRegistry) {
        for atlas in registry.atlases() {
            self.watch_atlas(atlas);
        }
    }

    /// Stop watching an atlas's files and drop any pending reload for it.
    pub fn unwatch_atlas(&mut self, name: &str) {
        let paths: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|(_, atlas)| atlas.as_str() == name)
            .map(|(path, _)| path.clone())
            .collect();
        for path in paths {
            if let Some(watcher) = &mut self.watcher {
                if let Err(e) = watcher.unwatch(&path) {
                    log::debug!("Failed to unwatch '{}': {e}", path.display());
                }
            }
            self.watched.remove(&path);
        }
        self.pending.remove(name);
    }

    /// Poll for file changes and reload atlases that have settled. Returns
    /// the names of atlases reloaded successfully.
    pub fn process_reloads(&mut self, registry: &mut ResourceRegistry, backend: &mut dyn Backend) -> Vec<String> {
        self.poll();
        let mut reloaded = Vec::new();
        for name in self.drain_ready(Instant::now()) {
            match registry.reload_atlas(backend, &name) {
                Ok(()) => {
                    log::info!("Hot-reloaded atlas '{name}'");
                    reloaded.push(name);
                }
                Err(e) => log::warn!("Hot-reload failed for atlas '{name}': {e}"),
            }
        }
        reloaded
    }

    fn watch_path(&mut self, path: &Path, atlas: &str) {
        // Canonicalize so event paths match.
        let canonical = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Cannot watch '{}': {e}", path.display());
                return;
            }
        };

        if let Some(watcher) = &mut self.watcher {
            if let Err(e) = watcher.watch(&canonical, RecursiveMode::NonRecursive) {
                log::warn!("Failed to watch '{}': {e}", canonical.display());
                return;
            }
        }

        log::debug!("Watching '{}' for atlas '{atlas}'", canonical.display());
        self.watched.insert(canonical, atlas.to_owned());
    }

    /// Drain watcher events into the debounce buffer.
    fn poll(&mut self) {
        if self.rx_disconnected {
            return;
        }
        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    use notify::EventKind;
                    // Atomic saves show up as create.
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        let now = Instant::now();
                        for path in &event.paths {
                            self.mark_changed(path, now);
                        }
                    }
                }
                Ok(Err(e)) => log::warn!("File watcher error: {e}"),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::warn!("File watcher disconnected. Atlas hot-reload disabled.");
                    self.rx_disconnected = true;
                    break;
                }
            }
        }
    }

    /// Record a change to `path` at `at`. Unwatched paths are ignored.
    fn mark_changed(&mut self, path: &Path, at: Instant) {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(atlas) = self.watched.get(&canonical) {
            self.pending.insert(atlas.clone(), at);
        }
    }

    /// Atlases whose last event is at least one debounce window before `now`.
    fn drain_ready(&mut self, now: Instant) -> Vec<String> {
        let mut ready = Vec::new();
        self.pending.retain(|name, last| {
            if now.duration_since(*last) >= DEBOUNCE_DURATION {
                ready.push(name.clone());
                false
            } else {
                true
            }
        });
        ready.sort();
        ready
    }
}

impl Default for AtlasWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stratum-watch-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn debounce_collapses_bursts() {
        let dir = temp_dir("debounce");
        let json = dir.join("a.json");
        let png = dir.join("a.png");
        std::fs::write(&json, "{}").unwrap();
        std::fs::write(&png, "").unwrap();

        let mut watcher = AtlasWatcher::new();
        watcher.watch_path(&json, "a");
        watcher.watch_path(&png, "a");
        assert_eq!(watcher.watched_count(), 2);

        let t0 = Instant::now();
        watcher.mark_changed(&json, t0);
        watcher.mark_changed(&png, t0 + Duration::from_millis(50));
        assert_eq!(watcher.pending_count(), 1);

        // 100ms after the first event, but only 50ms after the last.
        assert!(watcher.drain_ready(t0 + Duration::from_millis(100)).is_empty());
        assert_eq!(watcher.drain_ready(t0 + Duration::from_millis(150)), ["a"]);
        assert_eq!(watcher.pending_count(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unwatched_paths_are_ignored() {
        let mut watcher = AtlasWatcher::new();
        watcher.mark_changed(Path::new("/definitely/not/watched.json"), Instant::now());
        assert_eq!(watcher.pending_count(), 0);
    }

    #[test]
    fn unwatch_drops_paths_and_pending() {
        let dir = temp_dir("unwatch");
        let json = dir.join("b.json");
        std::fs::write(&json, "{}").unwrap();

        let mut watcher = AtlasWatcher::new();
        watcher.watch_path(&json, "b");
        watcher.mark_changed(&json, Instant::now());
        watcher.unwatch_atlas("b");
        assert_eq!(watcher.watched_count(), 0);
        assert_eq!(watcher.pending_count(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_files_are_not_watched() {
        let mut watcher = AtlasWatcher::new();
        watcher.watch_path(Path::new("/no/such/atlas.json"), "ghost");
        assert_eq!(watcher.watched_count(), 0);
    }
}
