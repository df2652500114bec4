use crate::audio::AudioEngine;
use crate::model::{MoveDirection, TrackRef};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ordered tracks with a single current position. The queue is the only
/// component that commands the engine.
///
/// `current` is `None` exactly when `tracks` is empty.
pub struct PlaybackQueue {
    tracks: Vec<TrackRef>,
    current: Option<usize>,
    paused: bool,
    engine: Box<dyn AudioEngine>,
    last_error: Option<String>,
}

impl PlaybackQueue {
    pub fn new(engine: Box<dyn AudioEngine>) -> Self {
        Self {
            tracks: Vec::new(),
            current: None,
            paused: false,
            engine,
            last_error: None,
        }
    }

    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&TrackRef> {
        self.current.and_then(|idx| self.tracks.get(idx))
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Read-only view of the engine for status polling.
    pub fn engine(&self) -> &dyn AudioEngine {
        self.engine.as_ref()
    }

    /// Most recent playback failure, cleared on read.
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    pub fn set_queue(&mut self, tracks: Vec<TrackRef>) {
        self.set_queue_from(tracks, 0);
    }

    /// Replaces the queue and starts playback at `start` (clamped).
    pub fn set_queue_from(&mut self, tracks: Vec<TrackRef>, start: usize) {
        info!(count = tracks.len(), start, "queue replaced");
        self.tracks = tracks;
        if self.tracks.is_empty() {
            self.current = None;
            self.halt();
            return;
        }
        self.current = Some(start.min(self.tracks.len() - 1));
        self.play_current();
    }

    pub fn append(&mut self, tracks: Vec<TrackRef>) {
        if tracks.is_empty() {
            return;
        }
        let was_empty = self.tracks.is_empty();
        debug!(count = tracks.len(), "appending to queue");
        self.tracks.extend(tracks);
        if was_empty {
            self.current = Some(0);
            self.play_current();
        }
    }

    pub fn play_index(&mut self, index: usize) {
        if self.tracks.is_empty() {
            return;
        }
        self.current = Some(index.min(self.tracks.len() - 1));
        self.play_current();
    }

    pub fn next(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        self.current = Some((current + 1) % self.tracks.len());
        self.play_current();
    }

    pub fn prev(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        let len = self.tracks.len();
        self.current = Some((current + len - 1) % len);
        self.play_current();
    }

    pub fn remove(&mut self, index: usize) {
        if index >= self.tracks.len() {
            return;
        }
        let removed = self.tracks.remove(index);
        debug!(index, track = %removed.name, "removed from queue");

        if self.tracks.is_empty() {
            self.current = None;
            self.halt();
            return;
        }

        let Some(current) = self.current else {
            return;
        };
        if index == current {
            self.current = Some(index.min(self.tracks.len() - 1));
            self.play_current();
        } else if index < current {
            self.current = Some(current - 1);
        }
    }

    /// Swaps `index` with its neighbour. The current position follows the
    /// track, not the slot.
    pub fn move_item(&mut self, index: usize, direction: MoveDirection) {
        let Some(target) = direction.apply(index) else {
            return;
        };
        if index >= self.tracks.len() || target >= self.tracks.len() {
            return;
        }
        self.tracks.swap(index, target);
        if self.current == Some(index) {
            self.current = Some(target);
        } else if self.current == Some(target) {
            self.current = Some(index);
        }
    }

    /// `(elapsed, total)` from the engine, or zeros when either is unknown.
    pub fn progress(&self) -> (Duration, Duration) {
        match (
            u64::try_from(self.engine.elapsed_ms()),
            u64::try_from(self.engine.length_ms()),
        ) {
            (Ok(elapsed), Ok(total)) => (Duration::from_millis(elapsed), Duration::from_millis(total)),
            _ => (Duration::ZERO, Duration::ZERO),
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.engine.is_playing() {
            self.engine.pause();
            self.paused = true;
        } else if self.paused {
            self.engine.resume();
            self.paused = false;
        } else {
            self.play_current();
        }
    }

    /// Stops the engine without touching the queue contents.
    pub fn stop(&mut self) {
        self.halt();
    }

    fn play_current(&mut self) {
        self.paused = false;
        let Some(track) = self.current() else {
            return;
        };
        let path = track.path.clone();
        match self.engine.load_and_play(&path) {
            Ok(()) => debug!(path = %path.display(), "playing"),
            Err(err) => {
                warn!(path = %path.display(), "playback failed: {err:#}");
                self.last_error = Some(format!("{err:#}"));
            }
        }
    }

    fn halt(&mut self) {
        self.engine.stop();
        self.paused = false;
    }
}
