use crate::audio::AudioEngine;
use crate::filter::apply_filter;
use crate::library::Catalog;
use crate::model::{DirEntry, Focus, MoveDirection};
use crate::nav::{CursorStep, NavigationState};
use crate::queue::PlaybackQueue;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleFocus,
    Cursor(CursorStep),
    Activate,
    Descend,
    Parent,
    QueueFolder,
    Append,
    TogglePause,
    NextTrack,
    PrevTrack,
    RemoveFromQueue,
    MoveInQueue(MoveDirection),
    BeginSearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,
    SearchAccept,
    SearchCancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct TuneCore {
    catalog: Catalog,
    pub cwd: PathBuf,
    all_entries: Vec<DirEntry>,
    pub browser_entries: Vec<DirEntry>,
    pub queue: PlaybackQueue,
    pub nav: NavigationState,
    pub status: String,
}

impl TuneCore {
    pub fn new(root: PathBuf, catalog: Catalog, engine: Box<dyn AudioEngine>) -> Self {
        let mut core = Self {
            catalog,
            cwd: root.clone(),
            all_entries: Vec::new(),
            browser_entries: Vec::new(),
            queue: PlaybackQueue::new(engine),
            nav: NavigationState::default(),
            status: String::from("Ready"),
        };
        core.open_dir(root);
        core
    }

    pub fn selected_entry(&self) -> Option<&DirEntry> {
        self.browser_entries.get(self.nav.browser.cursor)
    }

    pub fn set_viewport(&mut self, rows: usize) {
        self.nav
            .set_viewport(rows, self.browser_entries.len(), self.queue.len());
    }

    /// Advances the queue when the engine reports the end of a track.
    pub fn poll_engine(&mut self) -> bool {
        if self.queue.is_empty() || !self.queue.engine().has_ended() {
            return false;
        }
        debug!("track ended, advancing");
        self.queue.next();
        self.after_action();
        true
    }

    pub fn shutdown(&mut self) {
        info!("stopping playback");
        self.queue.stop();
    }

    pub fn dispatch(&mut self, action: Action) -> Flow {
        self.status.clear();

        match action {
            Action::Quit => return Flow::Quit,
            Action::ToggleFocus => {
                self.nav.toggle_focus();
            }
            Action::Cursor(step) => {
                let total = self.focused_rows();
                self.nav.move_cursor(step, total);
            }
            Action::Activate => self.activate(),
            Action::Descend => {
                if let Some(DirEntry::Directory { path, .. }) = self.selected_entry().cloned()
                    && self.nav.can_browse()
                {
                    self.open_dir(path);
                }
            }
            Action::Parent => self.go_parent(),
            Action::QueueFolder => self.queue_folder(),
            Action::Append => self.append_selected(),
            Action::TogglePause => self.queue.toggle_pause(),
            Action::NextTrack => self.queue.next(),
            Action::PrevTrack => self.queue.prev(),
            Action::RemoveFromQueue => {
                if self.nav.focus() == Focus::Queue {
                    self.queue.remove(self.nav.queue.cursor);
                }
            }
            Action::MoveInQueue(direction) => self.move_in_queue(direction),
            Action::BeginSearch => {
                if self.nav.begin_search() {
                    self.refilter();
                    self.set_status("Search: type to filter, Enter keeps, Esc restores");
                }
            }
            Action::SearchInput(ch) => {
                if self.nav.search_input(ch) {
                    self.refilter();
                }
            }
            Action::SearchBackspace => {
                if self.nav.search_backspace() {
                    self.refilter();
                }
            }
            Action::SearchClear => {
                if self.nav.search_clear() {
                    self.refilter();
                }
            }
            Action::SearchAccept => {
                self.nav.search_accept();
            }
            Action::SearchCancel => {
                if self.nav.search_cancel() {
                    self.refilter();
                }
            }
        }

        self.after_action();
        Flow::Continue
    }

    fn focused_rows(&self) -> usize {
        match self.nav.focus() {
            Focus::Browser => self.browser_entries.len(),
            Focus::Queue => self.queue.len(),
        }
    }

    fn activate(&mut self) {
        match self.nav.focus() {
            Focus::Queue => {
                let cursor = self.nav.queue.cursor;
                self.queue.play_index(cursor);
                if let Some(track) = self.queue.current() {
                    let message = format!("Playing {}", track.name);
                    self.set_status(&message);
                }
            }
            Focus::Browser => {
                if !self.nav.can_browse() {
                    return;
                }
                match self.selected_entry().cloned() {
                    Some(DirEntry::Directory { path, .. }) => self.open_dir(path),
                    Some(DirEntry::Track(track)) => self.play_from_cwd(&track.path),
                    None => {}
                }
            }
        }
    }

    fn queue_folder(&mut self) {
        if !self.nav.can_browse() {
            return;
        }
        match self.selected_entry().cloned() {
            Some(DirEntry::Directory { path, name }) => {
                let tracks = self.catalog.collect_tracks(&path);
                if tracks.is_empty() {
                    self.set_status(&format!("No tracks found in {name}/"));
                    return;
                }
                let count = tracks.len();
                self.queue.set_queue(tracks);
                self.set_status(&format!("Queued {count} tracks from {name}/"));
            }
            Some(DirEntry::Track(track)) => self.play_from_cwd(&track.path),
            None => {}
        }
    }

    fn append_selected(&mut self) {
        if !self.nav.can_browse() {
            return;
        }
        let tracks = match self.selected_entry().cloned() {
            Some(DirEntry::Directory { path, name }) => {
                let tracks = self.catalog.collect_tracks(&path);
                if tracks.is_empty() {
                    self.set_status(&format!("No tracks found in {name}/"));
                    return;
                }
                tracks
            }
            Some(DirEntry::Track(track)) => vec![track],
            None => return,
        };
        let count = tracks.len();
        self.queue.append(tracks);
        self.set_status(&format!("Added {count} tracks to queue"));
    }

    fn move_in_queue(&mut self, direction: MoveDirection) {
        if self.nav.focus() != Focus::Queue {
            return;
        }
        let cursor = self.nav.queue.cursor;
        let Some(target) = direction.apply(cursor).filter(|idx| *idx < self.queue.len()) else {
            return;
        };
        self.queue.move_item(cursor, direction);
        let viewport = self.nav.viewport();
        self.nav.queue.jump(target, self.queue.len(), viewport);
    }

    /// Replaces the queue with every track under the current folder and
    /// starts at `path`.
    fn play_from_cwd(&mut self, path: &Path) {
        let tracks = self.catalog.collect_tracks(&self.cwd);
        let start = tracks
            .iter()
            .position(|track| track.path == path)
            .unwrap_or(0);
        self.queue.set_queue_from(tracks, start);
        if let Some(track) = self.queue.current() {
            let message = format!("Playing {}", track.name);
            self.set_status(&message);
        }
    }

    fn go_parent(&mut self) {
        if !self.nav.can_browse() {
            return;
        }
        let Some(parent) = self.cwd.parent().map(Path::to_path_buf) else {
            return;
        };
        if parent != self.cwd {
            self.open_dir(parent);
        }
    }

    fn open_dir(&mut self, dir: PathBuf) {
        debug!(dir = %dir.display(), "opening directory");
        self.all_entries = self.catalog.list_children(&dir);
        self.cwd = dir;
        self.nav.clear_filter();
        self.refilter();
    }

    fn refilter(&mut self) {
        self.browser_entries = apply_filter(&self.all_entries, self.nav.filter_text());
        let viewport = self.nav.viewport();
        self.nav
            .browser
            .clamp(self.browser_entries.len(), viewport);
    }

    fn after_action(&mut self) {
        if let Some(err) = self.queue.take_error() {
            self.set_status(&format!("playback error: {err}"));
        }
        self.nav
            .sync_queue_cursor(self.queue.current_index(), self.queue.len());
    }

    fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
    }
}
