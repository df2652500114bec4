use crate::model::Focus;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStep {
    Up,
    Down,
    PageUp,
    PageDown,
}

/// Cursor and first visible row of one pane.
///
/// When the rows overflow the viewport, `scroll_top <= cursor < scroll_top + viewport`;
/// otherwise `scroll_top == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaneCursor {
    pub cursor: usize,
    pub scroll_top: usize,
}

impl PaneCursor {
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.scroll_top = 0;
    }

    pub fn step(&mut self, step: CursorStep, total: usize, viewport: usize) {
        let page = viewport.max(1);
        let target = match step {
            CursorStep::Up => self.cursor.saturating_sub(1),
            CursorStep::Down => self.cursor.saturating_add(1),
            CursorStep::PageUp => self.cursor.saturating_sub(page),
            CursorStep::PageDown => self.cursor.saturating_add(page),
        };
        self.jump(target, total, viewport);
    }

    pub fn jump(&mut self, row: usize, total: usize, viewport: usize) {
        self.cursor = row;
        self.clamp(total, viewport);
    }

    /// Pulls the cursor back into `[0, total - 1]` and re-derives the scroll.
    pub fn clamp(&mut self, total: usize, viewport: usize) {
        self.cursor = self.cursor.min(total.saturating_sub(1));
        self.follow(total, viewport);
    }

    fn follow(&mut self, total: usize, viewport: usize) {
        if viewport == 0 || total <= viewport {
            self.scroll_top = 0;
            return;
        }
        if self.cursor < self.scroll_top {
            self.scroll_top = self.cursor;
        } else if self.cursor >= self.scroll_top + viewport {
            self.scroll_top = self.cursor + 1 - viewport;
        }
        self.scroll_top = self.scroll_top.min(total - viewport);
    }

    /// Range of rows currently on screen.
    pub fn visible(&self, total: usize, viewport: usize) -> std::ops::Range<usize> {
        let start = self.scroll_top.min(total);
        start..(start + viewport).min(total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchSession {
    buffer: String,
    saved_filter: String,
}

/// Focus, per-pane cursors and the browser search sub-state.
///
/// Methods that change the filter text return `true` so the owner can
/// re-filter the browser entries; the browser cursor is already reset by then.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    pub browser: PaneCursor,
    pub queue: PaneCursor,
    focus: Focus,
    search: Option<SearchSession>,
    filter: String,
    viewport: usize,
}

impl NavigationState {
    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    pub fn search_buffer(&self) -> Option<&str> {
        self.search.as_ref().map(|search| search.buffer.as_str())
    }

    pub fn filter_text(&self) -> &str {
        &self.filter
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    /// Directory changes are only allowed from the browser outside search.
    pub fn can_browse(&self) -> bool {
        self.focus == Focus::Browser && !self.is_searching()
    }

    pub fn set_viewport(&mut self, rows: usize, browser_total: usize, queue_total: usize) {
        self.viewport = rows;
        self.browser.clamp(browser_total, rows);
        self.queue.clamp(queue_total, rows);
    }

    pub fn toggle_focus(&mut self) -> bool {
        if self.is_searching() {
            return false;
        }
        self.focus = self.focus.toggled();
        debug!(focus = self.focus.label(), "focus switched");
        true
    }

    /// Moves the cursor of the focused pane; `total` is that pane's row count.
    pub fn move_cursor(&mut self, step: CursorStep, total: usize) {
        let viewport = self.viewport;
        match self.focus {
            Focus::Browser => self.browser.step(step, total, viewport),
            Focus::Queue => self.queue.step(step, total, viewport),
        }
    }

    /// Keeps the queue cursor on the playing track while the queue pane is
    /// not focused.
    pub fn sync_queue_cursor(&mut self, current: Option<usize>, queue_total: usize) {
        let viewport = self.viewport;
        match (self.focus, current) {
            (Focus::Queue, _) | (_, None) => self.queue.clamp(queue_total, viewport),
            (_, Some(idx)) => self.queue.jump(idx, queue_total, viewport),
        }
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.browser.reset();
    }

    pub fn begin_search(&mut self) -> bool {
        if !self.can_browse() {
            return false;
        }
        let saved_filter = std::mem::take(&mut self.filter);
        self.search = Some(SearchSession {
            buffer: String::new(),
            saved_filter,
        });
        self.browser.reset();
        debug!("search started");
        true
    }

    pub fn search_input(&mut self, ch: char) -> bool {
        self.edit_search(|buffer| buffer.push(ch))
    }

    pub fn search_backspace(&mut self) -> bool {
        self.edit_search(|buffer| {
            buffer.pop();
        })
    }

    pub fn search_clear(&mut self) -> bool {
        self.edit_search(String::clear)
    }

    /// Leaves search keeping whatever filter is active. The entries are
    /// already filtered, so this never asks for a re-filter.
    pub fn search_accept(&mut self) -> bool {
        if self.search.take().is_some() {
            debug!(filter = %self.filter, "search accepted");
        }
        false
    }

    pub fn search_cancel(&mut self) -> bool {
        let Some(search) = self.search.take() else {
            return false;
        };
        self.filter = search.saved_filter;
        self.browser.reset();
        debug!(filter = %self.filter, "search cancelled");
        true
    }

    fn edit_search(&mut self, edit: impl FnOnce(&mut String)) -> bool {
        let Some(search) = self.search.as_mut() else {
            return false;
        };
        edit(&mut search.buffer);
        self.filter.clone_from(&search.buffer);
        self.browser.reset();
        true
    }
}
