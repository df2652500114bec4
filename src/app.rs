use crate::audio::{AudioEngine, NullAudioEngine, RodioAudioEngine};
use crate::config::{self, Settings};
use crate::core::{Action, Flow, TuneCore};
use crate::library::Catalog;
use crate::model::MoveDirection;
use crate::nav::CursorStep;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use std::io::{Stdout, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Everything the loop needs from the terminal.
pub trait Screen {
    /// Rows available inside each pane right now.
    fn list_height(&mut self) -> Result<usize>;
    fn render(&mut self, core: &TuneCore) -> Result<()>;
    /// Next key press, or `None` when no input arrived within the poll window.
    fn next_key(&mut self) -> Result<Option<KeyEvent>>;
}

pub struct CrosstermScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    poll: Duration,
}

impl CrosstermScreen {
    pub fn new(poll: Duration) -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let terminal = match Self::enter() {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = disable_raw_mode();
                return Err(err);
            }
        };
        Ok(Self { terminal, poll })
    }

    fn enter() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        let mut out = stdout();
        execute!(out, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let mut terminal =
            Terminal::new(CrosstermBackend::new(out)).context("failed to start terminal")?;
        terminal.clear()?;
        Ok(terminal)
    }
}

impl Screen for CrosstermScreen {
    fn list_height(&mut self) -> Result<usize> {
        let size = self.terminal.size()?;
        Ok(crate::ui::list_height(Rect::new(0, 0, size.width, size.height)))
    }

    fn render(&mut self, core: &TuneCore) -> Result<()> {
        self.terminal.draw(|frame| crate::ui::draw(frame, core))?;
        Ok(())
    }

    fn next_key(&mut self) -> Result<Option<KeyEvent>> {
        if !event::poll(self.poll)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
            _ => Ok(None),
        }
    }
}

impl Drop for CrosstermScreen {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub root: Option<PathBuf>,
    pub null_audio: bool,
    pub settings: Settings,
}

pub fn run(options: RunOptions) -> Result<()> {
    let RunOptions {
        root,
        null_audio,
        settings,
    } = options;

    let root = config::resolve_root(root.as_deref(), &settings);
    let catalog = Catalog::new(&settings.extensions);
    let engine = open_engine(null_audio);
    info!(
        root = %root.display(),
        output = %engine.output_name(),
        extensions = ?catalog.extensions(),
        "starting"
    );

    let mut core = TuneCore::new(root, catalog, engine);
    let result = CrosstermScreen::new(settings.input_poll())
        .and_then(|mut screen| run_loop(&mut core, &mut screen, settings.redraw_interval()));
    core.shutdown();
    result
}

fn open_engine(null_audio: bool) -> Box<dyn AudioEngine> {
    if null_audio {
        return Box::new(NullAudioEngine::new());
    }
    match RodioAudioEngine::new() {
        Ok(engine) => Box::new(engine),
        Err(err) => {
            warn!("audio output unavailable, continuing silently: {err:#}");
            Box::new(NullAudioEngine::new())
        }
    }
}

/// Polls the engine, redraws at most once per `redraw_interval` whatever the
/// input rate, and feeds key presses to the core until it asks to quit.
pub fn run_loop<S: Screen>(
    core: &mut TuneCore,
    screen: &mut S,
    redraw_interval: Duration,
) -> Result<()> {
    let mut last_draw: Option<Instant> = None;

    loop {
        core.poll_engine();

        if last_draw.is_none_or(|at| at.elapsed() >= redraw_interval) {
            let rows = screen.list_height()?;
            core.set_viewport(rows);
            screen.render(core)?;
            last_draw = Some(Instant::now());
        }

        let Some(key) = screen.next_key()? else {
            continue;
        };
        let Some(action) = action_for_key(key, core.nav.is_searching()) else {
            continue;
        };
        if core.dispatch(action) == Flow::Quit {
            info!("quit requested");
            return Ok(());
        }
    }
}

pub fn action_for_key(key: KeyEvent, searching: bool) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    if let Some(step) = cursor_step(key.code) {
        return Some(Action::Cursor(step));
    }

    if searching {
        return match key.code {
            KeyCode::Char('u') if ctrl => Some(Action::SearchClear),
            KeyCode::Char(ch) if !ctrl => Some(Action::SearchInput(ch)),
            KeyCode::Backspace => Some(Action::SearchBackspace),
            KeyCode::Enter => Some(Action::SearchAccept),
            KeyCode::Esc => Some(Action::SearchCancel),
            _ => None,
        };
    }

    if ctrl {
        return None;
    }
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Tab => Action::ToggleFocus,
        KeyCode::Char('k') => Action::Cursor(CursorStep::Up),
        KeyCode::Char('j') => Action::Cursor(CursorStep::Down),
        KeyCode::Enter => Action::Activate,
        KeyCode::Right | KeyCode::Char('l') => Action::Descend,
        KeyCode::Left | KeyCode::Backspace | KeyCode::Char('b') | KeyCode::Char('h') => {
            Action::Parent
        }
        KeyCode::Char('s') => Action::QueueFolder,
        KeyCode::Char('a') => Action::Append,
        KeyCode::Char(' ') => Action::TogglePause,
        KeyCode::Char('n') => Action::NextTrack,
        KeyCode::Char('p') => Action::PrevTrack,
        KeyCode::Char('d') | KeyCode::Delete => Action::RemoveFromQueue,
        KeyCode::Char('K') => Action::MoveInQueue(MoveDirection::Up),
        KeyCode::Char('J') => Action::MoveInQueue(MoveDirection::Down),
        KeyCode::Char('/') => Action::BeginSearch,
        _ => return None,
    };
    Some(action)
}

fn cursor_step(code: KeyCode) -> Option<CursorStep> {
    match code {
        KeyCode::Up => Some(CursorStep::Up),
        KeyCode::Down => Some(CursorStep::Down),
        KeyCode::PageUp => Some(CursorStep::PageUp),
        KeyCode::PageDown => Some(CursorStep::PageDown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::fake::{Call, FakeEngine};
    use anyhow::bail;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    /// Replays keys, interleaving an idle poll after each one, and records
    /// what the status line showed on every frame.
    struct ScriptedScreen {
        keys: VecDeque<Option<KeyEvent>>,
        rows: usize,
        frames: Vec<String>,
    }

    impl ScriptedScreen {
        fn new(rows: usize, keys: impl IntoIterator<Item = KeyEvent>) -> Self {
            Self {
                keys: keys.into_iter().flat_map(|key| [Some(key), None]).collect(),
                rows,
                frames: Vec::new(),
            }
        }
    }

    impl Screen for ScriptedScreen {
        fn list_height(&mut self) -> Result<usize> {
            Ok(self.rows)
        }

        fn render(&mut self, core: &TuneCore) -> Result<()> {
            self.frames.push(core.status.clone());
            Ok(())
        }

        fn next_key(&mut self) -> Result<Option<KeyEvent>> {
            match self.keys.pop_front() {
                Some(next) => Ok(next),
                None => bail!("script exhausted without quitting"),
            }
        }
    }

    fn library(root: &Path) {
        fs::create_dir_all(root.join("Rock")).expect("dir");
        for name in ["a.mp3", "b.mp3", "c.mp3"] {
            fs::write(root.join("Rock").join(name), b"").expect("track");
        }
    }

    #[test]
    fn normal_mode_bindings() {
        assert_eq!(action_for_key(key(KeyCode::Char('q')), false), Some(Action::Quit));
        assert_eq!(action_for_key(key(KeyCode::Esc), false), Some(Action::Quit));
        assert_eq!(action_for_key(ctrl('c'), false), Some(Action::Quit));
        assert_eq!(
            action_for_key(key(KeyCode::Char('j')), false),
            Some(Action::Cursor(CursorStep::Down))
        );
        assert_eq!(
            action_for_key(key(KeyCode::PageUp), false),
            Some(Action::Cursor(CursorStep::PageUp))
        );
        assert_eq!(action_for_key(key(KeyCode::Char('h')), false), Some(Action::Parent));
        assert_eq!(
            action_for_key(KeyEvent::new(KeyCode::Char('J'), KeyModifiers::SHIFT), false),
            Some(Action::MoveInQueue(MoveDirection::Down))
        );
        assert_eq!(action_for_key(key(KeyCode::Delete), false), Some(Action::RemoveFromQueue));
        assert_eq!(action_for_key(key(KeyCode::Char('x')), false), None);
        assert_eq!(action_for_key(ctrl('u'), false), None);
    }

    #[test]
    fn search_mode_bindings() {
        assert_eq!(
            action_for_key(key(KeyCode::Char('q')), true),
            Some(Action::SearchInput('q'))
        );
        assert_eq!(
            action_for_key(key(KeyCode::Char(' ')), true),
            Some(Action::SearchInput(' '))
        );
        assert_eq!(action_for_key(ctrl('u'), true), Some(Action::SearchClear));
        assert_eq!(action_for_key(ctrl('c'), true), Some(Action::Quit));
        assert_eq!(action_for_key(key(KeyCode::Esc), true), Some(Action::SearchCancel));
        assert_eq!(action_for_key(key(KeyCode::Enter), true), Some(Action::SearchAccept));
        assert_eq!(action_for_key(key(KeyCode::Backspace), true), Some(Action::SearchBackspace));
        assert_eq!(action_for_key(key(KeyCode::Tab), true), None);
        assert_eq!(
            action_for_key(key(KeyCode::Down), true),
            Some(Action::Cursor(CursorStep::Down))
        );
    }

    #[test]
    fn loop_plays_folder_and_quits() {
        let dir = tempdir().expect("tempdir");
        library(dir.path());
        let engine = FakeEngine::default();
        let mut core = TuneCore::new(
            dir.path().to_path_buf(),
            Catalog::default(),
            Box::new(engine.clone()),
        );
        let mut screen = ScriptedScreen::new(
            8,
            [
                key(KeyCode::Char('s')),
                key(KeyCode::Char('n')),
                key(KeyCode::Char('q')),
            ],
        );

        run_loop(&mut core, &mut screen, Duration::ZERO).expect("loop");

        assert_eq!(core.queue.current_index(), Some(1));
        assert_eq!(
            engine.played(),
            vec![
                dir.path().join("Rock").join("a.mp3"),
                dir.path().join("Rock").join("b.mp3"),
            ]
        );
        assert_eq!(core.nav.viewport(), 8);
        assert!(screen.frames.contains(&String::from("Queued 3 tracks from Rock/")));
    }

    #[test]
    fn redraws_wait_for_the_interval_regardless_of_input() {
        let dir = tempdir().expect("tempdir");
        library(dir.path());
        let mut core = TuneCore::new(
            dir.path().join("Rock"),
            Catalog::default(),
            Box::new(FakeEngine::default()),
        );
        let keys = std::iter::repeat_n(key(KeyCode::Down), 20).chain([key(KeyCode::Char('q'))]);
        let mut screen = ScriptedScreen::new(8, keys);

        run_loop(&mut core, &mut screen, Duration::from_secs(60)).expect("loop");

        assert_eq!(screen.frames.len(), 1);
        assert_eq!(core.nav.browser.cursor, 2);
    }

    #[test]
    fn loop_advances_when_track_ends() {
        let dir = tempdir().expect("tempdir");
        library(dir.path());
        let engine = FakeEngine::default();
        let mut core = TuneCore::new(
            dir.path().join("Rock"),
            Catalog::default(),
            Box::new(engine.clone()),
        );
        core.set_viewport(8);
        core.dispatch(Action::Activate);
        assert_eq!(core.queue.current_index(), Some(0));
        engine.finish_track();
        let mut screen = ScriptedScreen::new(8, [key(KeyCode::Char('q'))]);

        run_loop(&mut core, &mut screen, Duration::ZERO).expect("loop");

        assert_eq!(core.queue.current_index(), Some(1));
        core.shutdown();
        assert_eq!(engine.last_call(), Some(Call::Stop));
    }

    #[test]
    fn loop_surfaces_screen_errors() {
        let dir = tempdir().expect("tempdir");
        let mut core = TuneCore::new(
            dir.path().to_path_buf(),
            Catalog::default(),
            Box::new(FakeEngine::default()),
        );
        let mut screen = ScriptedScreen::new(8, Vec::new());
        assert!(run_loop(&mut core, &mut screen, Duration::ZERO).is_err());
    }
}
