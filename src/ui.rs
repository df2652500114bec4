use crate::core::TuneCore;
use crate::model::{DirEntry, Focus};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::time::Duration;

const APP_TITLE: &str = "tunepane  ";
const HELP: &str = "Tab focus  Enter open/play  s queue folder  a append  Space pause  n/p next/prev  d remove  K/J move  / search  q quit";
const MIN_BAR_WIDTH: usize = 10;

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    border: Color,
    focus_border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    selected_bg: Color,
}

const PALETTE: Palette = Palette {
    bg: Color::Rgb(10, 15, 24),
    panel_bg: Color::Rgb(19, 29, 43),
    border: Color::Rgb(69, 121, 176),
    focus_border: Color::Rgb(100, 203, 184),
    text: Color::Rgb(214, 228, 248),
    muted: Color::Rgb(149, 173, 204),
    accent: Color::Rgb(100, 203, 184),
    alert: Color::Rgb(249, 174, 88),
    selected_bg: Color::Rgb(34, 55, 82),
};

struct Areas {
    header: Rect,
    browser: Rect,
    queue: Rect,
    now_playing: Rect,
    footer: Rect,
}

fn areas(area: Rect) -> Areas {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(vertical[1]);

    Areas {
        header: vertical[0],
        browser: body[0],
        queue: body[1],
        now_playing: vertical[2],
        footer: vertical[3],
    }
}

/// Rows available inside either pane for a terminal of this size.
pub fn list_height(area: Rect) -> usize {
    usize::from(areas(area).browser.height.saturating_sub(2))
}

pub fn draw(frame: &mut Frame, core: &TuneCore) {
    let colors = PALETTE;
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let layout = areas(frame.area());
    let viewport = core.nav.viewport();

    frame.render_widget(header(core, &colors), layout.header);
    draw_browser(frame, core, layout.browser, viewport, &colors);
    draw_queue(frame, core, layout.queue, viewport, &colors);

    let bar_width = usize::from(layout.now_playing.width.saturating_sub(2))
        .saturating_sub(30)
        .max(MIN_BAR_WIDTH);
    frame.render_widget(
        Paragraph::new(now_playing_line(core, bar_width, &colors)).block(panel_block(
            "Now Playing",
            colors.border,
            &colors,
        )),
        layout.now_playing,
    );

    let footer = Paragraph::new(vec![
        Line::from(Span::styled(
            core.status.as_str(),
            Style::default().fg(colors.alert),
        )),
        Line::from(Span::styled(HELP, Style::default().fg(colors.muted))),
    ])
    .block(panel_block("Message", colors.border, &colors));
    frame.render_widget(footer, layout.footer);
}

fn header<'a>(core: &'a TuneCore, colors: &Palette) -> Paragraph<'a> {
    let mut spans = vec![
        Span::styled(
            APP_TITLE,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(core.cwd.display().to_string(), Style::default().fg(colors.text)),
    ];

    if let Some(buffer) = core.nav.search_buffer() {
        spans.push(Span::styled("  |  ", Style::default().fg(colors.muted)));
        spans.push(Span::styled(
            format!("/{buffer}_"),
            Style::default()
                .fg(colors.alert)
                .add_modifier(Modifier::BOLD),
        ));
    } else if !core.nav.filter_text().is_empty() {
        spans.push(Span::styled("  |  ", Style::default().fg(colors.muted)));
        spans.push(Span::styled(
            format!("filter: {}", core.nav.filter_text()),
            Style::default().fg(colors.alert),
        ));
    }

    Paragraph::new(Line::from(spans)).block(panel_block("Folder", colors.border, colors))
}

fn draw_browser(
    frame: &mut Frame,
    core: &TuneCore,
    area: Rect,
    viewport: usize,
    colors: &Palette,
) {
    let pane = core.nav.browser;
    let total = core.browser_entries.len();
    let visible = pane.visible(total, viewport);
    let items: Vec<ListItem> = core.browser_entries[visible.clone()]
        .iter()
        .map(|entry| match entry {
            DirEntry::Directory { name, .. } => ListItem::new(Span::styled(
                format!("{name}/"),
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            DirEntry::Track(track) => {
                ListItem::new(Span::styled(track.name.as_str(), Style::default().fg(colors.text)))
            }
        })
        .collect();

    let title = format!("Browser ({total})");
    let focused = core.nav.focus() == Focus::Browser;
    let selected = pane.cursor.checked_sub(visible.start);
    render_pane(frame, items, selected, area, &title, focused, colors);
}

fn draw_queue(
    frame: &mut Frame,
    core: &TuneCore,
    area: Rect,
    viewport: usize,
    colors: &Palette,
) {
    let pane = core.nav.queue;
    let tracks = core.queue.tracks();
    let visible = pane.visible(tracks.len(), viewport);
    let current = core.queue.current_index();
    let items: Vec<ListItem> = tracks[visible.clone()]
        .iter()
        .zip(visible.clone())
        .map(|(track, idx)| {
            let playing = current == Some(idx);
            let marker = if playing { "> " } else { "  " };
            let style = if playing {
                Style::default().fg(colors.alert)
            } else {
                Style::default().fg(colors.text)
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(colors.muted)),
                Span::styled(format!("{:>3}. ", idx + 1), Style::default().fg(colors.muted)),
                Span::styled(track.name.as_str(), style),
            ]))
        })
        .collect();

    let title = format!("Queue ({})", tracks.len());
    let focused = core.nav.focus() == Focus::Queue;
    let selected = pane.cursor.checked_sub(visible.start);
    render_pane(frame, items, selected, area, &title, focused, colors);
}

fn render_pane(
    frame: &mut Frame,
    items: Vec<ListItem>,
    selected_row: Option<usize>,
    area: Rect,
    title: &str,
    focused: bool,
    colors: &Palette,
) {
    let border = if focused {
        colors.focus_border
    } else {
        colors.border
    };
    let mut state = ListState::default();
    if !items.is_empty() {
        state.select(selected_row);
    }

    let highlight = if focused {
        Style::default()
            .bg(colors.selected_bg)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(colors.panel_bg)
    };

    let list = List::new(items)
        .block(panel_block(title, border, colors))
        .highlight_style(highlight)
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn now_playing_line(core: &TuneCore, bar_width: usize, colors: &Palette) -> Line<'static> {
    let (elapsed, total) = core.queue.progress();
    let (label, state) = match core.queue.current() {
        Some(track) if core.queue.is_paused() => (track.name.clone(), "Paused "),
        Some(track) => (track.name.clone(), "Playing"),
        None => (String::from("-"), "Stopped"),
    };

    Line::from(vec![
        Span::styled(
            format!("{state}  "),
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(label, Style::default().fg(colors.text)),
        Span::styled("  ", Style::default()),
        Span::styled(
            progress_line(elapsed, total, bar_width),
            Style::default().fg(colors.muted),
        ),
    ])
}

fn panel_block<'a>(title: &'a str, border: Color, colors: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(colors.panel_bg))
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// `[###-----] mm:ss / mm:ss`; an unknown or zero length draws an empty bar.
fn progress_line(elapsed: Duration, total: Duration, width: usize) -> String {
    let ratio = if total.is_zero() {
        0.0
    } else {
        (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
    };
    let filled = ((ratio * width as f64).floor() as usize).min(width);
    format!(
        "[{}{}] {} / {}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        format_duration(elapsed),
        format_duration(total)
    )
}
