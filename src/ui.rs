//! UI rendering for the terminal user interface.
//!
//! Everything here is a pure function of the app model, the latest playback
//! state and the preferences; the event loop owns all mutation.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::{App, Screen, SettingsItem};
use crate::config::UiSettings;
use crate::library::{display_artist, display_title, format_mmss};
use crate::playback::{PlaybackState, PlaybackStatus};
use crate::prefs::Preferences;

const PLAYER_CONTROLS: [(&str, &str); 11] = [
    ("j/k", "up/down"),
    ("g/G", "top/bottom"),
    ("enter", "play selected"),
    ("space", "play/pause"),
    ("h/l", "prev/next"),
    ("x", "stop"),
    ("s", "shuffle"),
    ("v", "visualizer"),
    ("d", "remove"),
    ("o", "settings"),
    ("q", "quit"),
];

const SETTINGS_CONTROLS: [(&str, &str); 3] = [
    ("j/k", "up/down"),
    ("enter/space", "change"),
    ("o/esc", "back"),
];

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn controls_text(screen: Screen, seek_step_seconds: u64) -> String {
    let mut parts: Vec<String> = Vec::new();
    match screen {
        Screen::Player => {
            for (k, v) in PLAYER_CONTROLS {
                parts.push(format!("[{k}] {v}"));
                if k == "h/l" {
                    parts.push(format!("[H/L] seek -/+{seek_step_seconds}s"));
                }
            }
        }
        Screen::Settings => {
            for (k, v) in SETTINGS_CONTROLS {
                parts.push(format!("[{k}] {v}"));
            }
        }
    }
    parts.join(" | ")
}

/// One row of the looping visualizer. Flat while nothing plays.
fn visualizer_line(frame: usize, width: usize, playing: bool) -> String {
    (0..width)
        .map(|i| {
            if !playing {
                return BARS[0];
            }
            let phase = (i * 7 + frame * 3 + (i * frame) % 5) % 14;
            BARS[if phase < 8 { phase } else { 14 - phase }]
        })
        .collect()
}

fn status_label(status: &PlaybackStatus) -> &'static str {
    match status {
        PlaybackStatus::Idle => "STOPPED",
        PlaybackStatus::Preparing { .. } => "LOADING",
        PlaybackStatus::Playing { .. } => "PLAYING",
        PlaybackStatus::Paused { .. } => "PAUSED",
    }
}

fn on_off(b: bool) -> &'static str {
    if b { "on" } else { "off" }
}

pub fn draw(
    frame: &mut Frame,
    app: &App,
    playback: &PlaybackState,
    prefs: &Preferences,
    ui: &UiSettings,
    seek_step_seconds: u64,
) {
    let viz_height = if app.visualizer_enabled && app.screen == Screen::Player {
        3
    } else {
        0
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(viz_height),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" retroamp ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    draw_player_panel(frame, chunks[1], playback);

    if viz_height > 0 {
        let width = chunks[2].width.saturating_sub(2) as usize;
        let strip = Paragraph::new(visualizer_line(
            app.visualizer_frame,
            width,
            playback.is_playing(),
        ))
        .style(Style::default().fg(Color::Green))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(strip, chunks[2]);
    }

    match app.screen {
        Screen::Player => draw_playlist(frame, chunks[3], app),
        Screen::Settings => draw_settings(frame, chunks[3], app, prefs),
    }

    let notice = Paragraph::new(app.notice.as_deref().unwrap_or(""))
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(notice, chunks[4]);

    let footer = Paragraph::new(controls_text(app.screen, seek_step_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[5]);
}

fn draw_player_panel(frame: &mut Frame, area: Rect, playback: &PlaybackState) {
    let block = Block::bordered()
        .title(" now playing ")
        .padding(Padding {
            left: 1,
            right: 1,
            top: 0,
            bottom: 0,
        });
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let (title, artist) = match &playback.track {
        Some(t) => (display_title(t), display_artist(t)),
        None => ("-", "-"),
    };
    let line = Line::from(vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::raw(artist),
    ]);
    frame.render_widget(Paragraph::new(line), rows[0]);

    let position = playback.position_ms();
    let duration = playback.duration_ms();
    let info = format!(
        "{}  {} / {}  shuffle: {}",
        status_label(&playback.status),
        format_mmss(position),
        format_mmss(duration),
        on_off(playback.shuffle),
    );
    frame.render_widget(Paragraph::new(info), rows[1]);

    let ratio = if duration > 0 {
        (position as f64 / duration as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label("");
    frame.render_widget(gauge, rows[2]);
}

fn draw_playlist(frame: &mut Frame, area: Rect, app: &App) {
    // Only build ListItems for the visible window, centered on the cursor.
    let total = app.len();
    let height = area.height.saturating_sub(2) as usize;
    let (start, end) = if total <= height || height == 0 {
        (0, total)
    } else {
        let half = height / 2;
        let mut start = app.selected.saturating_sub(half);
        if start + height > total {
            start = total - height;
        }
        (start, start + height)
    };

    let now_playing = app.now_playing_row();
    let items: Vec<ListItem> = (start..end)
        .filter_map(|row| app.track_at(row).map(|t| (row, t)))
        .map(|(row, t)| {
            let text = format!(
                "{:>3}. {} - {}  {}",
                row + 1,
                display_title(t),
                display_artist(t),
                format_mmss(t.duration_ms)
            );
            let style = if now_playing == Some(row) {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(text).style(style)
        })
        .collect();

    let title = format!(
        " playlist ({}) · {} ",
        total,
        app.catalog.sort().label()
    );
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(app.selected.saturating_sub(start)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_settings(frame: &mut Frame, area: Rect, app: &App, prefs: &Preferences) {
    let items: Vec<ListItem> = SettingsItem::ALL
        .iter()
        .map(|item| {
            let value = match item {
                SettingsItem::SortOption => prefs.sort_option().label().to_string(),
                SettingsItem::AutoScan => on_off(prefs.auto_scan_on_startup()).to_string(),
                SettingsItem::FilterShortTracks => on_off(prefs.filter_short_tracks()).to_string(),
                SettingsItem::Visualizer => on_off(prefs.visualizer_enabled()).to_string(),
                SettingsItem::AutoSaveState => on_off(prefs.auto_save_state()).to_string(),
                SettingsItem::Rescan => format!("{} tracks found", app.catalog.scanned_len()),
            };
            let label = item.label(app.catalog.filter().min_duration_ms);
            ListItem::new(format!("{label:<28} {value}"))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" settings "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(app.settings_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}
