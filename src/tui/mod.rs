mod clipboard;
mod help;
mod state;

use crate::api::CaptionApi;
use crate::cli::Cli;
use crate::model::{AppEvent, UiCommand};
use crate::orchestrator;
use anyhow::{Context, Result};
use clipboard::copy_to_clipboard;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use help::draw_help;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{Field, UiState, TAB_COMPOSE, TAB_COUNT, TAB_HELP, TAB_HISTORY, TAB_RESULTS};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli, api: Arc<dyn CaptionApi>) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(args, event_rx, cmd_tx));

    let res = orchestrator::run_controller(api, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// What a key press asks the UI loop to do.
#[derive(Debug)]
enum KeyOutcome {
    Nothing,
    Send(UiCommand),
    Copy(String),
    Quit,
}

fn handle_key(state: &mut UiState, modifiers: KeyModifiers, code: KeyCode) -> KeyOutcome {
    match (modifiers, code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => return KeyOutcome::Quit,
        (_, KeyCode::Tab) => {
            state.tab = (state.tab + 1) % TAB_COUNT;
            return KeyOutcome::Nothing;
        }
        (_, KeyCode::BackTab) => {
            state.tab = (state.tab + TAB_COUNT - 1) % TAB_COUNT;
            return KeyOutcome::Nothing;
        }
        _ => {}
    }

    if state.tab == TAB_COMPOSE {
        match code {
            KeyCode::Enter => {
                return state
                    .submit()
                    .map(KeyOutcome::Send)
                    .unwrap_or(KeyOutcome::Nothing)
            }
            KeyCode::Up => state.focus_next(false),
            KeyCode::Down => state.focus_next(true),
            KeyCode::Left => state.adjust_focused(false),
            KeyCode::Right => state.adjust_focused(true),
            KeyCode::Backspace => state.backspace(),
            KeyCode::Esc if state.focus == Field::Topic => state.focus_next(true),
            KeyCode::Char(' ') if matches!(state.focus, Field::Emojis | Field::Hashtags) => {
                state.adjust_focused(true)
            }
            KeyCode::Char(c) => {
                if !state.type_char(c) {
                    return global_key(state, c);
                }
            }
            _ => {}
        }
        return KeyOutcome::Nothing;
    }

    match code {
        KeyCode::Up | KeyCode::Char('k') => state.move_selection(false),
        KeyCode::Down | KeyCode::Char('j') => state.move_selection(true),
        KeyCode::Char('y') => {
            let text = match state.tab {
                TAB_RESULTS => state.selected_result().map(str::to_string),
                TAB_HISTORY => state
                    .selected_history()
                    .and_then(|(r, vi)| r.variants.get(vi).cloned()),
                _ => None,
            };
            if let Some(text) = text {
                return KeyOutcome::Copy(text);
            }
        }
        KeyCode::Char('f') if state.tab == TAB_HISTORY => {
            if let Some(cmd) = state.favorite_selected() {
                state.note_history_busy("Favoriting…");
                return KeyOutcome::Send(cmd);
            }
        }
        KeyCode::Char('r') if state.tab == TAB_HISTORY => {
            state.note_history_busy("Refreshing history…");
            return KeyOutcome::Send(UiCommand::RefreshHistory);
        }
        KeyCode::Char(c) => return global_key(state, c),
        _ => {}
    }
    KeyOutcome::Nothing
}

fn global_key(state: &mut UiState, c: char) -> KeyOutcome {
    match c {
        'q' => KeyOutcome::Quit,
        '?' => {
            state.tab = TAB_HELP;
            KeyOutcome::Nothing
        }
        _ => KeyOutcome::Nothing,
    }
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        topic: args.topic.clone(),
        tone: args.tone,
        platform: args.platform,
        length: args.length,
        variants_input: args.variants.to_string(),
        include_emojis: args.emojis,
        include_hashtags: args.hashtags,
        info: format!("Service: {}", args.base_url),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut redraw = true;

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if redraw || last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
            redraw = false;
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(&mut state, k.modifiers, k.code) {
                    KeyOutcome::Nothing => {}
                    KeyOutcome::Send(cmd) => {
                        let _ = cmd_tx.send(cmd);
                    }
                    KeyOutcome::Copy(text) => {
                        state.info = match copy_to_clipboard(&text) {
                            Ok(()) => "Copied to clipboard!".into(),
                            Err(e) => format!("Clipboard copy failed: {e:#}"),
                        };
                    }
                    KeyOutcome::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                }
                // Redraw on the next iteration so input feels immediate.
                redraw = true;
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Compose"),
        Line::from(format!("Results ({})", state.results.len())),
        Line::from(format!("History ({})", state.history.len())),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(Block::default().borders(Borders::ALL).title("blink-captions"))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_COMPOSE => draw_compose(chunks[1], f, state),
        TAB_RESULTS => draw_results(chunks[1], f, state),
        TAB_HISTORY => draw_history(chunks[1], f, state),
        _ => draw_help(chunks[1], f),
    }

    draw_status(chunks[2], f, state);
}

fn draw_compose(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines: Vec<Line> = Vec::new();
    for field in Field::ALL {
        let value = match field {
            Field::Topic => state.topic.clone(),
            Field::Tone => state.tone.to_string(),
            Field::Platform => state.platform.to_string(),
            Field::Length => state.length.to_string(),
            Field::Variants => state.variants_input.clone(),
            Field::Emojis => checkbox(state.include_emojis),
            Field::Hashtags => checkbox(state.include_hashtags),
        };
        let focused = field == state.focus;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let value = match field {
            Field::Tone | Field::Platform | Field::Length | Field::Variants if focused => {
                format!("‹ {value} ›")
            }
            Field::Topic if focused => format!("{value}▏"),
            _ => value,
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<10}", field.label()), label_style),
            Span::raw(value),
        ]));
    }
    lines.push(Line::from(""));

    let button = if state.pending {
        Span::styled(
            "[ Generating... ]",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::styled(
            "[ Generate Captions ]  (enter)",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    };
    lines.push(Line::from(button));

    if let Some(err) = state.error.as_deref() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Generate new captions"),
        );
    f.render_widget(p, area);
}

fn checkbox(on: bool) -> String {
    let mark = if on { "[x]" } else { "[ ]" };
    mark.to_string()
}

fn draw_results(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Results");
    if state.results.is_empty() {
        let p = Paragraph::new("Run a generation to see captions here.").block(block);
        f.render_widget(p, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0;
    for (i, caption) in state.results.iter().enumerate() {
        let selected = i == state.results_selected;
        if selected {
            selected_line = lines.len();
        }
        push_caption(&mut lines, &format!("{:>2}.", i + 1), caption, selected);
        lines.push(Line::from(""));
    }

    let p = Paragraph::new(lines)
        .scroll((scroll_for(selected_line, area), 0))
        .block(block);
    f.render_widget(p, area);
}

fn draw_history(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let title = match state.selected_history() {
        Some((r, _)) if !r.favorite => "Recent generations (f: favorite, y: copy, r: refresh)",
        Some(_) => "Recent generations (y: copy, r: refresh)",
        None => "Recent generations",
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    if state.history.is_empty() {
        let p = Paragraph::new("No history yet.").block(block);
        f.render_widget(p, area);
        return;
    }

    let selected = state.history_rows().get(state.history_selected).copied();
    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0;
    for (ri, record) in state.history.iter().enumerate() {
        lines.push(Line::from(Span::styled(
            record.created_at_display(),
            Style::default().fg(Color::DarkGray),
        )));
        let badge = if record.favorite {
            Span::styled("  ★ Favorited", Style::default().fg(Color::Yellow))
        } else {
            Span::raw("")
        };
        lines.push(Line::from(vec![
            Span::styled(
                record.topic.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            badge,
        ]));
        lines.push(Line::from(Span::styled(
            format!("{} • {} • {}", record.tone, record.platform, record.length),
            Style::default().fg(Color::Gray),
        )));
        for (vi, variant) in record.variants.iter().enumerate() {
            let is_selected = selected == Some((ri, vi));
            if is_selected {
                selected_line = lines.len();
            }
            push_caption(&mut lines, &format!("  [{vi}]"), variant, is_selected);
        }
        lines.push(Line::from(""));
    }

    let p = Paragraph::new(lines)
        .scroll((scroll_for(selected_line, area), 0))
        .block(block);
    f.render_widget(p, area);
}

/// Push a caption, one line per caption line, highlighting the selected one.
fn push_caption(lines: &mut Vec<Line<'static>>, prefix: &str, caption: &str, selected: bool) {
    let style = if selected {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default()
    };
    let marker = if selected { "▶ " } else { "  " };
    for (n, text) in caption.lines().enumerate() {
        let lead = if n == 0 {
            format!("{marker}{prefix} ")
        } else {
            " ".repeat(marker.chars().count() + prefix.chars().count() + 1)
        };
        lines.push(Line::from(vec![
            Span::raw(lead),
            Span::styled(text.to_string(), style),
        ]));
    }
}

/// Scroll offset that keeps `line` inside the bordered area.
fn scroll_for(line: usize, area: Rect) -> u16 {
    let visible = area.height.saturating_sub(2) as usize;
    line.saturating_sub(visible.saturating_sub(2)) as u16
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = Vec::new();
    if state.pending {
        spans.push(Span::styled("● ", Style::default().fg(Color::Yellow)));
    }
    spans.push(Span::raw(state.info.clone()));
    let p = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::record;

    fn press(state: &mut UiState, code: KeyCode) -> KeyOutcome {
        handle_key(state, KeyModifiers::NONE, code)
    }

    #[test]
    fn typing_q_in_topic_does_not_quit() {
        let mut state = UiState::default();
        assert!(matches!(press(&mut state, KeyCode::Char('q')), KeyOutcome::Nothing));
        assert_eq!(state.topic, "q");

        press(&mut state, KeyCode::Esc);
        assert!(matches!(press(&mut state, KeyCode::Char('q')), KeyOutcome::Quit));
    }

    #[test]
    fn enter_submits_once_until_settled() {
        let mut state = UiState {
            topic: "Summer sale".into(),
            ..Default::default()
        };
        assert!(matches!(
            press(&mut state, KeyCode::Enter),
            KeyOutcome::Send(UiCommand::Generate(_))
        ));
        assert!(matches!(press(&mut state, KeyCode::Enter), KeyOutcome::Nothing));
    }

    #[test]
    fn history_keys_favorite_copy_and_refresh() {
        let mut state = UiState {
            tab: TAB_HISTORY,
            ..Default::default()
        };
        state.apply_event(AppEvent::HistoryUpdated {
            records: vec![record("a", false)],
        });

        match press(&mut state, KeyCode::Char('y')) {
            KeyOutcome::Copy(text) => assert_eq!(text, "first"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match press(&mut state, KeyCode::Char('f')) {
            KeyOutcome::Send(UiCommand::Favorite { id, index }) => {
                assert_eq!(id, "a");
                assert_eq!(index, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(matches!(
            press(&mut state, KeyCode::Char('r')),
            KeyOutcome::Send(UiCommand::RefreshHistory)
        ));
    }

    #[test]
    fn favorited_record_offers_no_favorite() {
        let mut state = UiState {
            tab: TAB_HISTORY,
            ..Default::default()
        };
        state.apply_event(AppEvent::HistoryUpdated {
            records: vec![record("a", true)],
        });
        assert!(matches!(press(&mut state, KeyCode::Char('f')), KeyOutcome::Nothing));
    }

    #[test]
    fn tab_cycles_through_all_tabs() {
        let mut state = UiState::default();
        for expected in [TAB_RESULTS, TAB_HISTORY, TAB_HELP, TAB_COMPOSE] {
            press(&mut state, KeyCode::Tab);
            assert_eq!(state.tab, expected);
        }
        press(&mut state, KeyCode::BackTab);
        assert_eq!(state.tab, TAB_HELP);
    }

    #[test]
    fn scroll_keeps_selection_visible() {
        let area = Rect::new(0, 0, 40, 12);
        assert_eq!(scroll_for(0, area), 0);
        assert_eq!(scroll_for(8, area), 0);
        assert_eq!(scroll_for(20, area), 12);
    }
}
