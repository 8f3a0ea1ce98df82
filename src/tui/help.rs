use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(desc),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("Ctrl-C", 6, "Quit (q also quits outside text fields)"),
        key_line("tab", 9, "Switch tabs"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Compose tab:"),
        key_line("↑/↓", 9, "Move between fields"),
        key_line("←/→", 9, "Change option / step variants"),
        key_line("space", 7, "Toggle emojis or hashtags"),
        key_line("enter", 7, "Generate captions"),
        key_line("esc", 9, "Leave the topic field"),
        Line::from(""),
        Line::from("Results tab:"),
        key_line("↑/↓ j/k", 5, "Navigate"),
        key_line("y", 11, "Copy selected caption"),
        Line::from(""),
        Line::from("History tab:"),
        key_line("↑/↓ j/k", 5, "Navigate"),
        key_line("y", 11, "Copy selected caption"),
        key_line("f", 11, "Favorite the selected generation"),
        key_line("r", 11, "Refresh history"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
