use ratatui::{
    backend::Backend,
    layout::Margin,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use super::centered_rect;
use crate::app::App;

pub fn render_help_popup<B: Backend>(f: &mut Frame, app: &App) {
    let block = Block::default()
        .title("Keyboard Shortcuts")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::White));

    let area = centered_rect(80, 80, f.size());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let text = get_help_text();
    let line_count = text.lines.len();

    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::White))
        .scroll((app.help_scroll_position, 0));

    let inner_area = area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });

    f.render_widget(paragraph, inner_area);

    if line_count > inner_area.height as usize {
        let mut scrollbar_state =
            ScrollbarState::new(line_count).position(app.help_scroll_position as usize);

        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓")),
            inner_area,
            &mut scrollbar_state,
        );
    }
}

fn key_line<'a>(key: &'a str, description: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<11}", key), Style::default().fg(Color::Green)),
        Span::raw(format!("- {}", description)),
    ])
}

fn heading(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan),
    ))
}

fn get_help_text<'a>() -> Text<'a> {
    Text::from(vec![
        heading("Browsing"),
        key_line("k, ↑", "Move up"),
        key_line("j, ↓", "Move down"),
        key_line("Enter", "Open folder or run [ Refresh ]"),
        key_line("Backspace", "Go to parent folder"),
        key_line("Tab", "Switch between local and device panel"),
        key_line("r", "Reload both panels"),
        Line::from(""),
        heading("Device"),
        key_line("l", "Check devices and load the device panel"),
        key_line("d", "Check devices only"),
        Line::from(""),
        heading("Copying"),
        key_line("Space", "Select or unselect the current entry"),
        key_line("c", "Copy selection to the other panel"),
        key_line("x, Esc", "Cancel after the current file"),
        Line::from(""),
        heading("Other"),
        key_line("e", "Open the config file"),
        key_line("q", "Quit"),
        Line::from(""),
        heading("Help Popup"),
        key_line("?, Esc", "Close help"),
        key_line("↑, k", "Scroll up"),
        key_line("↓, j", "Scroll down"),
    ])
}
