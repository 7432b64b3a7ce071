use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

pub fn draw_footer<B: Backend>(f: &mut Frame, app: &App, area: Rect) {
    let footer = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let busy = app.is_transferring();
    let (nav_text, action_text) = if busy {
        ("Copy in progress...", "[x] Cancel  [q] Quit")
    } else {
        (
            "↑/k ↓/j  [Enter] Open  [Backspace] Up  [Space] Select  [Tab] Switch",
            "[c] Copy  [l] Load device  [r] Reload  [e] Config  [?] Help  [q] Quit",
        )
    };

    let nav_help = Paragraph::new(nav_text).style(Style::default().fg(if busy {
        Color::Yellow
    } else {
        Color::Gray
    }));

    let action_help = Paragraph::new(action_text)
        .style(Style::default().fg(if busy { Color::Red } else { Color::Gray }))
        .alignment(Alignment::Right);

    f.render_widget(nav_help, footer[0]);
    f.render_widget(action_help, footer[1]);
}
