use ratatui::{
    backend::Backend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::app::App;
use crate::session::{DirEntry, LoadState, Side};

pub fn draw_panel<B: Backend>(f: &mut Frame, app: &App, side: Side, area: Rect) {
    let is_active = app.active_panel == side;
    let panel = app.session.panel(side);

    let border_style = if is_active {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    };

    let path = match side {
        Side::Local => app.session.local_path().display().to_string(),
        Side::Remote => app.session.remote_path().to_string(),
    };
    let suffix = match panel.state() {
        LoadState::Loading => " (loading...)".to_string(),
        LoadState::Error(_) => " (error)".to_string(),
        LoadState::Idle if side == Side::Remote => match app.session.device_status() {
            Some(status) if !status.is_ready() => format!(" ({})", status),
            _ => " (press l to load)".to_string(),
        },
        _ => String::new(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" {}: {}{} ", side, path, suffix))
        .title_style(border_style.add_modifier(Modifier::BOLD));

    let items: Vec<ListItem> = match panel.state() {
        LoadState::Error(message) if panel.entries().is_empty() => vec![ListItem::new(
            Span::styled(message.clone(), Style::default().fg(Color::Red)),
        )],
        _ => panel.entries().iter().map(entry_item).collect(),
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(if is_active {
            Style::default()
                .bg(Color::Green)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::REVERSED)
        })
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !panel.entries().is_empty() {
        state.select(Some(panel.cursor()));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn entry_item(entry: &DirEntry) -> ListItem<'static> {
    let (icon, color) = if entry.is_special_action {
        ("⟳ ", Color::Magenta)
    } else if entry.is_parent() {
        ("↰ ", Color::Cyan)
    } else if entry.is_folder {
        ("📁 ", Color::Blue)
    } else {
        ("📄 ", Color::White)
    };

    let mark = if entry.is_selected {
        "[x] "
    } else if entry.is_selectable() {
        "[ ] "
    } else {
        "    "
    };

    ListItem::new(Line::from(vec![
        Span::styled(mark, Style::default().fg(Color::Yellow)),
        Span::styled(icon, Style::default().fg(Color::Yellow)),
        Span::styled(entry.name.clone(), Style::default().fg(color)),
    ]))
}
