use ratatui::{
    backend::Backend,
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::status::StatusKind;

pub fn draw_status_bar<B: Backend>(f: &mut Frame, app: &App, area: Rect) {
    let Some(message) = app.status.current() else {
        return;
    };

    let style = match message.kind {
        StatusKind::Error => Style::default().fg(Color::Red),
        StatusKind::Success => Style::default().fg(Color::Green),
        StatusKind::Info if app.is_checking_devices => Style::default().fg(Color::Cyan),
        StatusKind::Info => Style::default().fg(Color::Yellow),
    };

    let paragraph = Paragraph::new(message.text.as_str())
        .style(style)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}
