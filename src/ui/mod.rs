use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::app::{App, InputMode};
use crate::session::Side;
use crate::transfer::format_clock;

mod footer;
mod help_popup;
mod panels;
mod status_bar;

use footer::draw_footer;
use help_popup::render_help_popup;
use panels::draw_panel;
use status_bar::draw_status_bar;

pub fn draw<B: Backend>(f: &mut Frame, app: &mut App) {
    let progress_height = if app.transfer_progress.is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(3),                  // Panels
                Constraint::Length(progress_height), // Copy progress
                Constraint::Length(1),               // Status bar
                Constraint::Length(1),               // Footer
            ]
            .as_ref(),
        )
        .split(f.size());

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(chunks[0]);

    draw_panel::<B>(f, app, Side::Local, panels[0]);
    draw_panel::<B>(f, app, Side::Remote, panels[1]);

    if progress_height > 0 {
        draw_progress::<B>(f, app, chunks[1]);
    }
    draw_status_bar::<B>(f, app, chunks[2]);
    draw_footer::<B>(f, app, chunks[3]);

    if app.input_mode == InputMode::Help {
        render_help_popup::<B>(f, app);
    }
}

fn draw_progress<B: Backend>(f: &mut Frame, app: &App, area: Rect) {
    let Some(snapshot) = &app.transfer_progress else {
        return;
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(
                    " Copying ({} elapsed) ",
                    format_clock(snapshot.elapsed.as_secs_f64())
                ))
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .gauge_style(
            Style::default()
                .fg(Color::Green)
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .ratio(snapshot.fraction())
        .label(snapshot.message());
    f.render_widget(gauge, area);
}

/// Helper function to center a rectangle using a percentage of the available rect `r`
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}
