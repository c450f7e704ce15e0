use crate::app::{App, View};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar: message or key hints on the left, selection
/// summary on the right.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let left: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        match app.view {
            View::Grid => Cow::Borrowed(
                "[space]select [enter]open [arrows]move [r]etry [t]heme [?]help [q]uit",
            ),
            View::Focus => Cow::Borrowed("[b/esc]back [space]select [j/k]scroll [q]uit"),
        }
    };

    let right = selection_summary(app);
    let style = app.style("status_bar");

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(right.len() as u16 + 1),
        ])
        .split(area);

    f.render_widget(Paragraph::new(left).style(style), chunks[0]);
    f.render_widget(Paragraph::new(right).style(style), chunks[1]);
}

fn selection_summary(app: &App) -> String {
    let local = app.feed.selected_count();
    match app.remote_selected_count {
        Some(remote) => format!("{local} selected (server {remote}) "),
        None => format!("{local} selected "),
    }
}
