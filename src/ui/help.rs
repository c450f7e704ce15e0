//! Help overlay: key and mouse bindings.

use crate::app::App;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Row, Table},
    Frame,
};

const SECTIONS: [(&str, &[(&str, &str)]); 3] = [
    (
        "Grid",
        &[
            ("arrows / hjkl", "Move cursor"),
            ("PgUp / PgDn", "Move one screen"),
            ("g / G", "First / last loaded card"),
            ("space", "Click card (select after a pause)"),
            ("space space", "Double click (open)"),
            ("enter", "Open card"),
            ("r", "Retry failed page"),
        ],
    ),
    (
        "Mouse",
        &[
            ("click", "Select card"),
            ("double click", "Open card"),
            ("wheel", "Scroll"),
        ],
    ),
    (
        "General",
        &[
            ("b / esc", "Back to grid"),
            ("t", "Cycle theme"),
            ("?", "Toggle help"),
            ("q / ctrl+c", "Quit"),
        ],
    ),
];

pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(70, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let mut rows: Vec<Row> = Vec::new();
    for (label, bindings) in SECTIONS {
        if !rows.is_empty() {
            rows.push(Row::new(vec![String::new(), String::new()]));
        }
        rows.push(Row::new(vec![
            Line::from(Span::styled(
                format!("-- {label} --"),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ]));
        for (key, action) in bindings {
            rows.push(Row::new(vec![format!("  {key}"), action.to_string()]));
        }
    }

    let widths = [Constraint::Length(18), Constraint::Min(20)];
    let table = Table::new(rows, widths).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.style("card_cursor"))
            .title(format!(
                " Help (double click window {} ms) ",
                app.double_click_window.as_millis()
            )),
    );
    f.render_widget(table, overlay);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
