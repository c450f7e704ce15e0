//! Card grid.

use crate::app::{App, CARD_HEIGHT};
use crate::feed::{chunk_rows, FeedView, Item};
use crate::util::{file_name, strip_control_chars, truncate_to_width};
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Shown when the source has no dataset.
pub(super) const NO_DATASET_MESSAGE: &str = "No dataset loaded";

pub(super) fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let title = grid_title(app);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border"))
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);
    app.set_grid_area(inner);

    let state = match app.feed.view() {
        FeedView::NoDataset => {
            render_message(f, app, inner, NO_DATASET_MESSAGE);
            return;
        }
        FeedView::Ready(state) => state,
    };

    if state.items.is_empty() {
        let msg = if app.last_load_error.is_some() {
            "Could not load samples (press r to retry)"
        } else if state.initial_load {
            "Loading samples..."
        } else {
            "Dataset is empty"
        };
        render_message(f, app, inner, msg);
        return;
    }

    let columns = app.columns;
    let card_width = (inner.width / columns as u16).max(1);

    for (row_idx, items) in chunk_rows(&state.items, columns)
        .enumerate()
        .skip(app.scroll_row)
        .take(app.visible_rows)
    {
        let y = inner.y + (row_idx - app.scroll_row) as u16 * CARD_HEIGHT;
        for (col, item) in items.iter().enumerate() {
            let card = Rect {
                x: inner.x + col as u16 * card_width,
                y,
                width: card_width,
                height: CARD_HEIGHT.min(inner.bottom().saturating_sub(y)),
            };
            if card.height == 0 {
                continue;
            }
            let index = row_idx * columns + col;
            render_card(f, app, item, index == app.cursor, card);
        }
    }
}

fn grid_title(app: &App) -> String {
    match app.feed.dataset() {
        None => " sample-grid ".to_string(),
        Some(dataset) => {
            let loading = if app.feed.is_loading() { " loading..." } else { "" };
            format!(
                " {} ({}/{}){} ",
                strip_control_chars(&dataset.name),
                app.feed.items().len(),
                dataset.count,
                loading
            )
        }
    }
}

fn render_message(f: &mut Frame, app: &App, area: Rect, msg: &str) {
    if area.height == 0 {
        return;
    }
    let y = area.y + area.height / 2;
    let line = Rect { y, height: 1, ..area };
    let paragraph = Paragraph::new(msg)
        .style(app.style("empty_message"))
        .alignment(Alignment::Center);
    f.render_widget(paragraph, line);
}

fn render_card(f: &mut Frame, app: &App, item: &Item, is_cursor: bool, area: Rect) {
    let selected = app.feed.is_selected(&item.id);
    let mut border_style = if selected {
        app.style("card_selected")
    } else {
        app.style("card_normal")
    };
    if is_cursor {
        border_style = border_style.patch(app.style("card_cursor"));
    }

    let marker = if selected { "[x]" } else { "[ ]" };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(marker, border_style));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = usize::from(inner.width);
    let name = strip_control_chars(file_name(&item.filepath));
    let boxes: usize = item.labels.iter().map(|l| l.detections.len()).sum();
    let classes = class_summary(item);

    let lines = vec![
        Line::from(Span::styled(
            truncate_to_width(&name, width).into_owned(),
            app.style("card_title"),
        )),
        Line::from(Span::styled(
            truncate_to_width(&classes, width).into_owned(),
            app.style("card_meta"),
        )),
        Line::from(Span::styled(
            format!("{boxes} box{}", if boxes == 1 { "" } else { "es" }),
            app.style("card_meta"),
        )),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

/// Distinct detection classes, in first-seen order.
fn class_summary(item: &Item) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for detection in item.labels.iter().flat_map(|l| l.detections.iter()) {
        if !seen.contains(&detection.label.as_str()) {
            seen.push(&detection.label);
        }
    }
    strip_control_chars(&seen.join(", ")).into_owned()
}
