//! Focused view of a single sample: metadata and its annotation boxes.

use crate::app::App;
use crate::overlay::{to_overlay, OverlayBox};
use crate::util::{file_name, strip_control_chars};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    let Some(item) = app.focused.as_ref() else {
        return;
    };

    let title = format!(" {} ", strip_control_chars(file_name(&item.filepath)));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border"))
        .title(title);

    let selected = if app.feed.is_selected(&item.id) { "yes" } else { "no" };
    let meta = app.style("card_meta");
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Id:       ", meta),
            Span::raw(strip_control_chars(item.id.as_str()).into_owned()),
        ]),
        Line::from(vec![
            Span::styled("Path:     ", meta),
            Span::raw(strip_control_chars(&item.filepath).into_owned()),
        ]),
        Line::from(vec![Span::styled("Selected: ", meta), Span::raw(selected)]),
        Line::from(""),
    ];

    let boxes = to_overlay(&item.labels);
    if boxes.is_empty() {
        lines.push(Line::from(Span::styled(
            "No annotations",
            app.style("empty_message"),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!("Annotations ({})", boxes.len()),
            app.style("card_title"),
        )));
        lines.extend(boxes.iter().map(|b| overlay_line(app, b)));
    }

    let scroll = u16::try_from(app.focus_scroll).unwrap_or(u16::MAX);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

fn overlay_line(app: &App, b: &OverlayBox) -> Line<'static> {
    let confidence = b
        .confidence
        .map(|c| format!("  {:.0}%", c * 100.0))
        .unwrap_or_default();
    Line::from(vec![
        Span::styled(
            format!("  {:<14}", strip_control_chars(&b.label)),
            app.style("overlay_label"),
        ),
        Span::styled(
            format!(
                "({:.3}, {:.3}) -> ({:.3}, {:.3})  {:.3}x{:.3}{}",
                b.top_left.x,
                b.top_left.y,
                b.bottom_right.x,
                b.bottom_right.y,
                b.width(),
                b.height(),
                confidence
            ),
            app.style("overlay_coords"),
        ),
    ])
}
