//! Keyboard and mouse input.
//!
//! Every click on a card goes through the card's disambiguator; nothing here
//! selects or opens an item directly. `Space` is a raw click on the cursor
//! card and `Enter` acts as a native double click.

use crate::app::{App, AppEvent, View};
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;

use super::helpers::{maybe_load_more, retry_load};
use super::Action;

/// Main key dispatch function.
pub(super) fn handle_key(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    // Help overlay captures all keys while visible.
    if app.show_help {
        if matches!(code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
            app.show_help = false;
        }
        return Action::Continue;
    }

    match app.view {
        View::Grid => handle_grid_key(app, code, event_tx),
        View::Focus => handle_focus_key(app, code, event_tx),
    }
}

fn handle_grid_key(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Left | KeyCode::Char('h') => app.move_cursor(-1),
        KeyCode::Right | KeyCode::Char('l') => app.move_cursor(1),
        KeyCode::Up | KeyCode::Char('k') => app.move_rows(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_rows(1),
        KeyCode::PageDown => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Home | KeyCode::Char('g') => app.jump_to_start(),
        KeyCode::End | KeyCode::Char('G') => app.jump_to_end(),
        KeyCode::Char(' ') => {
            if let Some(id) = app.current_item().map(|item| item.id.clone()) {
                app.click_item(&id, event_tx);
            }
        }
        KeyCode::Enter => {
            if let Some(id) = app.current_item().map(|item| item.id.clone()) {
                app.double_click_item(&id, event_tx);
            }
        }
        KeyCode::Char('r') => retry_load(app, event_tx),
        KeyCode::Char('t') => app.cycle_theme(),
        _ => {}
    }
    maybe_load_more(app, event_tx);
    Action::Continue
}

fn handle_focus_key(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Esc | KeyCode::Char('b') => app.exit_focus(),
        KeyCode::Down | KeyCode::Char('j') => {
            app.focus_scroll = app.focus_scroll.saturating_add(1);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.focus_scroll = app.focus_scroll.saturating_sub(1);
        }
        KeyCode::Char(' ') => {
            if let Some(id) = app.focused.as_ref().map(|item| item.id.clone()) {
                app.click_item(&id, event_tx);
            }
        }
        KeyCode::Char('t') => app.cycle_theme(),
        _ => {}
    }
    Action::Continue
}

/// Mouse input: left clicks on cards, wheel scrolling.
pub(super) fn handle_mouse(app: &mut App, mouse: MouseEvent, event_tx: &mpsc::Sender<AppEvent>) {
    if app.show_help {
        return;
    }
    match (app.view, mouse.kind) {
        (View::Grid, MouseEventKind::Down(MouseButton::Left)) => {
            let Some(index) = app.card_at(mouse.column, mouse.row) else {
                return;
            };
            app.cursor = index;
            if let Some(id) = app.current_item().map(|item| item.id.clone()) {
                app.click_item(&id, event_tx);
            }
        }
        (View::Grid, MouseEventKind::ScrollDown) => {
            app.move_rows(1);
            maybe_load_more(app, event_tx);
        }
        (View::Grid, MouseEventKind::ScrollUp) => app.move_rows(-1),
        (View::Focus, MouseEventKind::ScrollDown) => {
            app.focus_scroll = app.focus_scroll.saturating_add(1);
        }
        (View::Focus, MouseEventKind::ScrollUp) => {
            app.focus_scroll = app.focus_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::CARD_HEIGHT;
    use crate::config::Config;
    use crate::feed::{ItemId, MemoryFeedSource};
    use crate::gesture::Gesture;
    use ratatui::layout::Rect;
    use std::sync::Arc;
    use std::time::Duration;

    async fn loaded_app(count: usize) -> App {
        let source = Arc::new(MemoryFeedSource::demo(count, 20));
        let mut app = App::new(source.clone(), &Config::default());
        app.apply_dataset(source.current_dataset());
        app.feed.load_more(source.as_ref()).await.unwrap();
        app
    }

    fn press(app: &mut App, code: KeyCode, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_key(app, code, KeyModifiers::NONE, tx)
    }

    fn left_click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = loaded_app(5).await;
        let (tx, _rx) = mpsc::channel(8);
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Quit));
        assert!(matches!(
            handle_key(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL, &tx),
            Action::Quit
        ));
    }

    #[tokio::test]
    async fn test_help_captures_keys() {
        let mut app = loaded_app(5).await;
        let (tx, _rx) = mpsc::channel(8);
        press(&mut app, KeyCode::Char('?'), &tx);
        assert!(app.show_help);

        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Continue));
        assert!(!app.show_help);
    }

    #[tokio::test]
    async fn test_arrow_navigation() {
        let mut app = loaded_app(20).await;
        let (tx, _rx) = mpsc::channel(8);
        press(&mut app, KeyCode::Right, &tx);
        press(&mut app, KeyCode::Down, &tx);
        assert_eq!(app.cursor, 5);
        press(&mut app, KeyCode::End, &tx);
        assert_eq!(app.cursor, 19);
        press(&mut app, KeyCode::Home, &tx);
        assert_eq!(app.cursor, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_space_then_wait_activates_cursor_card() {
        let mut app = loaded_app(20).await;
        let (tx, mut rx) = mpsc::channel(8);
        press(&mut app, KeyCode::Right, &tx);
        press(&mut app, KeyCode::Char(' '), &tx);

        tokio::time::advance(Duration::from_millis(300)).await;
        match rx.recv().await {
            Some(AppEvent::Gesture { id, gesture }) => {
                assert_eq!(id, ItemId::new("sample-00001"));
                assert_eq!(gesture, Gesture::Activate);
            }
            other => panic!("expected gesture, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_opens_immediately() {
        let mut app = loaded_app(20).await;
        let (tx, mut rx) = mpsc::channel(8);
        press(&mut app, KeyCode::Enter, &tx);
        assert!(matches!(
            rx.try_recv(),
            Ok(AppEvent::Gesture { gesture: Gesture::Open, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_mouse_clicks_open() {
        let mut app = loaded_app(20).await;
        app.set_grid_area(Rect::new(0, 0, 80, CARD_HEIGHT * 4));
        let (tx, mut rx) = mpsc::channel(8);

        // Second card of the second row.
        handle_mouse(&mut app, left_click(25, CARD_HEIGHT + 1), &tx);
        assert_eq!(app.cursor, 5);
        tokio::time::advance(Duration::from_millis(80)).await;
        handle_mouse(&mut app, left_click(25, CARD_HEIGHT + 1), &tx);

        match rx.try_recv() {
            Ok(AppEvent::Gesture { id, gesture }) => {
                assert_eq!(id, ItemId::new("sample-00005"));
                assert_eq!(gesture, Gesture::Open);
            }
            other => panic!("expected open, got {other:?}"),
        }
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_click_outside_cards_ignored() {
        let mut app = loaded_app(3).await;
        app.set_grid_area(Rect::new(0, 0, 80, CARD_HEIGHT * 4));
        let (tx, _rx) = mpsc::channel(8);
        handle_mouse(&mut app, left_click(70, CARD_HEIGHT * 3), &tx);
        assert_eq!(app.tracked_gestures(), 0);
    }

    #[tokio::test]
    async fn test_escape_leaves_focus() {
        let mut app = loaded_app(5).await;
        let (tx, _rx) = mpsc::channel(8);
        app.open_item(&ItemId::new("sample-00002"));
        press(&mut app, KeyCode::Char('j'), &tx);
        assert_eq!(app.focus_scroll, 1);

        press(&mut app, KeyCode::Esc, &tx);
        assert_eq!(app.view, View::Grid);
        assert_eq!(app.cursor, 2);
    }
}
