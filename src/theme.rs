//! Color themes for the grid.
//!
//! A `ThemeVariant` produces a `ColorPalette` of semantic roles; `StyleMap`
//! resolves role names to styles at render time.

use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Case-insensitive lookup used for the `theme` config key.
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Cards --
    pub card_normal: Style,
    pub card_cursor: Style,
    pub card_selected: Style,
    pub card_title: Style,
    pub card_meta: Style,

    // -- Focused item --
    pub overlay_label: Style,
    pub overlay_coords: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub panel_border: Style,
    pub empty_message: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            card_normal: Style::default().fg(Color::Gray),
            card_cursor: Style::default().fg(Color::Cyan),
            card_selected: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            card_title: Style::default().add_modifier(Modifier::BOLD),
            card_meta: Style::default().fg(Color::DarkGray),

            overlay_label: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            overlay_coords: Style::default().fg(Color::Gray),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default(),
            empty_message: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        }
    }

    fn light() -> Self {
        Self {
            card_normal: Style::default().fg(Color::DarkGray),
            card_cursor: Style::default().fg(Color::Blue),
            card_selected: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            card_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            card_meta: Style::default().fg(Color::DarkGray),

            overlay_label: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            overlay_coords: Style::default().fg(Color::Black),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            empty_message: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        }
    }
}

// ============================================================================
// Style Map
// ============================================================================

/// Role-name keyed view of a palette.
#[derive(Debug, Clone)]
pub struct StyleMap {
    map: HashMap<&'static str, Style>,
}

const ROLE_NAMES: [&str; 10] = [
    "card_normal",
    "card_cursor",
    "card_selected",
    "card_title",
    "card_meta",
    "overlay_label",
    "overlay_coords",
    "status_bar",
    "panel_border",
    "empty_message",
];

impl StyleMap {
    pub fn from_palette(p: &ColorPalette) -> Self {
        let styles: [Style; 10] = [
            p.card_normal,
            p.card_cursor,
            p.card_selected,
            p.card_title,
            p.card_meta,
            p.overlay_label,
            p.overlay_coords,
            p.status_bar,
            p.panel_border,
            p.empty_message,
        ];

        let map = ROLE_NAMES.iter().copied().zip(styles).collect();
        Self { map }
    }

    /// Unknown roles resolve to `Style::default()`.
    pub fn resolve(&self, role: &str) -> Style {
        self.map.get(role).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_card_stands_out_in_both_variants() {
        for variant in [ThemeVariant::Dark, ThemeVariant::Light] {
            let p = variant.palette();
            assert_ne!(p.card_selected, p.card_normal, "{}", variant.name());
            assert!(p.card_selected.add_modifier.contains(Modifier::BOLD));
        }
    }

    #[test]
    fn light_palette_differs_from_dark() {
        let dark = ThemeVariant::Dark.palette();
        let light = ThemeVariant::Light.palette();
        assert_ne!(dark.card_cursor, light.card_cursor);
        assert_ne!(dark.status_bar, light.status_bar);
    }

    #[test]
    fn variant_from_str_name() {
        assert_eq!(ThemeVariant::from_str_name("dark"), Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::from_str_name("LIGHT"), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::from_str_name("neon"), None);
    }

    #[test]
    fn variant_cycles() {
        assert_eq!(ThemeVariant::Dark.next(), ThemeVariant::Light);
        assert_eq!(ThemeVariant::Dark.next().next(), ThemeVariant::Dark);
    }

    #[test]
    fn style_map_resolves_every_role() {
        let palette = ThemeVariant::Dark.palette();
        let sm = StyleMap::from_palette(&palette);
        assert_eq!(sm.map.len(), ROLE_NAMES.len());
        assert_eq!(sm.resolve("card_selected"), palette.card_selected);
        assert_eq!(sm.resolve("overlay_label"), palette.overlay_label);
        assert_eq!(sm.resolve("no_such_role"), Style::default());
    }
}
