//! Colour themes and font installation.

use crate::config::FontConfig;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Themes offered in the Window menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    /// Warm dark grey
    Darcula,
    /// Darcula with deeper backgrounds
    DarculaDarker,
    /// Blue-violet classic palette
    ImGuiColorsClassic,
    /// Neutral dark palette with blue accents
    ImGuiColorsDark,
    /// Mid grey with orange selection
    PhotoshopStyle,
    /// Pure black backgrounds
    BlackIsBlack,
    /// Near black with a blue accent
    SoDarkAccentBlue,
    /// Near black with a red accent
    SoDarkAccentRed,
    /// Near black with a yellow accent
    SoDarkAccentYellow,
}

impl Theme {
    /// All themes in menu order.
    pub const ALL: [Theme; 9] = [
        Theme::Darcula,
        Theme::DarculaDarker,
        Theme::ImGuiColorsClassic,
        Theme::ImGuiColorsDark,
        Theme::PhotoshopStyle,
        Theme::BlackIsBlack,
        Theme::SoDarkAccentBlue,
        Theme::SoDarkAccentRed,
        Theme::SoDarkAccentYellow,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Theme::Darcula => "Darcula",
            Theme::DarculaDarker => "Darcula Darker",
            Theme::ImGuiColorsClassic => "ImGui Colors Classic",
            Theme::ImGuiColorsDark => "ImGui Colors Dark",
            Theme::PhotoshopStyle => "Photoshop Style",
            Theme::BlackIsBlack => "Black Is Black",
            Theme::SoDarkAccentBlue => "So Dark - Accent Blue",
            Theme::SoDarkAccentRed => "So Dark - Accent Red",
            Theme::SoDarkAccentYellow => "So Dark - Accent Yellow",
        }
    }

    /// Builds the egui visuals for this theme.
    pub fn visuals(self) -> egui::Visuals {
        use egui::Color32 as C;

        // (panel, window, widget, accent)
        let (panel, window, widget, accent) = match self {
            Theme::Darcula => (
                C::from_rgb(60, 63, 65),
                C::from_rgb(50, 52, 54),
                C::from_rgb(77, 80, 82),
                C::from_rgb(75, 110, 175),
            ),
            Theme::DarculaDarker => (
                C::from_rgb(43, 43, 43),
                C::from_rgb(35, 35, 35),
                C::from_rgb(60, 60, 60),
                C::from_rgb(75, 110, 175),
            ),
            Theme::ImGuiColorsClassic => (
                C::from_rgb(40, 40, 60),
                C::from_rgb(30, 30, 45),
                C::from_rgb(70, 70, 110),
                C::from_rgb(115, 115, 205),
            ),
            Theme::ImGuiColorsDark => (
                C::from_rgb(36, 36, 36),
                C::from_rgb(15, 15, 15),
                C::from_rgb(41, 74, 122),
                C::from_rgb(66, 150, 250),
            ),
            Theme::PhotoshopStyle => (
                C::from_rgb(83, 83, 83),
                C::from_rgb(69, 69, 69),
                C::from_rgb(100, 100, 100),
                C::from_rgb(230, 140, 40),
            ),
            Theme::BlackIsBlack => (
                C::BLACK,
                C::BLACK,
                C::from_rgb(35, 35, 35),
                C::from_rgb(110, 110, 110),
            ),
            Theme::SoDarkAccentBlue => (
                C::from_rgb(20, 20, 22),
                C::from_rgb(12, 12, 14),
                C::from_rgb(38, 38, 42),
                C::from_rgb(45, 120, 220),
            ),
            Theme::SoDarkAccentRed => (
                C::from_rgb(20, 20, 22),
                C::from_rgb(12, 12, 14),
                C::from_rgb(38, 38, 42),
                C::from_rgb(200, 55, 55),
            ),
            Theme::SoDarkAccentYellow => (
                C::from_rgb(20, 20, 22),
                C::from_rgb(12, 12, 14),
                C::from_rgb(38, 38, 42),
                C::from_rgb(215, 175, 40),
            ),
        };

        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = panel;
        visuals.window_fill = window;
        visuals.faint_bg_color = panel.gamma_multiply(0.9);
        visuals.extreme_bg_color = window.gamma_multiply(0.7);
        visuals.widgets.inactive.bg_fill = widget;
        visuals.widgets.inactive.weak_bg_fill = widget;
        visuals.widgets.hovered.bg_fill = accent.gamma_multiply(0.8);
        visuals.widgets.hovered.weak_bg_fill = accent.gamma_multiply(0.6);
        visuals.widgets.active.bg_fill = accent;
        visuals.widgets.active.weak_bg_fill = accent;
        visuals.selection.bg_fill = accent.gamma_multiply(0.7);
        visuals.selection.stroke = egui::Stroke::new(1.0, accent);
        visuals.hyperlink_color = accent;
        visuals
    }
}

/// Installs the configured fonts and text sizes.
///
/// A font file that cannot be read is logged and skipped; egui's bundled
/// fonts remain available as fallbacks either way.
pub fn install_fonts(ctx: &egui::Context, config: &FontConfig) {
    if let Some(path) = &config.font_path {
        match std::fs::read(path) {
            Ok(bytes) => {
                let mut fonts = egui::FontDefinitions::default();
                let name = "custom".to_string();
                fonts
                    .font_data
                    .insert(name.clone(), Arc::new(egui::FontData::from_owned(bytes)));
                fonts
                    .families
                    .entry(egui::FontFamily::Proportional)
                    .or_default()
                    .insert(0, name);
                ctx.set_fonts(fonts);
                log::info!("Loaded font {}", path.display());
            }
            Err(err) => {
                log::warn!("Could not read font {}: {err}", path.display());
            }
        }
    }

    let scale = config.font_size / 12.5;
    ctx.style_mut(|style| {
        for (text_style, font_id) in style.text_styles.iter_mut() {
            font_id.size = default_text_size(text_style) * scale;
        }
    });
}

/// egui's stock size for each text style.
fn default_text_size(style: &egui::TextStyle) -> f32 {
    match style {
        egui::TextStyle::Small => 9.0,
        egui::TextStyle::Heading => 18.0,
        egui::TextStyle::Monospace => 12.0,
        _ => 12.5,
    }
}
