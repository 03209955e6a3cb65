use ratatui::style::Color;

pub const ACCENT: Color = Color::Rgb(218, 118, 89); // #DA7659 - warm orange
pub const WARNING: Color = Color::Rgb(229, 192, 123); // Warm amber

pub const TEXT: Color = Color::Rgb(240, 240, 240);
pub const TEXT_MUTED: Color = Color::Rgb(144, 144, 144);

pub const BG_BASE: Color = Color::Rgb(34, 34, 32);
pub const BG_SURFACE: Color = Color::Rgb(51, 51, 49);
pub const BG_INPUT: Color = Color::Rgb(58, 58, 56);

pub const BORDER: Color = Color::Rgb(66, 66, 64);
pub const BORDER_FOCUS: Color = Color::Rgb(218, 118, 89);

pub const USER: Color = Color::Rgb(218, 118, 89);
pub const ASSISTANT: Color = Color::Rgb(144, 144, 144);
