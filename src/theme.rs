use eframe::egui::Color32;

// Buttons
pub const PRIMARY_BUTTON_BG: Color32 = Color32::from_rgb(74, 144, 226);
pub const STOP_BUTTON_BG: Color32 = Color32::from_rgb(214, 69, 65);
pub const BUTTON_MAIN_TEXT: Color32 = Color32::WHITE;

// Surfaces
pub const STATUS_BG: Color32 = Color32::from_rgb(248, 248, 248);
pub const LOG_BG: Color32 = Color32::from_rgb(250, 250, 250);

// Text
pub const SECONDARY_TEXT: Color32 = Color32::from_rgb(110, 110, 115);
pub const TEXT_ERROR: Color32 = Color32::from_rgb(200, 30, 30);

// Sizing & Spacing
pub const ROUNDING_FRAME: f32 = 4.0;
pub const ROUNDING_BUTTON: f32 = 6.0;
pub const MIN_SIZE_BUTTON: egui::Vec2 = egui::Vec2::new(140.0, 40.0);
pub const BUTTON_FONT_SIZE: f32 = 16.0;
pub const LOG_FONT_SIZE: f32 = 12.0;

// Lines kept in the output view
pub const MAX_LOG_LINES: usize = 5_000;
