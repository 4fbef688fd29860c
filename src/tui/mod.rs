//! TUI module: Terminal User Interface using Ratatui.
//!
//! - Input form with live BMI and model status
//! - Recommendation view with an optional feature debug panel

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::DietTheme;
