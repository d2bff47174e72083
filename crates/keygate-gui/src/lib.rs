//! keygate GUI using eframe/egui
//!
//! Hosts the API key dialog inside a small settings window.

pub mod app;
pub mod async_bridge;
pub mod state;
pub mod ui_state;
pub mod widgets;

/// Main entry point for the GUI
pub fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 520.0])
            .with_min_inner_size([520.0, 460.0])
            .with_resizable(true)
            .with_title("Keygate"),
        ..Default::default()
    };

    eframe::run_native(
        "Keygate",
        native_options,
        Box::new(|cc| Ok(Box::new(app::KeygateApp::new(cc)?))),
    )
    .map_err(|e| {
        Box::new(std::io::Error::other(e.to_string())) as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(())
}
