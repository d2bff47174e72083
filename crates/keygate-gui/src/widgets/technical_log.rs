//! Technical log widget

use crate::ui_state::{LogLevel, UiState};

fn level_style(level: LogLevel) -> (egui::Color32, &'static str) {
    match level {
        LogLevel::Info => (egui::Color32::GRAY, "INFO"),
        LogLevel::Warning => (egui::Color32::YELLOW, "WARN"),
        LogLevel::Error => (egui::Color32::RED, "ERROR"),
    }
}

/// Render technical log
pub fn render(ui: &mut egui::Ui, ui_state: &mut UiState) {
    ui.horizontal(|ui| {
        ui.label(format!("{} / 200 entries", ui_state.technical_log.len()));
        ui.checkbox(&mut ui_state.log_problems_only, "Warnings and errors only");
        if ui.button("Clear").clicked() {
            ui_state.technical_log.clear();
        }
    });

    ui.separator();

    egui::ScrollArea::vertical()
        .max_height(240.0)
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            egui::Grid::new("technical_log_grid")
                .num_columns(3)
                .striped(true)
                .show(ui, |ui| {
                    for entry in ui_state.visible_log_entries() {
                        let (color, tag) = level_style(entry.level);
                        ui.monospace(&entry.timestamp);
                        ui.colored_label(color, tag);
                        ui.label(&entry.message);
                        ui.end_row();
                    }
                });
        });
}
