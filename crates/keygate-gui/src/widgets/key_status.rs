//! Saved API key summary

use keygate_core::FileConfig;

/// What the user asked for from the status section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyStatusAction {
    None,
    OpenDialog,
    ClearKey,
}

/// Render the saved-key section
pub fn render(ui: &mut egui::Ui, config: &FileConfig, dialog_open: bool) -> KeyStatusAction {
    let mut action = KeyStatusAction::None;

    ui.vertical(|ui| {
        ui.heading("Gemini API");

        match config.masked_api_key() {
            Some(masked) => {
                ui.colored_label(egui::Color32::GREEN, format!("✓ API key is saved ({masked})"));

                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(!dialog_open, egui::Button::new("Change API Key"))
                        .clicked()
                    {
                        action = KeyStatusAction::OpenDialog;
                    }
                    if ui
                        .add_enabled(!dialog_open, egui::Button::new("Clear API Key"))
                        .clicked()
                    {
                        action = KeyStatusAction::ClearKey;
                    }
                });
            }
            None => {
                ui.colored_label(egui::Color32::YELLOW, "⚠ No API key saved");
                ui.add_space(8.0);
                if ui
                    .add_enabled(!dialog_open, egui::Button::new("🔑 Enter API Key"))
                    .clicked()
                {
                    action = KeyStatusAction::OpenDialog;
                }
            }
        }

        ui.add_space(4.0);
        ui.label(
            egui::RichText::new(format!(
                "Checks: {} · unverifiable keys: {}",
                if config.validation.remote_check {
                    "live"
                } else {
                    "local only"
                },
                match config.validation.ambiguity_policy {
                    keygate_core::AmbiguityPolicy::FailOpen => "accepted",
                    keygate_core::AmbiguityPolicy::FailClosed => "rejected",
                }
            ))
            .small()
            .weak(),
        );
    });

    action
}
