//! Modal API key dialog
//!
//! Rendering only: every transition goes through [`KeyDialog`], and the probe
//! runs on the [`AsyncBridge`]. The host passes its confirm and close
//! callbacks on every frame; after an accepted key the confirm callback runs
//! first, then the close callback.

use keygate_core::dialog::{ConfirmStep, DialogProps, KeyDialog};
use keygate_core::messages::{self, dialog_text};
use keygate_core::{
    AmbiguityPolicy, AmbiguousCause, GeminiVerifier, ValidationResult, VerificationOutcome,
};
use tracing::{info, warn};

use crate::async_bridge::{AsyncBridge, CompletedCheck};

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 38, 38);
const ACCENT_COLOR: egui::Color32 = egui::Color32::from_rgb(37, 99, 235);

/// Collaborators the dialog needs besides its own state.
pub struct DialogEnv<'a> {
    pub bridge: &'a AsyncBridge,
    /// `None` when no probe client could be built; checks then count as ambiguous
    pub verifier: Option<&'a GeminiVerifier>,
    pub policy: AmbiguityPolicy,
    pub help_url: &'a str,
}

enum UserAction {
    Confirm,
    Dismiss,
}

/// Render the dialog (when open) and route its outcome to the host callbacks.
pub fn show(
    ctx: &egui::Context,
    dialog: &mut KeyDialog,
    props: &DialogProps,
    env: &DialogEnv<'_>,
    on_confirm: &mut dyn FnMut(String),
    on_close: &mut dyn FnMut(),
) {
    dialog.sync(props);

    // Drain even while closed so stale results never pile up.
    let completed = env.bridge.take_completed();
    if apply_completed(dialog, completed, env.policy, on_confirm, on_close) {
        return;
    }

    if !dialog.is_open() {
        return;
    }

    let locale = dialog.locale();
    let text = dialog_text(locale);
    let placeholder = messages::placeholder(locale, &dialog.rules().prefix);
    let mut action = None;

    egui::Window::new(text.title)
        .id(egui::Id::new("api_key_dialog"))
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.set_width(420.0);
            let checking = dialog.session().checking;

            ui.horizontal(|ui| {
                ui.heading(format!("🔑 {}", text.title));
                if dialog.is_dismissible() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui
                            .add_enabled(dialog.request_dismiss(), egui::Button::new("✖"))
                            .clicked()
                        {
                            action = Some(UserAction::Dismiss);
                        }
                    });
                }
            });

            ui.add_space(8.0);
            ui.label(egui::RichText::new(text.field_label).strong());

            ui.horizontal(|ui| {
                let mut buffer = dialog.session().input.clone();
                let edit = egui::TextEdit::singleline(&mut buffer)
                    .password(!dialog.session().visible)
                    .hint_text(placeholder.as_str())
                    .desired_width(360.0);
                let response = ui.add_enabled(!checking, edit);
                if response.changed() {
                    dialog.edit_input(buffer);
                }
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    action = Some(UserAction::Confirm);
                }

                let (icon, hover) = if dialog.session().visible {
                    ("🙈", text.hide_key)
                } else {
                    ("👁", text.show_key)
                };
                if ui.button(icon).on_hover_text(hover).clicked() {
                    dialog.toggle_visibility();
                }
            });

            if let Some(error) = dialog.session().last_error.as_deref() {
                ui.colored_label(ERROR_COLOR, error);
            }

            ui.label(egui::RichText::new(text.storage_note).small().weak());
            ui.add_space(8.0);

            ui.group(|ui| {
                ui.set_min_width(ui.available_width());
                ui.label(egui::RichText::new(text.help_heading).strong());
                ui.horizontal(|ui| {
                    ui.label(text.help_visit);
                    if ui.link(text.help_link).on_hover_text(env.help_url).clicked() {
                        if let Err(err) = open::that(env.help_url) {
                            warn!(%err, url = env.help_url, "Failed to open browser");
                        }
                    }
                });
                ui.label(text.help_create);
                ui.label(text.help_paste);
            });

            ui.add_space(8.0);

            ui.horizontal(|ui| {
                if dialog.is_dismissible()
                    && ui
                        .add_enabled(dialog.request_dismiss(), egui::Button::new(text.cancel))
                        .clicked()
                {
                    action = Some(UserAction::Dismiss);
                }

                if checking {
                    ui.add(egui::Spinner::new());
                    ui.label(text.checking);
                } else {
                    let confirm = egui::Button::new(
                        egui::RichText::new(text.confirm).color(egui::Color32::WHITE),
                    )
                    .fill(ACCENT_COLOR);
                    if ui.add_enabled(dialog.can_confirm(), confirm).clicked() {
                        action = Some(UserAction::Confirm);
                    }
                }
            });
        });

    match action {
        Some(UserAction::Confirm) => start_confirm(ctx, dialog, env, on_confirm, on_close),
        Some(UserAction::Dismiss) => {
            if dialog.request_dismiss() {
                info!("API key dialog dismissed");
                on_close();
            }
        }
        None => {}
    }
}

fn start_confirm(
    ctx: &egui::Context,
    dialog: &mut KeyDialog,
    env: &DialogEnv<'_>,
    on_confirm: &mut dyn FnMut(String),
    on_close: &mut dyn FnMut(),
) {
    match dialog.request_confirm() {
        ConfirmStep::Verify(ticket) => match env.verifier {
            Some(verifier) => {
                env.bridge
                    .spawn_verification(verifier.clone(), ticket, Some(ctx.clone()));
            }
            None => {
                let outcome = VerificationOutcome::Ambiguous(AmbiguousCause::Transport(
                    "no verifier available".to_string(),
                ));
                if let Some(ValidationResult::Accepted(key)) =
                    dialog.complete_verification(ticket, &outcome, env.policy)
                {
                    finish_accepted(key, on_confirm, on_close);
                }
            }
        },
        ConfirmStep::Accepted(key) => finish_accepted(key, on_confirm, on_close),
        ConfirmStep::Rejected(reason) => info!(?reason, "API key rejected"),
        ConfirmStep::Ignored => {}
    }
}

/// Feed finished probes to the controller. Returns true when a key was accepted.
pub(crate) fn apply_completed(
    dialog: &mut KeyDialog,
    completed: Vec<CompletedCheck>,
    policy: AmbiguityPolicy,
    on_confirm: &mut dyn FnMut(String),
    on_close: &mut dyn FnMut(),
) -> bool {
    for check in completed {
        match dialog.complete_verification(check.ticket, &check.outcome, policy) {
            Some(ValidationResult::Accepted(key)) => {
                finish_accepted(key, on_confirm, on_close);
                return true;
            }
            Some(ValidationResult::Rejected(reason)) => info!(?reason, "API key rejected"),
            None => {}
        }
    }
    false
}

fn finish_accepted(key: String, on_confirm: &mut dyn FnMut(String), on_close: &mut dyn FnMut()) {
    info!("API key accepted");
    on_confirm(key);
    on_close();
}
