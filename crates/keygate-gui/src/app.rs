//! Host application: owns the saved key and drives the API key dialog

use crate::async_bridge::AsyncBridge;
use crate::state::AppState;
use crate::ui_state::{LogEntry, LogLevel, UiState};
use crate::widgets;
use crate::widgets::api_key_dialog::DialogEnv;
use crate::widgets::key_status::KeyStatusAction;
use chrono::Local;
use keygate_core::{DialogProps, Locale, ThemePreference};
use tracing::{error, info, warn};

/// Main application struct implementing eframe::App
pub struct KeygateApp {
    /// Domain state
    state: AppState,

    /// UI state
    ui_state: UiState,

    /// Async runtime bridge
    async_bridge: AsyncBridge,
}

impl KeygateApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> std::io::Result<Self> {
        Ok(Self::with_state(AppState::new(), AsyncBridge::new()?))
    }

    fn with_state(mut state: AppState, async_bridge: AsyncBridge) -> Self {
        let warnings = std::mem::take(&mut state.startup_warnings);
        let mut app = Self {
            state,
            ui_state: UiState::new(),
            async_bridge,
        };

        app.add_log(LogLevel::Info, "Application started");
        for warning in warnings {
            app.add_log(LogLevel::Warning, warning);
        }

        // No key yet: the user has to go through the dialog.
        if !app.state.config.has_api_key() {
            app.ui_state.open_dialog(false);
        }

        app
    }

    /// Add a log entry to the in-app log and the structured log
    fn add_log(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info => info!(target: "keygate_gui", "{message}"),
            LogLevel::Warning => warn!(target: "keygate_gui", "{message}"),
            LogLevel::Error => error!(target: "keygate_gui", "{message}"),
        }
        self.ui_state.add_log_entry(LogEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            message,
        });
    }

    fn apply_theme(&self, ctx: &egui::Context) {
        let visuals = match self.state.config.ui.theme {
            ThemePreference::Dark => egui::Visuals::dark(),
            ThemePreference::Light => egui::Visuals::light(),
        };
        ctx.set_visuals(visuals);
    }

    fn persist(&mut self, what: &str) {
        if let Err(e) = self.state.save_config() {
            self.add_log(LogLevel::Error, format!("Failed to save {what}: {e}"));
        }
    }

    /// Store a key handed over by the dialog
    fn accept_key(&mut self, key: String) {
        self.state.config.set_api_key(&key);
        match self.state.save_config() {
            Ok(()) => self.add_log(LogLevel::Info, "API key saved"),
            Err(e) => self.add_log(LogLevel::Error, format!("Failed to save API key: {e}")),
        }
    }

    fn clear_key(&mut self) {
        self.state.config.clear_api_key();
        self.persist("configuration");
        self.add_log(LogLevel::Info, "API key cleared");
    }

    /// Render the top panel with title, language and theme controls
    fn render_top_panel(&mut self, ctx: &egui::Context) {
        let mut theme_changed = false;
        let mut locale_changed = false;

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Keygate");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let theme_label = match self.state.config.ui.theme {
                        ThemePreference::Dark => "☀ Light",
                        ThemePreference::Light => "🌙 Dark",
                    };
                    if ui.button(theme_label).clicked() {
                        self.state.config.ui.theme = match self.state.config.ui.theme {
                            ThemePreference::Dark => ThemePreference::Light,
                            ThemePreference::Light => ThemePreference::Dark,
                        };
                        theme_changed = true;
                    }

                    let locale = &mut self.state.config.ui.locale;
                    egui::ComboBox::from_id_salt("locale")
                        .selected_text(match *locale {
                            Locale::En => "English",
                            Locale::Vi => "Tiếng Việt",
                        })
                        .show_ui(ui, |ui| {
                            locale_changed |= ui
                                .selectable_value(locale, Locale::En, "English")
                                .changed();
                            locale_changed |= ui
                                .selectable_value(locale, Locale::Vi, "Tiếng Việt")
                                .changed();
                        });
                });
            });
        });

        if locale_changed {
            self.state.dialog.set_locale(self.state.config.ui.locale);
        }
        if theme_changed || locale_changed {
            self.persist("UI preferences");
        }
    }

    fn render_main_ui(&mut self, ui: &mut egui::Ui) {
        let mut status_action = KeyStatusAction::None;

        ui.group(|ui| {
            ui.set_min_width(ui.available_width());
            status_action =
                widgets::key_status::render(ui, &self.state.config, self.ui_state.dialog_open);
        });

        match status_action {
            KeyStatusAction::OpenDialog => self.ui_state.open_dialog(true),
            KeyStatusAction::ClearKey => self.clear_key(),
            KeyStatusAction::None => {}
        }

        ui.add_space(8.0);

        let log_response = egui::CollapsingHeader::new("Technical Log")
            .default_open(self.ui_state.technical_log_expanded)
            .show(ui, |ui| {
                widgets::technical_log::render(ui, &mut self.ui_state);
            });
        if log_response.header_response.clicked() {
            self.ui_state.technical_log_expanded = !self.ui_state.technical_log_expanded;
        }
    }

    fn render_dialog(&mut self, ctx: &egui::Context) {
        let props = DialogProps::new(
            self.ui_state.dialog_open,
            self.state.config.api_key.clone().unwrap_or_default(),
            self.ui_state.dialog_dismissible,
        );
        let env = DialogEnv {
            bridge: &self.async_bridge,
            verifier: self.state.verifier.as_ref(),
            policy: self.state.policy(),
            help_url: &self.state.config.provider.help_url,
        };

        let mut accepted = None;
        let mut closed = false;
        widgets::api_key_dialog::show(
            ctx,
            &mut self.state.dialog,
            &props,
            &env,
            &mut |key| accepted = Some(key),
            &mut || closed = true,
        );

        if let Some(key) = accepted {
            self.accept_key(key);
        }
        if closed {
            self.ui_state.close_dialog();
        }
    }
}

impl eframe::App for KeygateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_theme(ctx);

        self.render_top_panel(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_main_ui(ui);
        });

        self.render_dialog(ctx);
    }
}
