//! Framework-independent controller for the API key dialog.
//!
//! The controller owns the session state and every transition; rendering and
//! the actual network probe live with the caller. A confirm attempt that
//! passes the local checks hands out a [`VerifyTicket`]; the caller runs the
//! probe and feeds the outcome back through
//! [`KeyDialog::complete_verification`]. Tickets carry the generation they
//! were issued in, so a result for a dialog that has since been closed or
//! reopened is dropped.

use tracing::debug;

use crate::messages::{self, Locale};
use crate::validation::{AmbiguityPolicy, KeyRules, RejectReason, ValidationResult};
use crate::verifier::VerificationOutcome;

/// Host-supplied configuration, re-applied every frame through [`KeyDialog::sync`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogProps {
    pub open: bool,
    pub prefill: String,
    pub dismissible: bool,
}

impl DialogProps {
    pub fn new(open: bool, prefill: impl Into<String>, dismissible: bool) -> Self {
        Self {
            open,
            prefill: prefill.into(),
            dismissible,
        }
    }
}

/// Ephemeral edit state, rebuilt each time the dialog opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogSession {
    pub input: String,
    /// Render the key as plaintext instead of masked.
    pub visible: bool,
    /// A remote check is outstanding.
    pub checking: bool,
    pub last_error: Option<String>,
}

impl DialogSession {
    fn seeded(prefill: &str) -> Self {
        Self {
            input: prefill.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Idle,
    Checking,
    Error,
}

/// Proof that a confirm attempt is waiting on a remote check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyTicket {
    pub generation: u64,
    /// Trimmed candidate key.
    pub key: String,
}

/// What a confirm request turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmStep {
    /// Dialog closed or a check already in flight; nothing happened.
    Ignored,
    /// Local checks failed; `last_error` now holds the message.
    Rejected(RejectReason),
    /// Remote checks are disabled and the key passed the local ones.
    Accepted(String),
    /// Run the probe for this ticket and report back.
    Verify(VerifyTicket),
}

#[derive(Debug, Clone)]
pub struct KeyDialog {
    rules: KeyRules,
    locale: Locale,
    remote_check: bool,
    open: bool,
    dismissible: bool,
    prefill: String,
    generation: u64,
    /// Generation of the request still on the wire, if any.
    in_flight: Option<u64>,
    session: DialogSession,
}

impl KeyDialog {
    pub fn new(rules: KeyRules, locale: Locale) -> Self {
        Self {
            rules,
            locale,
            remote_check: true,
            open: false,
            dismissible: true,
            prefill: String::new(),
            generation: 0,
            in_flight: None,
            session: DialogSession::default(),
        }
    }

    /// Skip the live probe and accept keys that pass the local checks.
    pub fn with_remote_check(mut self, enabled: bool) -> Self {
        self.remote_check = enabled;
        self
    }

    pub fn rules(&self) -> &KeyRules {
        &self.rules
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    pub fn session(&self) -> &DialogSession {
        &self.session
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_dismissible(&self) -> bool {
        self.dismissible
    }

    pub fn state(&self) -> DialogState {
        if !self.open {
            DialogState::Closed
        } else if self.session.checking {
            DialogState::Checking
        } else if self.session.last_error.is_some() {
            DialogState::Error
        } else {
            DialogState::Idle
        }
    }

    /// Apply the host's props.
    ///
    /// Opening, or changing the prefill while open, starts a fresh session.
    /// A prefill change keeps an outstanding request outstanding; its result is
    /// discarded but still ends the checking state. Closing retires any
    /// in-flight check.
    pub fn sync(&mut self, props: &DialogProps) {
        self.dismissible = props.dismissible;
        match (self.open, props.open) {
            (false, true) => {
                self.open = true;
                self.reset(&props.prefill);
            }
            (true, true) if props.prefill != self.prefill => self.reset(&props.prefill),
            (true, false) => {
                self.open = false;
                self.generation += 1;
                self.in_flight = None;
                self.session.checking = false;
            }
            _ => {}
        }
    }

    fn reset(&mut self, prefill: &str) {
        self.generation += 1;
        self.prefill = prefill.to_string();
        self.session = DialogSession::seeded(prefill);
        self.session.checking = self.in_flight.is_some();
    }

    /// Replace the input text. Ignored while a check is outstanding.
    pub fn edit_input(&mut self, text: impl Into<String>) {
        if !self.open || self.session.checking {
            return;
        }
        self.session.input = text.into();
        self.session.last_error = None;
    }

    pub fn toggle_visibility(&mut self) {
        self.session.visible = !self.session.visible;
    }

    /// Whether the confirm button should be enabled.
    pub fn can_confirm(&self) -> bool {
        self.open && !self.session.checking && !self.session.input.trim().is_empty()
    }

    /// Start a confirm attempt (button press or Enter).
    pub fn request_confirm(&mut self) -> ConfirmStep {
        if !self.open || self.session.checking {
            return ConfirmStep::Ignored;
        }

        self.session.last_error = None;
        let candidate = match self.rules.precheck(&self.session.input) {
            Ok(candidate) => candidate.to_string(),
            Err(reason) => {
                self.session.last_error =
                    Some(messages::reject_message(self.locale, reason, &self.rules));
                return ConfirmStep::Rejected(reason);
            }
        };

        if !self.remote_check {
            return ConfirmStep::Accepted(candidate);
        }

        self.session.checking = true;
        self.in_flight = Some(self.generation);
        ConfirmStep::Verify(VerifyTicket {
            generation: self.generation,
            key: candidate,
        })
    }

    /// Feed back the probe outcome for `ticket`.
    ///
    /// Returns `None` when the ticket is stale. A rejection leaves the dialog
    /// open with `last_error` set; acceptance is reported to the caller, who
    /// invokes the confirm and close callbacks.
    pub fn complete_verification(
        &mut self,
        ticket: VerifyTicket,
        outcome: &VerificationOutcome,
        policy: AmbiguityPolicy,
    ) -> Option<ValidationResult> {
        let was_in_flight = self.in_flight == Some(ticket.generation);
        if was_in_flight {
            self.in_flight = None;
        }

        if !self.open || !self.session.checking || ticket.generation != self.generation {
            if was_in_flight && self.open {
                self.session.checking = false;
            }
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Dropping stale API key verification result"
            );
            return None;
        }

        self.session.checking = false;
        let result = policy.resolve(ticket.key, outcome);
        if let ValidationResult::Rejected(reason) = result {
            self.session.last_error =
                Some(messages::reject_message(self.locale, reason, &self.rules));
        }
        Some(result)
    }

    /// Whether a dismiss request may close the dialog right now.
    pub fn request_dismiss(&self) -> bool {
        self.open && self.dismissible && !self.session.checking
    }
}
