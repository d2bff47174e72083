//! Async runtime bridge for running key probes behind the egui frame loop

use std::sync::{Arc, Mutex};

use keygate_core::{AmbiguousCause, GeminiVerifier, VerificationOutcome, VerifyTicket};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::warn;

/// A finished probe, waiting to be handed back to the dialog controller.
#[derive(Clone, Debug)]
pub struct CompletedCheck {
    pub ticket: VerifyTicket,
    pub outcome: VerificationOutcome,
}

/// Bridge between the tokio runtime and egui
pub struct AsyncBridge {
    /// Wrapped in Option for clean shutdown
    runtime: Option<Runtime>,

    results_tx: mpsc::UnboundedSender<CompletedCheck>,
    results_rx: Arc<Mutex<mpsc::UnboundedReceiver<CompletedCheck>>>,
}

impl AsyncBridge {
    pub fn new() -> std::io::Result<Self> {
        let runtime = Runtime::new()?;
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        Ok(Self {
            runtime: Some(runtime),
            results_tx,
            results_rx: Arc::new(Mutex::new(results_rx)),
        })
    }

    /// Run the probe for `ticket` in the background.
    ///
    /// `repaint` is poked when the result lands so an idle UI wakes up.
    pub fn spawn_verification(
        &self,
        verifier: GeminiVerifier,
        ticket: VerifyTicket,
        repaint: Option<egui::Context>,
    ) {
        let tx = self.results_tx.clone();
        let Some(runtime) = self.runtime.as_ref() else {
            warn!("Async runtime already shut down; reporting probe as ambiguous");
            let _ = tx.send(CompletedCheck {
                ticket,
                outcome: VerificationOutcome::Ambiguous(AmbiguousCause::Transport(
                    "async runtime unavailable".to_string(),
                )),
            });
            return;
        };

        runtime.spawn(async move {
            let outcome = verifier.verify(&ticket.key).await;
            // The receiver only goes away with the bridge itself.
            let _ = tx.send(CompletedCheck { ticket, outcome });
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
    }

    /// Drain every finished probe.
    pub fn take_completed(&self) -> Vec<CompletedCheck> {
        let mut completed = Vec::new();
        if let Ok(mut rx) = self.results_rx.lock() {
            while let Ok(check) = rx.try_recv() {
                completed.push(check);
            }
        }
        completed
    }
}

impl Drop for AsyncBridge {
    fn drop(&mut self) {
        // Dropping a runtime from inside another runtime's context panics.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
