//! Modal alert presentation with foreground deferral.
//!
//! An alert requested while the application is backgrounded is not shown; it
//! is retained as the single pending request and presented on the next
//! foreground transition. A newer request supersedes an older unshown one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use casement_host::{Dialog, DialogButton, HostError, UiDispatcher};

pub const ACTION_BUTTON_CLICKED: &str = "buttonClicked";
pub const ACTION_DISMISSED: &str = "dismissed";
pub const BUTTON_POSITIVE: i64 = 0;
pub const BUTTON_NEGATIVE: i64 = 1;

/// Shell-boundary failure: reported immediately, never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PresentError {
    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Clone, Debug, Default)]
pub struct AlertConfig {
    pub title: Option<String>,
    pub message: String,
    pub button_positive: Option<String>,
    pub button_negative: Option<String>,
}

/// Invoked with the action kind and the button key the user picked.
pub type AlertCallback = Arc<dyn Fn(&str, i64) + Send + Sync>;

struct PendingAlert {
    config: AlertConfig,
    on_action: AlertCallback,
}

struct PresenterShared {
    foreground: AtomicBool,
    pending: Mutex<Option<PendingAlert>>,
}

pub struct DialogPresenter {
    ui: Arc<UiDispatcher>,
    shared: Arc<PresenterShared>,
}

impl DialogPresenter {
    /// Starts backgrounded; the shell reports the first foreground
    /// transition through [`DialogPresenter::on_resume`].
    pub fn new(ui: Arc<UiDispatcher>) -> DialogPresenter {
        DialogPresenter {
            ui,
            shared: Arc::new(PresenterShared {
                foreground: AtomicBool::new(false),
                pending: Mutex::new(None),
            }),
        }
    }

    pub fn show_alert(
        &self,
        config: AlertConfig,
        on_action: AlertCallback,
    ) -> Result<(), PresentError> {
        let shared = self.shared.clone();
        // The foreground decision happens on the UI thread, serialized with
        // the lifecycle transitions that flip it.
        self.ui.run(move |host| {
            if shared.foreground.load(Ordering::Acquire) {
                host.present_dialog(build_dialog(&config, on_action))?;
                Ok(())
            } else {
                let superseded = shared
                    .pending
                    .lock()
                    .replace(PendingAlert { config, on_action })
                    .is_some();
                if superseded {
                    log::debug!("pending alert superseded by a newer request");
                }
                Ok(())
            }
        })
    }

    pub fn on_suspend(&self) {
        self.shared.foreground.store(false, Ordering::Release);
    }

    /// Foreground transition: presents the pending alert, if any.
    pub fn on_resume(&self) {
        self.shared.foreground.store(true, Ordering::Release);
        let pending = self.shared.pending.lock().take();
        if let Some(PendingAlert { config, on_action }) = pending {
            self.ui.post(move |host| {
                if let Err(error) = host.present_dialog(build_dialog(&config, on_action)) {
                    log::error!("failed to present pending alert: {error}");
                }
            });
        }
    }
}

fn build_dialog(config: &AlertConfig, on_action: AlertCallback) -> Dialog {
    let mut buttons = Vec::new();
    if let Some(label) = &config.button_positive {
        buttons.push(DialogButton {
            label: label.clone(),
            key: BUTTON_POSITIVE,
        });
    }
    if let Some(label) = &config.button_negative {
        buttons.push(DialogButton {
            label: label.clone(),
            key: BUTTON_NEGATIVE,
        });
    }
    Dialog {
        title: config.title.clone(),
        message: config.message.clone(),
        buttons,
        on_command: Box::new(move |key| on_action(ACTION_BUTTON_CLICKED, key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    fn collecting_callback() -> (AlertCallback, Arc<PlMutex<Vec<(String, i64)>>>) {
        let seen: Arc<PlMutex<Vec<(String, i64)>>> = Arc::new(PlMutex::new(Vec::new()));
        let sink = seen.clone();
        (
            Arc::new(move |action: &str, key| sink.lock().push((action.to_string(), key))),
            seen,
        )
    }

    fn alert(message: &str) -> AlertConfig {
        AlertConfig {
            title: Some("Title".into()),
            message: message.into(),
            button_positive: Some("OK".into()),
            button_negative: Some("Cancel".into()),
        }
    }

    #[test]
    fn test_foreground_alert_presents_immediately() {
        let ui = UiDispatcher::spawn();
        let presenter = DialogPresenter::new(ui.clone());
        presenter.on_resume();
        let (callback, seen) = collecting_callback();
        presenter.show_alert(alert("hello"), callback).unwrap();

        let message = ui.run(|host| host.presented_dialog().map(|d| d.message.clone()));
        assert_eq!(message.as_deref(), Some("hello"));

        ui.run(|host| host.invoke_dialog_button(BUTTON_POSITIVE))
            .unwrap();
        assert_eq!(
            seen.lock().as_slice(),
            &[(ACTION_BUTTON_CLICKED.to_string(), BUTTON_POSITIVE)]
        );
    }

    #[test]
    fn test_backgrounded_alert_waits_and_newest_wins() {
        let ui = UiDispatcher::spawn();
        let presenter = DialogPresenter::new(ui.clone());
        let (callback, _seen) = collecting_callback();

        presenter.show_alert(alert("first"), callback.clone()).unwrap();
        presenter
            .show_alert(alert("second"), callback.clone())
            .unwrap();
        assert!(ui.run(|host| host.presented_dialog().is_none()));

        presenter.on_resume();
        let message = ui.run(|host| host.presented_dialog().map(|d| d.message.clone()));
        assert_eq!(message.as_deref(), Some("second"));

        // The pending slot drained: suspending and resuming again shows
        // nothing new.
        ui.run(|host| host.invoke_dialog_button(BUTTON_NEGATIVE))
            .unwrap();
        presenter.on_suspend();
        presenter.on_resume();
        assert!(ui.run(|host| host.presented_dialog().is_none()));
    }

    #[test]
    fn test_second_dialog_while_showing_is_an_error() {
        let ui = UiDispatcher::spawn();
        let presenter = DialogPresenter::new(ui.clone());
        presenter.on_resume();
        let (callback, _seen) = collecting_callback();
        presenter.show_alert(alert("one"), callback.clone()).unwrap();
        let err = presenter.show_alert(alert("two"), callback).unwrap_err();
        assert_eq!(err, PresentError::Host(HostError::DialogBusy));
    }
}
