//! Default notification sink.

use tracing::{error, info, warn};

use crate::traits::NotificationSink;

/// Sends notifications to the diagnostic log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn show_error(&self, message: &str) {
        error!(target: "authfetch::notify", "{}", message);
    }

    fn show_success(&self, message: &str) {
        info!(target: "authfetch::notify", "{}", message);
    }

    fn show_warning(&self, message: &str) {
        warn!(target: "authfetch::notify", "{}", message);
    }
}
