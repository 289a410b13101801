//! Terminal notification sink.

use authfetch_core::NotificationSink;

use crate::output;

/// Renders dispatcher notifications on stderr with coloured markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn show_error(&self, message: &str) {
        output::error(message);
    }

    fn show_success(&self, message: &str) {
        output::success(message);
    }

    fn show_warning(&self, message: &str) {
        output::warning(message);
    }
}
