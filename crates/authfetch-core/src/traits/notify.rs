//! Notification sink trait.

/// Where user-facing messages go.
///
/// The dispatcher calls `show_error` at most once per failed request chain.
/// UI layers plug in their own toast/snackbar implementation; the default
/// [`TracingSink`](crate::TracingSink) only logs.
pub trait NotificationSink: Send + Sync {
    fn show_error(&self, message: &str);

    fn show_success(&self, message: &str);

    fn show_warning(&self, message: &str);
}
