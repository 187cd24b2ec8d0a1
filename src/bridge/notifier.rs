/// Generic user-visible notification used when the host has no native alert
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Default fallback: write the message to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::info!("🔔 {message}");
    }
}
