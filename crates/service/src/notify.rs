//! User-facing notices for failed cart operations.

use tracing::warn;

/// Displays a message to the user. The cart store calls it once per failed
/// operation with the message chosen from the error kind.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Emits notices as structured log events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        warn!(event = "cart_notice", %message, "cart operation failed");
    }
}

pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Collects every notice for later assertions.
    #[derive(Default)]
    pub struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }

        pub fn last(&self) -> Option<String> {
            self.messages.lock().unwrap().last().cloned()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }
}
