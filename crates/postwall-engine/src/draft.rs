//! Composer draft buffer.

use parking_lot::Mutex;

/// The not-yet-submitted post text.
///
/// Replaced wholesale on every edit. Independent of the published UI state.
#[derive(Debug, Default)]
pub struct DraftBuffer {
    text: Mutex<String>,
}

impl DraftBuffer {
    /// Creates an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the draft.
    pub fn replace(&self, text: String) {
        *self.text.lock() = text;
    }

    /// Returns a copy of the draft.
    pub fn get(&self) -> String {
        self.text.lock().clone()
    }

    /// Returns the draft and leaves it empty, in one step.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.text.lock())
    }
}
