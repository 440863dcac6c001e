//! Size-capped notification batching.

use super::delta::DeltaEvent;

/// Default payload size cap, in characters. Matches the Discord embed
/// description limit.
pub const DEFAULT_SIZE_CAP: usize = 2000;

/// One size-bounded formatted message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    text: String,
}

impl Payload {
    /// The formatted message body.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters, the unit the size cap is measured in.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Accumulates rendered event lines and seals them into payloads that
/// never exceed the size cap.
///
/// Appending a line that would overflow the current chunk seals the
/// chunk first and starts a new one with that line. `flush` seals
/// whatever is pending and hands everything over; the batch is cleared
/// regardless of what the caller does with the payloads (at-least-once
/// delivery, not exactly-once).
#[derive(Debug)]
pub struct EventBatcher {
    cap: usize,
    sealed: Vec<Payload>,
    current: String,
    current_chars: usize,
}

impl EventBatcher {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            sealed: Vec::new(),
            current: String::new(),
            current_chars: 0,
        }
    }

    /// Append one event, rendered to a line.
    pub fn append(&mut self, event: &DeltaEvent) {
        self.append_line(&event.render_line());
    }

    /// Append one already-rendered line.
    pub fn append_line(&mut self, line: &str) {
        // A single line over the cap cannot fit in any payload; keep the
        // head so the notification still identifies the path prefix.
        let mut chars = line.chars().count();
        let line: String = if chars > self.cap {
            chars = self.cap;
            line.chars().take(self.cap).collect()
        } else {
            line.to_string()
        };

        if !self.current.is_empty() && self.current_chars + 1 + chars > self.cap {
            self.seal();
        }

        if self.current.is_empty() {
            self.current = line;
            self.current_chars = chars;
        } else {
            self.current.push('\n');
            self.current.push_str(&line);
            self.current_chars += 1 + chars;
        }
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sealed.is_empty() && self.current.is_empty()
    }

    /// Seal the pending chunk and take all payloads, clearing the batch.
    pub fn flush(&mut self) -> Vec<Payload> {
        self.seal();
        std::mem::take(&mut self.sealed)
    }

    fn seal(&mut self) {
        if !self.current.is_empty() {
            self.current_chars = 0;
            self.sealed.push(Payload {
                text: std::mem::take(&mut self.current),
            });
        }
    }
}

impl Default for EventBatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_CAP)
    }
}
