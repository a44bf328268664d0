use std::collections::VecDeque;

const LOG_LIMIT: usize = 10_000;

/// Captured per-page console channel.
///
/// Lines are observable from tests in emission order; the buffer is bounded
/// and drops the oldest line once full. Every line is mirrored to `tracing`
/// at debug level.
#[derive(Debug, Clone)]
pub struct Console {
    messages: VecDeque<String>,
    limit: usize,
}

impl Default for Console {
    fn default() -> Self {
        Self {
            messages: VecDeque::new(),
            limit: LOG_LIMIT,
        }
    }
}

impl Console {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(target: "page_bootstrap::console", %message, "console line");
        if self.messages.len() >= self.limit {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn count_of(&self, message: &str) -> usize {
        self.messages
            .iter()
            .filter(|line| line.as_str() == message)
            .count()
    }

    pub fn take_messages(&mut self) -> Vec<String> {
        self.messages.drain(..).collect()
    }
}
